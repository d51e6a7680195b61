use super::models::{Column, Entity, ORDER_SEQUENCE};
use sea_orm::sea_query::{Expr, OnConflict, Query};
use sea_orm::{ConnectionTrait, DbErr};

/// Atomically increment `sequence` and return the new value.
///
/// The increment and the read are one `INSERT .. ON CONFLICT DO UPDATE ..
/// RETURNING` statement, so concurrent callers can never observe the same
/// value. The row is created at 1 the first time a sequence is used.
/// Values handed out are never given back, even if the caller later fails.
pub async fn next_value<C: ConnectionTrait>(db: &C, sequence: &str) -> Result<i64, DbErr> {
    let mut insert = Query::insert();
    insert
        .into_table(Entity)
        .columns([Column::Id, Column::Seq])
        .values([sequence.into(), 1i64.into()])
        .map_err(|err| DbErr::Custom(err.to_string()))?;
    insert
        .on_conflict(
            OnConflict::column(Column::Id)
                .value(Column::Seq, Expr::col((Entity, Column::Seq)).add(1))
                .to_owned(),
        )
        .returning_col(Column::Seq);

    let statement = db.get_database_backend().build(&insert);
    let row = db
        .query_one(statement)
        .await?
        .ok_or(DbErr::RecordNotInserted)?;

    row.try_get::<i64>("", "seq")
}

/// Render a sequence value as a work order id: zero-padded to four digits,
/// longer once the sequence passes 9999.
pub fn format_unique_id(seq: i64) -> String {
    format!("{seq:04}")
}

/// Allocate the `uniqueId` for the next work order.
pub async fn allocate_next_id<C: ConnectionTrait>(db: &C) -> Result<String, DbErr> {
    let seq = next_value(db, ORDER_SEQUENCE).await?;
    tracing::debug!("Allocated work order sequence {seq}");
    Ok(format_unique_id(seq))
}
