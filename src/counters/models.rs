use sea_orm::entity::prelude::*;

/// Name of the sequence that numbers work orders.
pub const ORDER_SEQUENCE: &str = "orderId";

/// One row per named sequence; `seq` is the last value handed out.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "counters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub seq: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
