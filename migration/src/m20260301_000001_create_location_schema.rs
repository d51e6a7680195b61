use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() == sea_orm::DatabaseBackend::Postgres {
            manager
                .get_connection()
                .execute_unprepared("CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\";")
                .await?;
        }

        // Buildings and assigned technicians live inside the location row
        manager
            .create_table(
                Table::create()
                    .table(Locations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Locations::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Locations::Name).string().not_null())
                    .col(ColumnDef::new(Locations::Address).string().not_null())
                    .col(ColumnDef::new(Locations::Latitude).double().not_null())
                    .col(ColumnDef::new(Locations::Longitude).double().not_null())
                    .col(ColumnDef::new(Locations::Description).text())
                    .col(ColumnDef::new(Locations::Buildings).json_binary().not_null())
                    .col(
                        ColumnDef::new(Locations::AssignedTechnicians)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Locations::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Locations::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(Locations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Locations::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // No foreign key to locations: archived rows outlive the location
        manager
            .create_table(
                Table::create()
                    .table(PreviousLocationAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PreviousLocationAssignments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PreviousLocationAssignments::TechnicianId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PreviousLocationAssignments::LocationId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PreviousLocationAssignments::LocationSnapshot)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PreviousLocationAssignments::AssignedDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PreviousLocationAssignments::ClosedDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PreviousLocationAssignments::WorkDuration)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PreviousLocationAssignments::TotalWorkOrders)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PreviousLocationAssignments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_locations_created_by")
                    .table(Locations::Table)
                    .col(Locations::CreatedBy)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_previous_location_assignments_technician_id")
                    .table(PreviousLocationAssignments::Table)
                    .col(PreviousLocationAssignments::TechnicianId)
                    .col(PreviousLocationAssignments::ClosedDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(PreviousLocationAssignments::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Locations::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Locations {
    Table,
    Id,
    Name,
    Address,
    Latitude,
    Longitude,
    Description,
    Buildings,
    AssignedTechnicians,
    IsActive,
    CreatedBy,
    CreatedAt,
    LastUpdated,
}

#[derive(DeriveIden)]
enum PreviousLocationAssignments {
    Table,
    Id,
    TechnicianId,
    LocationId,
    LocationSnapshot,
    AssignedDate,
    ClosedDate,
    WorkDuration,
    TotalWorkOrders,
    CreatedAt,
}
