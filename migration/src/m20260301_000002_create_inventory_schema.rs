use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    #[allow(clippy::too_many_lines)] // One column per assessment field
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Counters::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Counters::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Counters::Seq)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        let flag = |column: Orders| {
            ColumnDef::new(column)
                .boolean()
                .not_null()
                .default(false)
                .to_owned()
        };

        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Orders::UniqueId).string().not_null())
                    .col(ColumnDef::new(Orders::UserId).string().not_null())
                    .col(ColumnDef::new(Orders::LocationId).uuid())
                    .col(
                        ColumnDef::new(Orders::DateOfSurvey)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Orders::Surveyors).text())
                    .col(
                        ColumnDef::new(Orders::ConfinedSpaceNameOrId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Orders::Building).string().not_null())
                    .col(ColumnDef::new(Orders::LocationDescription).text())
                    .col(ColumnDef::new(Orders::ConfinedSpaceDescription).text())
                    .col(ColumnDef::new(Orders::NumberOfEntryPoints).integer())
                    .col(flag(Orders::ConfinedSpace))
                    .col(flag(Orders::PermitRequired))
                    .col(ColumnDef::new(Orders::EntryRequirements).text())
                    .col(flag(Orders::AtmosphericHazard))
                    .col(ColumnDef::new(Orders::AtmosphericHazardDescription).text())
                    .col(flag(Orders::EngulfmentHazard))
                    .col(ColumnDef::new(Orders::EngulfmentHazardDescription).text())
                    .col(flag(Orders::ConfigurationHazard))
                    .col(ColumnDef::new(Orders::ConfigurationHazardDescription).text())
                    .col(flag(Orders::OtherRecognizedHazards))
                    .col(ColumnDef::new(Orders::OtherHazardsDescription).text())
                    .col(flag(Orders::PpeRequired))
                    .col(ColumnDef::new(Orders::PpeList).text())
                    .col(flag(Orders::ForcedAirVentilationSufficient))
                    .col(flag(Orders::DedicatedContinuousAirMonitor))
                    .col(flag(Orders::WarningSignPosted))
                    .col(flag(Orders::OtherPeopleWorkingNearSpace))
                    .col(flag(Orders::CanOthersSeeIntoSpace))
                    .col(flag(Orders::ContractorsEnterSpace))
                    .col(flag(Orders::IsEntryPointAccessible))
                    .col(flag(Orders::RequiresSignageUpdate))
                    .col(ColumnDef::new(Orders::Notes).text())
                    .col(ColumnDef::new(Orders::Pictures).json_binary().not_null())
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Orders::LastUpdated)
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
                    .name("idx_orders_unique_id")
                    .table(Orders::Table)
                    .col(Orders::UniqueId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_user_id")
                    .table(Orders::Table)
                    .col(Orders::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_location_id")
                    .table(Orders::Table)
                    .col(Orders::LocationId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Orders::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Counters::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Counters {
    Table,
    Id,
    Seq,
}

#[derive(DeriveIden, Clone, Copy)]
enum Orders {
    Table,
    Id,
    UniqueId,
    UserId,
    LocationId,
    DateOfSurvey,
    Surveyors,
    ConfinedSpaceNameOrId,
    Building,
    LocationDescription,
    ConfinedSpaceDescription,
    NumberOfEntryPoints,
    ConfinedSpace,
    PermitRequired,
    EntryRequirements,
    AtmosphericHazard,
    AtmosphericHazardDescription,
    EngulfmentHazard,
    EngulfmentHazardDescription,
    ConfigurationHazard,
    ConfigurationHazardDescription,
    OtherRecognizedHazards,
    OtherHazardsDescription,
    PpeRequired,
    PpeList,
    ForcedAirVentilationSufficient,
    DedicatedContinuousAirMonitor,
    WarningSignPosted,
    OtherPeopleWorkingNearSpace,
    CanOthersSeeIntoSpace,
    ContractorsEnterSpace,
    IsEntryPointAccessible,
    RequiresSignageUpdate,
    Notes,
    Pictures,
    CreatedAt,
    LastUpdated,
}
