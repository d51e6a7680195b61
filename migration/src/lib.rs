pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_location_schema;
mod m20260301_000002_create_inventory_schema;

/// Schema owned by the location service.
pub struct LocationMigrator;

#[async_trait::async_trait]
impl MigratorTrait for LocationMigrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260301_000001_create_location_schema::Migration)]
    }
}

/// Schema owned by the inventory service.
pub struct InventoryMigrator;

#[async_trait::async_trait]
impl MigratorTrait for InventoryMigrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260301_000002_create_inventory_schema::Migration)]
    }
}
