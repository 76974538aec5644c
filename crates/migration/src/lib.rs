//! Migrator for the products schema.
//! Indexes are applied after the table they cover.
pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_products;
mod m20240601_000002_add_product_indexes;
mod m20240601_000003_widen_product_name;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_products::Migration),
            Box::new(m20240601_000002_add_product_indexes::Migration),
            Box::new(m20240601_000003_widen_product_name::Migration),
        ]
    }
}
