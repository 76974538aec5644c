//! Databases created before `name` became `text` still carry `varchar(255)`.
use sea_orm_migration::prelude::*;

use crate::m20240601_000001_create_products::Products;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Products::Table)
                    .modify_column(ColumnDef::new(Products::Name).text().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // narrowing back could truncate stored names
        Ok(())
    }
}
