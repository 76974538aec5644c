use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QueryTrait, Set,
};
use tracing::debug;
use uuid::Uuid;

use models::product::{self, Column};

use crate::product::domain::{Product, ProductChanges};
use crate::product::errors::{ErrorKind, ProductError};
use crate::product::repository::ProductRepository;

/// SeaORM-backed repository implementation.
///
/// Every statement is built by SeaQuery and sent with bound parameters.
pub struct SeaOrmProductRepository {
    db: DatabaseConnection,
}

impl SeaOrmProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepository for SeaOrmProductRepository {
    async fn create(&self, p: &Product) -> Result<(), ProductError> {
        let am = product::ActiveModel {
            id: Set(p.id),
            name: Set(p.name.clone()),
            description: Set(p.description.clone()),
            price: Set(p.price),
            stock: Set(p.stock),
            created_at: Set(p.created_at.into()),
            updated_at: Set(p.updated_at.into()),
        };
        product::Entity::insert(am)
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| ProductError::wrap(ErrorKind::FailedCreating, e))?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Product, ProductError> {
        product::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Product::from)
            .ok_or_else(|| ErrorKind::ProductNotFound.into())
    }

    async fn list(&self) -> Result<Vec<Product>, ProductError> {
        let stmt = product::Entity::find()
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .build(self.db.get_database_backend());
        let rows = self
            .db
            .query_all(stmt)
            .await
            .map_err(|e| ProductError::wrap(ErrorKind::NotFoundProducts, e))?;
        debug!(rows = rows.len(), "listed products");

        rows.iter()
            .map(|row| {
                product::Model::from_query_result(row, "")
                    .map(Product::from)
                    .map_err(|e| ProductError::wrap(ErrorKind::ScanFailure, e))
            })
            .collect()
    }

    async fn reduce_stock(&self, id: Uuid, quantity: i32, updated_at: DateTime<Utc>) -> Result<(), ProductError> {
        // UPDATE products SET stock = stock - $1, updated_at = $2 WHERE id = $3 AND stock >= $4
        let res = product::Entity::update_many()
            .col_expr(Column::Stock, Expr::col(Column::Stock).sub(quantity))
            .col_expr(Column::UpdatedAt, Expr::value(DateTimeWithTimeZone::from(updated_at)))
            .filter(Column::Id.eq(id))
            .filter(Column::Stock.gte(quantity))
            .exec(&self.db)
            .await
            .map_err(|e| ProductError::wrap(ErrorKind::FailedReducingStock, e))?;
        if res.rows_affected > 0 {
            return Ok(());
        }

        // Nothing changed: either the row is gone or it holds less than `quantity`.
        let current = product::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ProductError::wrap(ErrorKind::FailedReducingStock, e))?;
        match current {
            Some(_) => Err(ErrorKind::InvalidQuantity.into()),
            None => Err(ErrorKind::ProductNotFound.into()),
        }
    }

    async fn update(&self, changes: &ProductChanges) -> Result<(), ProductError> {
        let res = product::Entity::update_many()
            .col_expr(Column::Name, Expr::value(changes.name.clone()))
            .col_expr(Column::Description, Expr::value(changes.description.clone()))
            .col_expr(Column::Price, Expr::value(changes.price))
            .col_expr(Column::Stock, Expr::value(changes.stock))
            .col_expr(Column::UpdatedAt, Expr::value(DateTimeWithTimeZone::from(changes.updated_at)))
            .filter(Column::Id.eq(changes.id))
            .exec(&self.db)
            .await
            .map_err(|e| ProductError::wrap(ErrorKind::FailedUpdating, e))?;
        if res.rows_affected == 0 {
            return Err(ErrorKind::ProductNotFound.into());
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), ProductError> {
        let res = product::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| ProductError::wrap(ErrorKind::FailedDeleting, e))?;
        debug!(%id, rows = res.rows_affected, "delete executed");
        Ok(())
    }
}
