use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::domain::{Product, ProductChanges};
use super::errors::ProductError;

/// Persistence abstraction for products.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert every field of `product`.
    async fn create(&self, product: &Product) -> Result<(), ProductError>;
    /// `ProductNotFound` when no row matches.
    async fn get_by_id(&self, id: Uuid) -> Result<Product, ProductError>;
    /// Empty when the table is empty.
    async fn list(&self) -> Result<Vec<Product>, ProductError>;
    /// Atomically decrement stock and stamp `updated_at`.
    async fn reduce_stock(&self, id: Uuid, quantity: i32, updated_at: DateTime<Utc>) -> Result<(), ProductError>;
    async fn update(&self, changes: &ProductChanges) -> Result<(), ProductError>;
    /// Removing an absent id succeeds.
    async fn delete(&self, id: Uuid) -> Result<(), ProductError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Mutex, MutexGuard, PoisonError};

    use sea_orm::DbErr;

    use crate::product::errors::ErrorKind;

    #[derive(Default)]
    pub struct MockProductRepository {
        products: Mutex<HashMap<Uuid, Product>>, // key: product id
        unavailable: AtomicBool,
        writes: AtomicUsize,
    }

    impl MockProductRepository {
        /// A repository whose every call fails as if the store were down.
        pub fn unavailable() -> Self {
            let repo = Self::default();
            repo.set_unavailable(true);
            repo
        }

        pub fn set_unavailable(&self, down: bool) {
            self.unavailable.store(down, Ordering::SeqCst);
        }

        /// Mutating calls that reached the store, successful or not.
        pub fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        pub fn snapshot(&self, id: Uuid) -> Option<Product> {
            self.products().get(&id).cloned()
        }

        pub fn len(&self) -> usize {
            self.products().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn products(&self) -> MutexGuard<'_, HashMap<Uuid, Product>> {
            self.products.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn check_up(&self) -> Result<(), DbErr> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(DbErr::Custom("connection refused".into()));
            }
            Ok(())
        }

        fn write(&self, kind: ErrorKind) -> Result<MutexGuard<'_, HashMap<Uuid, Product>>, ProductError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.check_up().map_err(|e| ProductError::wrap(kind, e))?;
            Ok(self.products())
        }
    }

    #[async_trait]
    impl ProductRepository for MockProductRepository {
        async fn create(&self, product: &Product) -> Result<(), ProductError> {
            let mut products = self.write(ErrorKind::FailedCreating)?;
            if products.contains_key(&product.id) {
                let dup = DbErr::Custom(format!("duplicate key value violates unique constraint: {}", product.id));
                return Err(ProductError::wrap(ErrorKind::FailedCreating, dup));
            }
            products.insert(product.id, product.clone());
            Ok(())
        }

        async fn get_by_id(&self, id: Uuid) -> Result<Product, ProductError> {
            self.check_up()?;
            self.products()
                .get(&id)
                .cloned()
                .ok_or_else(|| ErrorKind::ProductNotFound.into())
        }

        async fn list(&self) -> Result<Vec<Product>, ProductError> {
            self.check_up().map_err(|e| ProductError::wrap(ErrorKind::NotFoundProducts, e))?;
            let mut all: Vec<Product> = self.products().values().cloned().collect();
            all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(all)
        }

        async fn reduce_stock(&self, id: Uuid, quantity: i32, updated_at: DateTime<Utc>) -> Result<(), ProductError> {
            let mut products = self.write(ErrorKind::FailedReducingStock)?;
            let product = products.get_mut(&id).ok_or(ErrorKind::ProductNotFound)?;
            if product.stock < quantity {
                return Err(ErrorKind::InvalidQuantity.into());
            }
            product.stock -= quantity;
            product.updated_at = updated_at;
            Ok(())
        }

        async fn update(&self, changes: &ProductChanges) -> Result<(), ProductError> {
            let mut products = self.write(ErrorKind::FailedUpdating)?;
            let product = products.get_mut(&changes.id).ok_or(ErrorKind::ProductNotFound)?;
            product.name = changes.name.clone();
            product.description = changes.description.clone();
            product.price = changes.price;
            product.stock = changes.stock;
            product.updated_at = changes.updated_at;
            Ok(())
        }

        async fn delete(&self, id: Uuid) -> Result<(), ProductError> {
            let mut products = self.write(ErrorKind::FailedDeleting)?;
            products.remove(&id);
            Ok(())
        }
    }
}
