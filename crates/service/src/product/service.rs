use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use super::domain::{CreateProductInput, Product, ProductChanges, UpdateProductInput};
use super::errors::{ErrorKind, ProductError};
use super::repository::ProductRepository;

/// Product business service independent of web framework.
///
/// Owns validation, identifier generation and timestamps; the repository only
/// persists what it is handed.
pub struct ProductService<R: ProductRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: ProductRepository + ?Sized> ProductService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    /// Validate and persist a new product.
    ///
    /// # Examples
    /// ```
    /// use service::product::{ProductService, domain::CreateProductInput, repository::mock::MockProductRepository};
    /// use std::sync::Arc;
    /// let svc = ProductService::new(Arc::new(MockProductRepository::default()));
    /// let input = CreateProductInput { name: "Widget".into(), description: "A widget".into(), price: 9.99, stock: 5 };
    /// let product = tokio_test::block_on(svc.create(input)).unwrap();
    /// assert_eq!(product.created_at, product.updated_at);
    /// ```
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CreateProductInput) -> Result<Product, ProductError> {
        validate_fields(&input.name, &input.description, input.price, input.stock)?;

        let now = now();
        let product = Product {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            price: input.price,
            stock: input.stock,
            created_at: now,
            updated_at: now,
        };
        self.repo.create(&product).await?;
        info!(product_id = %product.id, "product_created");
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Product, ProductError> {
        ensure_id(id)?;
        self.repo.get_by_id(id).await
    }

    pub async fn list(&self) -> Result<Vec<Product>, ProductError> {
        self.repo.list().await
    }

    /// Take `quantity` units out of stock.
    ///
    /// # Examples
    /// ```
    /// use service::product::{ProductService, domain::CreateProductInput, repository::mock::MockProductRepository, errors::ErrorKind};
    /// use std::sync::Arc;
    /// let svc = ProductService::new(Arc::new(MockProductRepository::default()));
    /// let p = tokio_test::block_on(svc.create(CreateProductInput { name: "Widget".into(), description: "A widget".into(), price: 9.99, stock: 5 })).unwrap();
    /// tokio_test::block_on(svc.reduce_stock(p.id, 2)).unwrap();
    /// let err = tokio_test::block_on(svc.reduce_stock(p.id, 0)).unwrap_err();
    /// assert!(err.is(ErrorKind::InvalidQuantity));
    /// ```
    #[instrument(skip(self))]
    pub async fn reduce_stock(&self, id: Uuid, quantity: i32) -> Result<(), ProductError> {
        ensure_id(id)?;
        if quantity <= 0 {
            return Err(ErrorKind::InvalidQuantity.into());
        }
        self.repo.reduce_stock(id, quantity, now()).await?;
        info!(product_id = %id, quantity, "stock_reduced");
        Ok(())
    }

    #[instrument(skip(self, input), fields(product_id = %input.id))]
    pub async fn update(&self, input: UpdateProductInput) -> Result<(), ProductError> {
        ensure_id(input.id)?;
        validate_fields(&input.name, &input.description, input.price, input.stock)?;

        let changes = ProductChanges {
            id: input.id,
            name: input.name,
            description: input.description,
            price: input.price,
            stock: input.stock,
            updated_at: now(),
        };
        self.repo.update(&changes).await?;
        info!(product_id = %changes.id, "product_updated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ProductError> {
        ensure_id(id)?;
        self.repo.delete(id).await?;
        info!(product_id = %id, "product_deleted");
        Ok(())
    }
}

// Postgres keeps microseconds; truncating keeps stored and returned values equal.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn ensure_id(id: Uuid) -> Result<(), ProductError> {
    if id.is_nil() {
        return Err(ErrorKind::InvalidId.into());
    }
    Ok(())
}

fn validate_fields(name: &str, description: &str, price: f64, stock: i32) -> Result<(), ProductError> {
    if name.is_empty() || description.is_empty() {
        return Err(ErrorKind::ParametersMissing.into());
    }
    // NaN fails this comparison too
    if !(price > 0.0) || !price.is_finite() {
        return Err(ErrorKind::InvalidPrice.into());
    }
    if stock < 0 {
        return Err(ErrorKind::InvalidStock.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::repository::mock::MockProductRepository;

    fn setup() -> (Arc<MockProductRepository>, ProductService<MockProductRepository>) {
        let repo = Arc::new(MockProductRepository::default());
        (repo.clone(), ProductService::new(repo))
    }

    fn input(name: &str, description: &str, price: f64, stock: i32) -> CreateProductInput {
        CreateProductInput { name: name.into(), description: description.into(), price, stock }
    }

    fn widget() -> CreateProductInput {
        input("Widget", "A widget", 9.99, 5)
    }

    async fn kind_of<T: std::fmt::Debug>(fut: impl std::future::Future<Output = Result<T, ProductError>>) -> ErrorKind {
        fut.await.unwrap_err().kind().expect("domain error kind")
    }

    #[tokio::test]
    async fn create_stamps_id_and_timestamps() {
        let (repo, svc) = setup();
        let a = svc.create(widget()).await.unwrap();
        let b = svc.create(widget()).await.unwrap();

        assert!(!a.id.is_nil());
        assert_ne!(a.id, b.id);
        assert_eq!(a.created_at, a.updated_at);
        assert_eq!(repo.snapshot(a.id), Some(a));
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn create_rejects_missing_parameters() {
        let (repo, svc) = setup();
        assert_eq!(kind_of(svc.create(input("", "A widget", 9.99, 5))).await, ErrorKind::ParametersMissing);
        assert_eq!(kind_of(svc.create(input("Widget", "", 9.99, 5))).await, ErrorKind::ParametersMissing);
        assert_eq!(repo.writes(), 0);
    }

    #[tokio::test]
    async fn whitespace_is_a_value() {
        let (repo, svc) = setup();
        let p = svc.create(input(" ", " ", 9.99, 5)).await.unwrap();
        assert_eq!(p.name, " ");
        assert_eq!(repo.snapshot(p.id).unwrap().description, " ");
    }

    #[tokio::test]
    async fn create_rejects_bad_price_and_stock() {
        let (repo, svc) = setup();
        for price in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert_eq!(kind_of(svc.create(input("Widget", "A widget", price, 5))).await, ErrorKind::InvalidPrice);
        }
        assert_eq!(kind_of(svc.create(input("Widget", "A widget", 9.99, -1))).await, ErrorKind::InvalidStock);
        assert!(repo.is_empty());
        assert_eq!(repo.writes(), 0);
    }

    #[tokio::test]
    async fn zero_stock_is_allowed() {
        let (_, svc) = setup();
        let p = svc.create(input("Widget", "A widget", 0.01, 0)).await.unwrap();
        assert_eq!(p.stock, 0);
    }

    #[tokio::test]
    async fn store_failure_on_create_is_failed_creating() {
        let repo = Arc::new(MockProductRepository::unavailable());
        let svc = ProductService::new(repo);
        assert_eq!(kind_of(svc.create(widget())).await, ErrorKind::FailedCreating);
    }

    #[tokio::test]
    async fn get_by_id_checks_nil_and_missing() {
        let (_, svc) = setup();
        assert_eq!(kind_of(svc.get_by_id(Uuid::nil())).await, ErrorKind::InvalidId);
        assert_eq!(kind_of(svc.get_by_id(Uuid::new_v4())).await, ErrorKind::ProductNotFound);

        let p = svc.create(widget()).await.unwrap();
        assert_eq!(svc.get_by_id(p.id).await.unwrap().name, "Widget");
    }

    #[tokio::test]
    async fn list_empty_is_ok() {
        let (_, svc) = setup();
        assert!(svc.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_ordered_by_creation() {
        let (_, svc) = setup();
        let first = svc.create(input("First", "1", 1.0, 1)).await.unwrap();
        let second = svc.create(input("Second", "2", 2.0, 2)).await.unwrap();
        let ids: Vec<Uuid> = svc.list().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), 2);
        if first.created_at < second.created_at {
            assert_eq!(ids, vec![first.id, second.id]);
        }
    }

    #[tokio::test]
    async fn list_failure_is_not_conflated_with_not_found() {
        let repo = Arc::new(MockProductRepository::unavailable());
        let svc = ProductService::new(repo);
        let err = svc.list().await.unwrap_err();
        assert!(err.is(ErrorKind::NotFoundProducts));
        assert!(!err.is(ErrorKind::ProductNotFound));
    }

    #[tokio::test]
    async fn reduce_stock_validates_before_store() {
        let (repo, svc) = setup();
        let p = svc.create(widget()).await.unwrap();
        let writes = repo.writes();

        assert_eq!(kind_of(svc.reduce_stock(p.id, 0)).await, ErrorKind::InvalidQuantity);
        assert_eq!(kind_of(svc.reduce_stock(p.id, -3)).await, ErrorKind::InvalidQuantity);
        assert_eq!(kind_of(svc.reduce_stock(Uuid::nil(), 1)).await, ErrorKind::InvalidId);
        assert_eq!(repo.writes(), writes);
        assert_eq!(repo.snapshot(p.id).unwrap().stock, 5);
    }

    #[tokio::test]
    async fn reduce_stock_decrements_and_refreshes_updated_at() {
        let (repo, svc) = setup();
        let p = svc.create(widget()).await.unwrap();

        svc.reduce_stock(p.id, 2).await.unwrap();
        let after = repo.snapshot(p.id).unwrap();
        assert_eq!(after.stock, 3);
        assert!(after.updated_at >= p.updated_at);
        assert_eq!(after.created_at, p.created_at);
    }

    #[tokio::test]
    async fn reduce_stock_never_goes_negative() {
        let (repo, svc) = setup();
        let p = svc.create(widget()).await.unwrap();

        assert_eq!(kind_of(svc.reduce_stock(p.id, 6)).await, ErrorKind::InvalidQuantity);
        assert_eq!(repo.snapshot(p.id).unwrap().stock, 5);

        svc.reduce_stock(p.id, 5).await.unwrap();
        assert_eq!(repo.snapshot(p.id).unwrap().stock, 0);
    }

    #[tokio::test]
    async fn reduce_stock_on_missing_product() {
        let (_, svc) = setup();
        assert_eq!(kind_of(svc.reduce_stock(Uuid::new_v4(), 1)).await, ErrorKind::ProductNotFound);
    }

    #[tokio::test]
    async fn update_replaces_fields_and_refreshes_updated_at() {
        let (repo, svc) = setup();
        let p = svc.create(widget()).await.unwrap();

        svc.update(UpdateProductInput {
            id: p.id,
            name: "Gadget".into(),
            description: "A gadget".into(),
            price: 19.5,
            stock: 7,
        })
        .await
        .unwrap();

        let after = repo.snapshot(p.id).unwrap();
        assert_eq!(after.name, "Gadget");
        assert_eq!(after.description, "A gadget");
        assert_eq!(after.price, 19.5);
        assert_eq!(after.stock, 7);
        assert!(after.updated_at >= p.updated_at);
        assert!(after.updated_at >= after.created_at);
    }

    #[tokio::test]
    async fn update_applies_create_rules() {
        let (repo, svc) = setup();
        let p = svc.create(widget()).await.unwrap();
        let writes = repo.writes();
        let upd = |name: &str, price: f64, stock: i32| UpdateProductInput {
            id: p.id,
            name: name.into(),
            description: "A widget".into(),
            price,
            stock,
        };

        assert_eq!(kind_of(svc.update(upd("", 9.99, 5))).await, ErrorKind::ParametersMissing);
        assert_eq!(kind_of(svc.update(upd("Widget", 0.0, 5))).await, ErrorKind::InvalidPrice);
        assert_eq!(kind_of(svc.update(upd("Widget", 9.99, -1))).await, ErrorKind::InvalidStock);
        assert_eq!(
            kind_of(svc.update(UpdateProductInput { id: Uuid::nil(), ..upd("Widget", 9.99, 5) })).await,
            ErrorKind::InvalidId
        );
        assert_eq!(repo.writes(), writes);
        assert_eq!(repo.snapshot(p.id).unwrap(), p);
    }

    #[tokio::test]
    async fn update_missing_product_is_not_found() {
        let (_, svc) = setup();
        let err = svc
            .update(UpdateProductInput {
                id: Uuid::new_v4(),
                name: "Widget".into(),
                description: "A widget".into(),
                price: 1.0,
                stock: 1,
            })
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::ProductNotFound));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_, svc) = setup();
        let p = svc.create(widget()).await.unwrap();

        svc.delete(p.id).await.unwrap();
        svc.delete(p.id).await.unwrap();
        assert_eq!(kind_of(svc.get_by_id(p.id)).await, ErrorKind::ProductNotFound);
        assert_eq!(kind_of(svc.delete(Uuid::nil())).await, ErrorKind::InvalidId);
    }

    #[tokio::test]
    async fn delete_store_failure_is_failed_deleting() {
        let (repo, svc) = setup();
        let p = svc.create(widget()).await.unwrap();
        repo.set_unavailable(true);
        assert_eq!(kind_of(svc.delete(p.id)).await, ErrorKind::FailedDeleting);
    }

    #[tokio::test]
    async fn works_behind_a_trait_object() {
        let repo: Arc<dyn ProductRepository> = Arc::new(MockProductRepository::default());
        let svc = ProductService::new(repo);
        let p = svc.create(widget()).await.unwrap();
        assert_eq!(svc.get_by_id(p.id).await.unwrap().id, p.id);
    }
}
