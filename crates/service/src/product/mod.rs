//! Product module: three-layer architecture (domain, repository, service).
//!
//! Validation, identifier assignment and timestamps live in the service;
//! repositories only translate storage outcomes into [`errors::ProductError`].

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use errors::{ErrorKind, ProductError};
pub use repository::ProductRepository;
pub use service::ProductService;
