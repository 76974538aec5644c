//! Service layer for the product catalogue.
//! - Separates business rules from data access.
//! - Reuses entity definitions from the `models` crate.
//! - Exposes a closed error taxonomy the HTTP layer maps to status codes.

pub mod product;
#[cfg(test)]
pub mod test_support;
