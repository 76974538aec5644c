use sea_orm::DbErr;
use thiserror::Error;

/// Closed set of product failure kinds.
///
/// Callers branch on the kind, never on the rendered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ErrorKind {
    #[error("invalid ID")]
    InvalidId,
    #[error("parameters missing")]
    ParametersMissing,
    #[error("invalid price")]
    InvalidPrice,
    #[error("invalid stock")]
    InvalidStock,
    #[error("invalid quantity")]
    InvalidQuantity,
    #[error("product not found")]
    ProductNotFound,
    #[error("not found products")]
    NotFoundProducts,
    #[error("failed to create product")]
    FailedCreating,
    #[error("failed to reduce stock")]
    FailedReducingStock,
    #[error("failed to update product")]
    FailedUpdating,
    #[error("failed to delete product")]
    FailedDeleting,
    #[error("failed to scan rows")]
    ScanFailure,
}

impl ErrorKind {
    /// Stable code for external mapping/logging
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidId => "INVALID_ID",
            ErrorKind::ParametersMissing => "PARAMETERS_MISSING",
            ErrorKind::InvalidPrice => "INVALID_PRICE",
            ErrorKind::InvalidStock => "INVALID_STOCK",
            ErrorKind::InvalidQuantity => "INVALID_QUANTITY",
            ErrorKind::ProductNotFound => "PRODUCT_NOT_FOUND",
            ErrorKind::NotFoundProducts => "NOT_FOUND_PRODUCTS",
            ErrorKind::FailedCreating => "FAILED_CREATING_PRODUCT",
            ErrorKind::FailedReducingStock => "FAILED_REDUCING_STOCK",
            ErrorKind::FailedUpdating => "FAILED_UPDATING_PRODUCT",
            ErrorKind::FailedDeleting => "FAILED_DELETING_PRODUCT",
            ErrorKind::ScanFailure => "SCAN_FAILURE",
        }
    }

    /// Failures the caller can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidId
                | ErrorKind::ParametersMissing
                | ErrorKind::InvalidPrice
                | ErrorKind::InvalidStock
                | ErrorKind::InvalidQuantity
                | ErrorKind::ProductNotFound
        )
    }
}

/// Error returned by the product repository and service.
#[derive(Debug, Error)]
pub enum ProductError {
    /// A known kind, optionally carrying the store error behind it.
    #[error("{kind}")]
    Kind {
        kind: ErrorKind,
        #[source]
        source: Option<DbErr>,
    },
    /// Store failure with no domain meaning attached.
    #[error("store error: {0}")]
    Store(#[from] DbErr),
}

impl ProductError {
    pub fn wrap(kind: ErrorKind, source: DbErr) -> Self {
        Self::Kind { kind, source: Some(source) }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ProductError::Kind { kind, .. } => Some(*kind),
            ProductError::Store(_) => None,
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == Some(kind)
    }
}

impl From<ErrorKind> for ProductError {
    fn from(kind: ErrorKind) -> Self {
        Self::Kind { kind, source: None }
    }
}
