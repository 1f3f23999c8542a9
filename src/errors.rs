use sea_orm::error::DbErr;
use serde::Serialize;

/// Error type shared by all ledger services.
///
/// Every mutating operation runs inside one database transaction; returning
/// any of these aborts that transaction, so no partial ledger writes survive
/// a failure.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        sea_orm::error::DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Stock item in use: {0}")]
    StockInUse(String),

    #[error("Unknown stock item: {0}")]
    UnknownStockItem(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

impl ServiceError {
    /// Generic constructor that normalizes any supported database error input.
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        ServiceError::DatabaseError(error.into_db_err())
    }

    /// True for errors a caller can fix by changing its request, as opposed
    /// to infrastructure failures.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::ValidationError(_)
                | Self::InvalidOperation(_)
                | Self::InvalidQuantity(_)
                | Self::InsufficientStock(_)
                | Self::StockInUse(_)
                | Self::UnknownStockItem(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_error_accepts_strings_and_dberr() {
        let from_str = ServiceError::db_error("boom");
        assert!(matches!(from_str, ServiceError::DatabaseError(_)));

        let from_db = ServiceError::db_error(DbErr::Custom("x".into()));
        assert!(matches!(from_db, ServiceError::DatabaseError(_)));
    }

    #[test]
    fn client_error_classification() {
        assert!(ServiceError::InsufficientStock("x".into()).is_client_error());
        assert!(ServiceError::StockInUse("x".into()).is_client_error());
        assert!(!ServiceError::InternalError("x".into()).is_client_error());
        assert!(!ServiceError::db_error("x").is_client_error());
    }

    #[test]
    fn validation_errors_convert() {
        use validator::ValidationErrors;
        let err: ServiceError = ValidationErrors::new().into();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }
}
