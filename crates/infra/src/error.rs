//! Storage error model.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database | `40001`, `40P01` | `Transient` | Serialization failure, deadlock |
//! | Database | `55P03`, `57014` | `Transient` | Lock not available, statement timeout |
//! | Database | `53300` | `Transient` | Too many connections |
//! | Database | class `23` | `Integrity` | Unique, foreign key, check (stock floor) violations |
//! | Database (other) | Any other | `Backend` | Schema/SQL errors |
//! | Io, PoolTimedOut, WorkerCrashed | N/A | `Transient` | Connection loss, pool exhaustion |
//! | RowNotFound | N/A | `NotFound` | `fetch_one` found nothing |
//! | ColumnDecode, Decode, ColumnNotFound | N/A | `Decode` | Row shape mismatch |
//! | Other | N/A | `Backend` | Pool closed, TLS, protocol errors |

use thiserror::Error;

use stockorder_core::DomainError;
use stockorder_inventory::InventoryError;

/// Storage operation error.
///
/// Only `Transient` failures are worth retrying, and a retry always restarts
/// the whole operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transient storage failure: {0}")]
    Transient(String),

    #[error("integrity violation: {0}")]
    Integrity(String),

    /// A stock decrement was rejected under the strict inventory policy.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("failed to decode row: {0}")]
    Decode(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

impl From<DomainError> for StoreError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound(what) => StoreError::NotFound(what),
            other => StoreError::Validation(other.to_string()),
        }
    }
}

/// The step of an order write that failed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum WriteStep {
    Begin,
    InsertHeader,
    InsertLines,
    AdjustInventory,
    Commit,
}

impl core::fmt::Display for WriteStep {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            WriteStep::Begin => "begin",
            WriteStep::InsertHeader => "insert order header",
            WriteStep::InsertLines => "insert order lines",
            WriteStep::AdjustInventory => "adjust inventory",
            WriteStep::Commit => "commit",
        };
        f.write_str(s)
    }
}

/// Failure of `create_order`. The transaction has been rolled back.
#[derive(Debug, Error)]
#[error("create order failed at {step}: {source}")]
pub struct OrderWriteError {
    pub step: WriteStep,
    #[source]
    pub source: StoreError,
}

impl OrderWriteError {
    pub fn new(step: WriteStep, source: StoreError) -> Self {
        Self { step, source }
    }

    pub fn is_retryable(&self) -> bool {
        self.source.is_retryable()
    }

    /// Wraps a failing step's error, for use with `map_err`.
    pub(crate) fn at(step: WriteStep) -> impl FnOnce(StoreError) -> OrderWriteError {
        move |source| OrderWriteError::new(step, source)
    }
}

/// Map SQLx errors to StoreError.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("40001") | Some("40P01") | Some("55P03") | Some("57014") | Some("53300") => {
                    StoreError::Transient(msg)
                }
                Some(code) if code.starts_with("23") => StoreError::Integrity(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::Io(e) => {
            StoreError::Transient(format!("connection error in {}: {}", operation, e))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Transient(format!("timed out acquiring a connection in {}", operation))
        }
        sqlx::Error::WorkerCrashed => {
            StoreError::Transient(format!("connection worker crashed in {}", operation))
        }
        sqlx::Error::RowNotFound => StoreError::NotFound(format!("no row returned in {}", operation)),
        err @ (sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)) => {
            StoreError::Decode(format!("{} in {}", err, operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockorder_core::ProductId;

    #[test]
    fn pool_timeouts_and_io_errors_are_retryable() {
        assert!(map_sqlx_error("begin", sqlx::Error::PoolTimedOut).is_retryable());
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(map_sqlx_error("insert", sqlx::Error::Io(io)).is_retryable());
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = map_sqlx_error("resolve_product", sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn pool_closed_is_not_retryable() {
        assert!(!map_sqlx_error("begin", sqlx::Error::PoolClosed).is_retryable());
    }

    #[test]
    fn stock_exhaustion_is_not_retryable_and_names_the_step() {
        let err = OrderWriteError::new(
            WriteStep::AdjustInventory,
            StoreError::Inventory(InventoryError::StockExhausted {
                product_id: ProductId::new(3),
                requested: 5,
                available: 1,
            }),
        );
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "create order failed at adjust inventory: insufficient stock for product 3: requested 5, available 1"
        );
    }

    #[test]
    fn domain_errors_become_validation_or_not_found() {
        let e: StoreError = DomainError::validation("bad").into();
        assert!(matches!(e, StoreError::Validation(_)));
        let e: StoreError = DomainError::not_found("product 1").into();
        assert!(matches!(e, StoreError::NotFound(_)));
    }
}
