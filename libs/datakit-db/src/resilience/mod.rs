//! Timeout, retry and circuit breaking for store operations.
//!
//! [`OperationWrapper`] is the single place where raw [`StoreError`]s are
//! classified into caller-facing [`ErrorKind`]s.
//!
//! [`StoreError`]: crate::store::StoreError

mod circuit;
mod error_kind;
mod outcome;
mod policy;
mod wrapper;

pub use circuit::{Admission, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use error_kind::{Classification, ErrorKind, classify};
pub use outcome::{OperationFailure, OperationOutcome};
pub use policy::RetryPolicy;
pub use wrapper::OperationWrapper;
