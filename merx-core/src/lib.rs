pub mod account;
pub mod catalog;
pub mod events;
pub mod payment;

/// Boxed error type used at collaborator seams. Concrete adapters are
/// swapped per deployment, so their error types are erased here.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
