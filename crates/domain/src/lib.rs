pub mod categories;
pub mod error;
pub mod forest;
pub mod in_memory;
pub mod ports;

pub type DomainResult<T> = Result<T, error::DomainError>;
