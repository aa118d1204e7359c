//! Core domain logic for the employee directory.
//! This crate owns the store schema, the three-collection write model and the
//! aggregation that joins them back together.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::employee::{
    DeleteOutcome, EmpId, EmployeeDetails, EmployeeRecord, EmployeeUpdate, NewEmployee,
};
pub use repo::employee_repo::{
    EmployeeRepository, RepoError, RepoResult, SqliteEmployeeRepository, WriteStep,
};
pub use service::employee_service::EmployeeService;
pub use service::id_allocator::IdAllocator;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
