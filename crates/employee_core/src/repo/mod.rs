//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define collection-level data access contracts for employee data.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Absence is never an error here: empty lists, zero counts and `None`
//!   represent missing rows.

pub mod employee_repo;
