//! Employee domain model.
//!
//! # Responsibility
//! - Define the records stored in the three employee collections.
//! - Define the flattened read model and the write request shapes.
//!
//! # Invariants
//! - Every record is linked by a shared integer `EmpId`.
//! - An employee exists iff an `Employee` row carries its id.

pub mod employee;
