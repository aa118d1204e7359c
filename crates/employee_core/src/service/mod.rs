//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate collection-level repository calls into employee use-cases.
//! - Own the process-local id sequence.
//! - Keep HTTP layers decoupled from storage details.

pub mod employee_service;
pub mod id_allocator;
