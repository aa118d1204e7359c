//! Sequential employee id allocation.
//!
//! # Responsibility
//! - Hand out increasing `EmpId`s for create requests without an id.
//! - Seed the sequence from the highest id already stored.
//!
//! # Invariants
//! - `next()` runs in an exclusive critical section; concurrent callers never
//!   receive the same id from one allocator.
//! - The sequence is process-local. It is not coordinated with other
//!   processes or with ids supplied explicitly by callers, so collisions
//!   with those remain possible.
//! - A failed seed read falls back to 1 instead of failing startup.

use crate::model::employee::EmpId;
use crate::repo::employee_repo::EmployeeRepository;
use log::{info, warn};
use std::sync::{Mutex, PoisonError};

/// Process-local id sequence guarded by a mutex.
#[derive(Debug)]
pub struct IdAllocator {
    next_id: Mutex<EmpId>,
}

impl IdAllocator {
    /// Creates an allocator whose first `next()` returns `first_id`.
    pub fn starting_at(first_id: EmpId) -> Self {
        Self {
            next_id: Mutex::new(first_id),
        }
    }

    /// Seeds the allocator from `max(emp_id) + 1` in the `Employee`
    /// collection, or 1 when it is empty.
    ///
    /// Read failures are logged and swallowed; the allocator then starts at 1
    /// and may hand out ids that already exist.
    pub fn initialize<R: EmployeeRepository>(repo: &R) -> Self {
        let first_id = match repo.max_employee_id() {
            Ok(Some(max_id)) => {
                let first_id = max_id.saturating_add(1);
                info!("event=id_allocator_init module=service status=ok next_id={first_id}");
                first_id
            }
            Ok(None) => {
                info!("event=id_allocator_init module=service status=empty next_id=1");
                1
            }
            Err(err) => {
                warn!(
                    "event=id_allocator_init module=service status=error next_id=1 error={}",
                    err
                );
                1
            }
        };
        Self::starting_at(first_id)
    }

    /// Returns the next id and advances the sequence.
    pub fn next(&self) -> EmpId {
        let mut guard = self.next_id.lock().unwrap_or_else(PoisonError::into_inner);
        let id = *guard;
        *guard = id.saturating_add(1);
        id
    }

    /// Returns the id the next `next()` call would hand out.
    pub fn peek(&self) -> EmpId {
        *self.next_id.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}
