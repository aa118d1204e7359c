//! Employee records, read model and write requests.
//!
//! # Responsibility
//! - Describe one row per collection (`Employee`, `Department`, `Developers`).
//! - Describe the joined `EmployeeDetails` view returned to listing callers.
//! - Describe create/update payloads accepted by the record writer.
//!
//! # Invariants
//! - `emp_id == 0` in a create request means "allocate one for me".
//! - Update fields are independent; `None` leaves the collection untouched.

use serde::{Deserialize, Serialize};

/// Shared key linking rows across the three collections.
///
/// Normalized to a fixed-width integer at the store boundary, whatever numeric
/// representation the row was written with.
pub type EmpId = i64;

/// Canonical `Employee` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRecord {
    pub emp_id: EmpId,
    pub emp_name: String,
}

/// Flattened employee view joined from all three collections.
///
/// `department` and `language` are `None` when the employee has no matching
/// row in `Department` / `Developers`; they serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeDetails {
    pub emp_id: EmpId,
    pub emp_name: String,
    pub department: Option<String>,
    pub language: Option<String>,
}

/// Create request for one employee across all three collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewEmployee {
    /// Caller-supplied id. `None` or `Some(0)` requests allocation.
    #[serde(default)]
    pub emp_id: Option<EmpId>,
    #[serde(default)]
    pub emp_name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub language: String,
}

impl NewEmployee {
    pub fn new(
        emp_name: impl Into<String>,
        department: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            emp_id: None,
            emp_name: emp_name.into(),
            department: department.into(),
            language: language.into(),
        }
    }

    /// Pins the id instead of allocating one.
    pub fn with_id(mut self, emp_id: EmpId) -> Self {
        self.emp_id = Some(emp_id);
        self
    }

    /// Returns the caller-supplied id, treating zero as absent.
    pub fn requested_id(&self) -> Option<EmpId> {
        self.emp_id.filter(|id| *id != 0)
    }
}

/// Partial update request; each field targets its own collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EmployeeUpdate {
    /// Applied to an existing `Employee` row only (no upsert).
    #[serde(default)]
    pub emp_name: Option<String>,
    /// Upserted into `Department`.
    #[serde(default)]
    pub department: Option<String>,
    /// Upserted into `Developers`.
    #[serde(default)]
    pub language: Option<String>,
}

impl EmployeeUpdate {
    /// Whether the update touches no collection at all.
    pub fn is_empty(&self) -> bool {
        self.emp_name.is_none() && self.department.is_none() && self.language.is_none()
    }
}

/// Result of deleting one employee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// `Employee` rows removed: 0 or 1.
    pub deleted_count: u64,
    /// `Department` rows removed (may exceed 1 with duplicates).
    pub departments_removed: u64,
    /// `Developers` rows removed (may exceed 1 with duplicates).
    pub languages_removed: u64,
}
