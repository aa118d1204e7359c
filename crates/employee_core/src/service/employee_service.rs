//! Employee use-case service: aggregation reader and record writer.
//!
//! # Responsibility
//! - Serve the flattened employee listing and the last-id query.
//! - Fan create/update/delete out to the three collections in a fixed order.
//! - Resolve missing ids through the shared `IdAllocator`.
//!
//! # Invariants
//! - Writes are best-effort: the first failing step aborts the operation and
//!   earlier steps are NOT rolled back. Partial writes are logged.
//! - Missing employees are not errors: updates match zero rows and deletes
//!   report `deleted_count = 0`.

use crate::model::employee::{
    DeleteOutcome, EmpId, EmployeeDetails, EmployeeRecord, EmployeeUpdate, NewEmployee,
};
use crate::repo::employee_repo::{EmployeeRepository, RepoError, RepoResult, WriteStep};
use crate::service::id_allocator::IdAllocator;
use log::{debug, info, warn};

/// Use-case service over one repository and the process id allocator.
pub struct EmployeeService<'ids, R: EmployeeRepository> {
    repo: R,
    ids: &'ids IdAllocator,
}

impl<'ids, R: EmployeeRepository> EmployeeService<'ids, R> {
    pub fn new(repo: R, ids: &'ids IdAllocator) -> Self {
        Self { repo, ids }
    }

    /// Lists every employee joined with its department and language.
    ///
    /// Order follows the store's natural read order and is not a contract.
    pub fn list_employees(&self) -> RepoResult<Vec<EmployeeDetails>> {
        self.repo.list_employee_details()
    }

    /// Highest stored `emp_id`, or 0 when there are no employees.
    pub fn last_employee_id(&self) -> RepoResult<EmpId> {
        Ok(self.repo.max_employee_id()?.unwrap_or(0))
    }

    /// Creates one employee across `Employee`, `Department`, `Developers`.
    ///
    /// # Contract
    /// - Absent or zero `emp_id` is replaced by `IdAllocator::next()`.
    /// - Inserts run in collection order and stop at the first failure.
    /// - Returns the id the rows were written under.
    pub fn create_employee(&self, request: &NewEmployee) -> RepoResult<EmpId> {
        let emp_id = request.requested_id().unwrap_or_else(|| self.ids.next());
        let record = EmployeeRecord {
            emp_id,
            emp_name: request.emp_name.clone(),
        };

        let mut completed: Vec<WriteStep> = Vec::with_capacity(3);

        if let Err(err) = self.repo.insert_employee(&record) {
            return Err(report_partial_write("employee_create", emp_id, &completed, err));
        }
        completed.push(WriteStep::InsertEmployee);

        if let Err(err) = self.repo.insert_department(emp_id, &request.department) {
            return Err(report_partial_write("employee_create", emp_id, &completed, err));
        }
        completed.push(WriteStep::InsertDepartment);

        if let Err(err) = self.repo.insert_developer(emp_id, &request.language) {
            return Err(report_partial_write("employee_create", emp_id, &completed, err));
        }

        info!("event=employee_create module=service status=ok emp_id={emp_id}");
        Ok(emp_id)
    }

    /// Applies each present field of `update` to its own collection.
    ///
    /// # Contract
    /// - `emp_name` only changes an existing employee; zero matches is success.
    /// - `department` and `language` are upserts.
    /// - Steps run name, department, language; the first failure stops the rest.
    pub fn update_employee(&self, emp_id: EmpId, update: &EmployeeUpdate) -> RepoResult<()> {
        let mut completed: Vec<WriteStep> = Vec::with_capacity(3);

        if let Some(emp_name) = update.emp_name.as_deref() {
            match self.repo.update_employee_name(emp_id, emp_name) {
                Ok(matched) => {
                    if matched == 0 {
                        debug!(
                            "event=employee_update module=service status=no_match emp_id={emp_id}"
                        );
                    }
                    completed.push(WriteStep::UpdateEmployee);
                }
                Err(err) => {
                    return Err(report_partial_write("employee_update", emp_id, &completed, err))
                }
            }
        }

        if let Some(department) = update.department.as_deref() {
            if let Err(err) = self.repo.upsert_department(emp_id, department) {
                return Err(report_partial_write("employee_update", emp_id, &completed, err));
            }
            completed.push(WriteStep::UpdateDepartment);
        }

        if let Some(language) = update.language.as_deref() {
            if let Err(err) = self.repo.upsert_language(emp_id, language) {
                return Err(report_partial_write("employee_update", emp_id, &completed, err));
            }
            completed.push(WriteStep::UpdateDevelopers);
        }

        info!(
            "event=employee_update module=service status=ok emp_id={emp_id} steps={}",
            completed.len()
        );
        Ok(())
    }

    /// Deletes the employee row, then all of its department and language rows.
    ///
    /// Deleting an unknown id succeeds with `deleted_count = 0`.
    pub fn delete_employee(&self, emp_id: EmpId) -> RepoResult<DeleteOutcome> {
        let deleted = self
            .repo
            .delete_employee(emp_id)
            .map_err(|err| report_partial_write("employee_delete", emp_id, &[], err))?;
        let departments = self.repo.delete_departments(emp_id).map_err(|err| {
            report_partial_write("employee_delete", emp_id, &[WriteStep::DeleteEmployee], err)
        })?;
        let languages = self.repo.delete_developers(emp_id).map_err(|err| {
            report_partial_write(
                "employee_delete",
                emp_id,
                &[WriteStep::DeleteEmployee, WriteStep::DeleteDepartment],
                err,
            )
        })?;

        debug!(
            "event=employee_delete module=service status=ok emp_id={emp_id} employees={deleted} departments={departments} languages={languages}"
        );
        Ok(DeleteOutcome {
            deleted_count: deleted as u64,
            departments_removed: departments as u64,
            languages_removed: languages as u64,
        })
    }
}

fn report_partial_write(
    event: &str,
    emp_id: EmpId,
    completed: &[WriteStep],
    err: RepoError,
) -> RepoError {
    let failed = err.step().map_or("unknown", WriteStep::as_str);
    if completed.is_empty() {
        warn!("event={event} module=service status=error emp_id={emp_id} failed_step={failed} error={err}");
    } else {
        let kept = completed
            .iter()
            .map(|step| step.as_str())
            .collect::<Vec<_>>()
            .join(",");
        warn!(
            "event={event} module=service status=partial emp_id={emp_id} failed_step={failed} kept_steps={kept} error={err}"
        );
    }
    err
}
