//! Employee collection contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide per-collection read/write primitives over `Employee`,
//!   `Department` and `Developers`.
//! - Keep SQL details inside the store boundary.
//! - Normalize loosely typed `emp_id` values to `EmpId` on read.
//!
//! # Invariants
//! - Every write primitive touches exactly one collection; there is no
//!   cross-collection transaction at this layer.
//! - "First match" always means lowest `rowid` for the given `emp_id`.
//! - Write failures carry the `WriteStep` that failed.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::employee::{EmpId, EmployeeDetails, EmployeeRecord};
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DETAILS_SELECT_SQL: &str = "SELECT
    e.emp_id AS emp_id,
    e.emp_name AS emp_name,
    (SELECT d.department_name FROM Department d
      WHERE d.emp_id = e.emp_id ORDER BY d.rowid LIMIT 1) AS department,
    (SELECT v.language FROM Developers v
      WHERE v.emp_id = e.emp_id ORDER BY v.rowid LIMIT 1) AS language
FROM Employee e
ORDER BY e.rowid;";

pub type RepoResult<T> = Result<T, RepoError>;

/// One collection-level step of a multi-collection write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    InsertEmployee,
    InsertDepartment,
    InsertDevelopers,
    UpdateEmployee,
    UpdateDepartment,
    UpdateDevelopers,
    DeleteEmployee,
    DeleteDepartment,
    DeleteDevelopers,
}

impl WriteStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InsertEmployee => "insert employee",
            Self::InsertDepartment => "insert department",
            Self::InsertDevelopers => "insert developers",
            Self::UpdateEmployee => "update employee",
            Self::UpdateDepartment => "update department",
            Self::UpdateDevelopers => "update developers",
            Self::DeleteEmployee => "delete employee",
            Self::DeleteDepartment => "delete department",
            Self::DeleteDevelopers => "delete developers",
        }
    }
}

impl Display for WriteStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository error for employee collection operations.
#[derive(Debug)]
pub enum RepoError {
    /// Read-side store failure.
    Db(DbError),
    /// A single collection write failed.
    Write { step: WriteStep, source: DbError },
    /// Persisted data cannot be mapped to the domain model.
    InvalidData(String),
}

impl RepoError {
    pub fn write(step: WriteStep, source: impl Into<DbError>) -> Self {
        Self::Write {
            step,
            source: source.into(),
        }
    }

    /// Step that failed, when the error came from a write.
    pub fn step(&self) -> Option<WriteStep> {
        match self {
            Self::Write { step, .. } => Some(*step),
            _ => None,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Write { step, source } => write!(f, "{step}: {source}"),
            Self::InvalidData(message) => write!(f, "invalid persisted employee data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Write { source, .. } => Some(source),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Per-collection operations used by the aggregation reader and record writer.
pub trait EmployeeRepository {
    /// Every `Employee` row left-joined with its first `Department` and
    /// `Developers` rows, in natural read order.
    fn list_employee_details(&self) -> RepoResult<Vec<EmployeeDetails>>;
    /// Highest `emp_id` in `Employee`, or `None` when the collection is empty.
    fn max_employee_id(&self) -> RepoResult<Option<EmpId>>;

    fn insert_employee(&self, record: &EmployeeRecord) -> RepoResult<()>;
    fn insert_department(&self, emp_id: EmpId, department_name: &str) -> RepoResult<()>;
    fn insert_developer(&self, emp_id: EmpId, language: &str) -> RepoResult<()>;

    /// Renames the first matching employee. Returns matched rows (0 or 1).
    fn update_employee_name(&self, emp_id: EmpId, emp_name: &str) -> RepoResult<usize>;
    /// Updates the first matching department row or inserts one.
    fn upsert_department(&self, emp_id: EmpId, department_name: &str) -> RepoResult<()>;
    /// Updates the first matching developers row or inserts one.
    fn upsert_language(&self, emp_id: EmpId, language: &str) -> RepoResult<()>;

    /// Deletes the first matching employee. Returns deleted rows (0 or 1).
    fn delete_employee(&self, emp_id: EmpId) -> RepoResult<usize>;
    /// Deletes every department row for the id.
    fn delete_departments(&self, emp_id: EmpId) -> RepoResult<usize>;
    /// Deletes every developers row for the id.
    fn delete_developers(&self, emp_id: EmpId) -> RepoResult<usize>;
}

/// SQLite-backed employee repository.
pub struct SqliteEmployeeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Constructs a repository after checking the connection is migrated.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if version != latest_version() {
            return Err(RepoError::InvalidData(format!(
                "store schema version {version} does not match expected {}",
                latest_version()
            )));
        }
        Ok(Self::new(conn))
    }

    fn execute_step(
        &self,
        step: WriteStep,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<usize> {
        self.conn
            .execute(sql, params)
            .map_err(|err| RepoError::write(step, err))
    }

    fn upsert(
        &self,
        step: WriteStep,
        update_sql: &str,
        insert_sql: &str,
        emp_id: EmpId,
        value: &str,
    ) -> RepoResult<()> {
        let run = || -> rusqlite::Result<()> {
            // Immediate: the existence check and the insert must not interleave
            // with another writer creating the same row.
            let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
            let changed = tx.execute(update_sql, params![emp_id, value])?;
            if changed == 0 {
                tx.execute(insert_sql, params![emp_id, value])?;
            }
            tx.commit()
        };
        run().map_err(|err| RepoError::write(step, err))
    }
}

impl EmployeeRepository for SqliteEmployeeRepository<'_> {
    fn list_employee_details(&self) -> RepoResult<Vec<EmployeeDetails>> {
        let mut stmt = self.conn.prepare(DETAILS_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut employees = Vec::new();

        while let Some(row) = rows.next()? {
            employees.push(parse_details_row(row)?);
        }

        Ok(employees)
    }

    fn max_employee_id(&self) -> RepoResult<Option<EmpId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT emp_id FROM Employee ORDER BY emp_id DESC LIMIT 1;")?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_emp_id(row.get("emp_id")?, "Employee.emp_id")?)),
            None => Ok(None),
        }
    }

    fn insert_employee(&self, record: &EmployeeRecord) -> RepoResult<()> {
        self.execute_step(
            WriteStep::InsertEmployee,
            "INSERT INTO Employee (emp_id, emp_name) VALUES (?1, ?2);",
            params![record.emp_id, record.emp_name.as_str()],
        )?;
        Ok(())
    }

    fn insert_department(&self, emp_id: EmpId, department_name: &str) -> RepoResult<()> {
        self.execute_step(
            WriteStep::InsertDepartment,
            "INSERT INTO Department (emp_id, department_name) VALUES (?1, ?2);",
            params![emp_id, department_name],
        )?;
        Ok(())
    }

    fn insert_developer(&self, emp_id: EmpId, language: &str) -> RepoResult<()> {
        self.execute_step(
            WriteStep::InsertDevelopers,
            "INSERT INTO Developers (emp_id, language) VALUES (?1, ?2);",
            params![emp_id, language],
        )?;
        Ok(())
    }

    fn update_employee_name(&self, emp_id: EmpId, emp_name: &str) -> RepoResult<usize> {
        self.execute_step(
            WriteStep::UpdateEmployee,
            "UPDATE Employee SET emp_name = ?2
             WHERE rowid = (SELECT rowid FROM Employee WHERE emp_id = ?1 ORDER BY rowid LIMIT 1);",
            params![emp_id, emp_name],
        )
    }

    fn upsert_department(&self, emp_id: EmpId, department_name: &str) -> RepoResult<()> {
        self.upsert(
            WriteStep::UpdateDepartment,
            "UPDATE Department SET department_name = ?2
             WHERE rowid = (SELECT rowid FROM Department WHERE emp_id = ?1 ORDER BY rowid LIMIT 1);",
            "INSERT INTO Department (emp_id, department_name) VALUES (?1, ?2);",
            emp_id,
            department_name,
        )
    }

    fn upsert_language(&self, emp_id: EmpId, language: &str) -> RepoResult<()> {
        self.upsert(
            WriteStep::UpdateDevelopers,
            "UPDATE Developers SET language = ?2
             WHERE rowid = (SELECT rowid FROM Developers WHERE emp_id = ?1 ORDER BY rowid LIMIT 1);",
            "INSERT INTO Developers (emp_id, language) VALUES (?1, ?2);",
            emp_id,
            language,
        )
    }

    fn delete_employee(&self, emp_id: EmpId) -> RepoResult<usize> {
        self.execute_step(
            WriteStep::DeleteEmployee,
            "DELETE FROM Employee
             WHERE rowid = (SELECT rowid FROM Employee WHERE emp_id = ?1 ORDER BY rowid LIMIT 1);",
            [emp_id],
        )
    }

    fn delete_departments(&self, emp_id: EmpId) -> RepoResult<usize> {
        self.execute_step(
            WriteStep::DeleteDepartment,
            "DELETE FROM Department WHERE emp_id = ?1;",
            [emp_id],
        )
    }

    fn delete_developers(&self, emp_id: EmpId) -> RepoResult<usize> {
        self.execute_step(
            WriteStep::DeleteDevelopers,
            "DELETE FROM Developers WHERE emp_id = ?1;",
            [emp_id],
        )
    }
}

fn parse_details_row(row: &Row<'_>) -> RepoResult<EmployeeDetails> {
    let emp_id = parse_emp_id(row.get("emp_id")?, "Employee.emp_id")?;
    Ok(EmployeeDetails {
        emp_id,
        emp_name: row.get("emp_name")?,
        department: row.get("department")?,
        language: row.get("language")?,
    })
}

/// Normalizes a stored id to `EmpId`.
///
/// Integers pass through, finite reals truncate toward zero, and text is
/// accepted when it parses as an integer.
pub(crate) fn parse_emp_id(value: Value, column: &str) -> RepoResult<EmpId> {
    match value {
        Value::Integer(id) => Ok(id),
        Value::Real(id) if id.is_finite() && id.abs() < i64::MAX as f64 => Ok(id.trunc() as i64),
        Value::Text(ref text) => text.trim().parse::<EmpId>().map_err(|_| {
            RepoError::InvalidData(format!("invalid emp_id value `{text}` in {column}"))
        }),
        other => Err(RepoError::InvalidData(format!(
            "invalid emp_id value `{other:?}` in {column}"
        ))),
    }
}
