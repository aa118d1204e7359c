//! Shared application state and request-scoped store access.
//!
//! # Responsibility
//! - Hold the resolved configuration and the process `IdAllocator`.
//! - Run one request's store work on a blocking thread with its own
//!   connection, bounded by the configured timeout.
//!
//! # Invariants
//! - The store is migrated before the state is constructed.
//! - The allocator is the only shared mutable state.

use std::sync::Arc;

use employee_core::db::open_db_with_timeout;
use employee_core::{EmployeeService, IdAllocator, RepoResult, SqliteEmployeeRepository};
use log::info;

use crate::{config::Config, error::ApiError};

pub struct AppState {
    pub config: Config,
    pub ids: IdAllocator,
}

impl AppState {
    /// Opens the store once (applying migrations) and seeds the allocator
    /// from the highest stored id.
    pub fn new(config: Config) -> Result<Arc<Self>, employee_core::db::DbError> {
        let conn = open_db_with_timeout(&config.db_path, config.store_timeout)?;
        let ids = IdAllocator::initialize(&SqliteEmployeeRepository::new(&conn));
        info!(
            "event=state_init module=http status=ok db_path={} next_id={}",
            config.db_path.display(),
            ids.peek()
        );

        Ok(Arc::new(Self { config, ids }))
    }

    /// Runs `op` against a fresh connection off the async runtime.
    ///
    /// The caller gets `ApiError::Timeout` once `store_timeout` elapses; the
    /// blocking work itself is not interrupted and runs to completion.
    pub async fn with_service<T, F>(self: &Arc<Self>, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&EmployeeService<'_, SqliteEmployeeRepository<'_>>) -> RepoResult<T>
            + Send
            + 'static,
    {
        let state = Arc::clone(self);
        let limit = self.config.store_timeout;

        let work = tokio::task::spawn_blocking(move || -> Result<T, ApiError> {
            let conn = open_db_with_timeout(&state.config.db_path, state.config.store_timeout)?;
            let service = EmployeeService::new(SqliteEmployeeRepository::new(&conn), &state.ids);
            Ok(op(&service)?)
        });

        match tokio::time::timeout(limit, work).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(ApiError::Internal(join_err.to_string())),
            Err(_elapsed) => Err(ApiError::Timeout(limit)),
        }
    }
}
