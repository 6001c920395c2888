//! Services is a core layer for the app business logic like
//! validation, authorization, etc.

pub mod addresses;
pub mod auth;
pub mod categories;
pub mod content;
pub mod orders;
pub mod products;
pub mod system;
pub mod types;
pub mod uploads;
pub mod users;
pub mod website_users;

pub use self::addresses::*;
pub use self::auth::*;
pub use self::categories::*;
pub use self::content::*;
pub use self::orders::*;
pub use self::products::*;
pub use self::system::*;
pub use self::types::*;
pub use self::uploads::*;
pub use self::users::*;
pub use self::website_users::*;

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::{Error as FailureError, Fail};
use r2d2::{ManageConnection, PooledConnection};
use validator::Validate;

use self::types::ServiceFuture;
use controller::context::{DynamicContext, StaticContext};
use errors::Error;
use models::{AdminRole, SessionContext};
use repos::repo_factory::*;

/// Service
pub struct Service<
    T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
    M: ManageConnection<Connection = T>,
    F: ReposFactory<T>,
> {
    pub static_context: StaticContext<T, M, F>,
    pub dynamic_context: DynamicContext,
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > Service<T, M, F>
{
    /// Create a new service
    pub fn new(static_context: StaticContext<T, M, F>, dynamic_context: DynamicContext) -> Self {
        Self {
            static_context,
            dynamic_context,
        }
    }

    /// Runs `f` on the cpu pool with a connection from the db pool
    pub fn spawn_on_pool<R, Func>(&self, f: Func) -> ServiceFuture<R>
    where
        Func: FnOnce(PooledConnection<M>) -> Result<R, FailureError> + Send + 'static,
        R: Send + 'static,
    {
        let db_pool = self.static_context.db_pool.clone();
        let cpu_pool = self.static_context.cpu_pool.clone();
        Box::new(cpu_pool.spawn_fn(move || {
            db_pool
                .get()
                .map_err(|e| e.context(Error::Connection).into())
                .and_then(f)
        }))
    }

    /// Runs a blocking closure that needs no database connection
    pub fn spawn_blocking<R, Func>(&self, f: Func) -> ServiceFuture<R>
    where
        Func: FnOnce() -> Result<R, FailureError> + Send + 'static,
        R: Send + 'static,
    {
        Box::new(self.static_context.cpu_pool.spawn_fn(f))
    }

    pub fn session(&self) -> SessionContext {
        self.dynamic_context.session
    }
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > Clone for Service<T, M, F>
{
    fn clone(&self) -> Self {
        Self {
            static_context: self.static_context.clone(),
            dynamic_context: self.dynamic_context.clone(),
        }
    }
}

/// Id of the logged in website user, `Unauthorized` otherwise
pub fn require_customer(session: SessionContext) -> Result<i32, FailureError> {
    session
        .customer_id()
        .ok_or_else(|| format_err!("Website user session required").context(Error::Unauthorized).into())
}

/// Id and role of the logged in admin, `Unauthorized` otherwise
pub fn require_admin(session: SessionContext) -> Result<(i32, AdminRole), FailureError> {
    match session {
        SessionContext::Admin { id, role } => Ok((id, role)),
        _ => Err(format_err!("Admin session required").context(Error::Unauthorized).into()),
    }
}

/// Runs `validator` checks and tags failures with `Error::Validate`
pub fn validate<V: Validate>(payload: &V) -> Result<(), FailureError> {
    payload
        .validate()
        .map_err(|e| format_err!("Validation of payload failed").context(Error::Validate(e)).into())
}
