use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use failure::Error as FailureError;
use r2d2::Pool;

use models::authorization::*;
use repos::legacy_acl::Acl;

/// Postgres connection pool
pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub type RepoResult<T> = Result<T, FailureError>;
pub type RepoAcl<T> = Acl<Resource, Action, Scope, FailureError, T>;
