//! Repo for sessions table
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use models::*;
use repos::acl;
use repos::legacy_acl::CheckScope;
use repos::types::{RepoAcl, RepoResult};
use schema::sessions::dsl::*;

/// Sessions repository
pub struct SessionsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<Session>>,
}

pub trait SessionsRepo {
    /// Stores a new session
    fn create(&self, payload: NewSession) -> RepoResult<Session>;

    /// Find session by token within a namespace
    fn find(&self, token: String, kind_arg: SessionKind) -> RepoResult<Option<Session>>;

    /// Removes a session by token
    fn delete(&self, token: String) -> RepoResult<usize>;

    /// Removes every session of a subject
    fn delete_for_subject(&self, kind_arg: SessionKind, subject_id_arg: i32) -> RepoResult<usize>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> SessionsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<Session>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> SessionsRepo for SessionsRepoImpl<'a, T> {
    fn create(&self, payload: NewSession) -> RepoResult<Session> {
        debug!("Create new {} session for {}.", payload.kind, payload.subject_id);
        acl::check(&*self.acl, Resource::Sessions, Action::Create, self, None)
            .and_then(|_| {
                diesel::insert_into(sessions)
                    .values(&payload)
                    .get_result::<Session>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Create new {} session error occurred", payload.kind)).into())
    }

    fn find(&self, token: String, kind_arg: SessionKind) -> RepoResult<Option<Session>> {
        debug!("Find {} session.", kind_arg);
        sessions
            .filter(id.eq(&token))
            .filter(kind.eq(kind_arg))
            .get_result::<Session>(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<Session>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::Sessions, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find {} session error occurred", kind_arg)).into())
    }

    fn delete(&self, token: String) -> RepoResult<usize> {
        debug!("Delete session.");
        acl::check(&*self.acl, Resource::Sessions, Action::Delete, self, None)
            .and_then(|_| {
                diesel::delete(sessions.filter(id.eq(&token)))
                    .execute(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context("Delete session error occurred").into())
    }

    fn delete_for_subject(&self, kind_arg: SessionKind, subject_id_arg: i32) -> RepoResult<usize> {
        debug!("Delete {} sessions of {}.", kind_arg, subject_id_arg);
        acl::check(&*self.acl, Resource::Sessions, Action::Delete, self, None)
            .and_then(|_| {
                diesel::delete(sessions.filter(kind.eq(kind_arg)).filter(subject_id.eq(subject_id_arg)))
                    .execute(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| {
                e.context(format!("Delete {} sessions of {} error occurred", kind_arg, subject_id_arg))
                    .into()
            })
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, Session>
    for SessionsRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id: i32, scope: &Scope, obj: Option<&Session>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => obj.map(|session| session.subject_id == user_id).unwrap_or(false),
        }
    }
}
