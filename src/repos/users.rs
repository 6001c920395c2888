//! Repo for admin users table
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::dsl::count_star;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use models::*;
use repos::acl;
use repos::legacy_acl::CheckScope;
use repos::types::{RepoAcl, RepoResult};
use schema::users::dsl::*;

/// Admin users repository
pub struct UsersRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<User>>,
}

pub trait UsersRepo {
    /// Find specific user by id
    fn find(&self, id_arg: i32) -> RepoResult<Option<User>>;

    /// Find user by username or email
    fn find_by_login(&self, login: String) -> RepoResult<Option<User>>;

    /// Returns one page of users ordered by id and the total count
    fn list(&self, page: PageParams) -> RepoResult<(Vec<User>, i64)>;

    /// Creates new user
    fn create(&self, payload: InsertUser) -> RepoResult<User>;

    /// Updates specific user
    fn update(&self, id_arg: i32, payload: UserChangeset) -> RepoResult<User>;

    /// Deletes specific user
    fn delete(&self, id_arg: i32) -> RepoResult<User>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> UsersRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<User>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> UsersRepo for UsersRepoImpl<'a, T> {
    fn find(&self, id_arg: i32) -> RepoResult<Option<User>> {
        debug!("Find in users with id {}.", id_arg);
        users
            .filter(id.eq(id_arg))
            .get_result::<User>(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<User>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::Users, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find user by id: {} error occurred", id_arg)).into())
    }

    fn find_by_login(&self, login: String) -> RepoResult<Option<User>> {
        debug!("Find in users with login {}.", login);
        users
            .filter(username.eq(&login).or(email.eq(login.to_lowercase())))
            .get_result::<User>(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<User>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::Users, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find user by login: {} error occurred", login)).into())
    }

    fn list(&self, page: PageParams) -> RepoResult<(Vec<User>, i64)> {
        debug!("List users with page {:?}.", page);
        acl::check(&*self.acl, Resource::Users, Action::Read, self, None)
            .and_then(|_| {
                let total = users.select(count_star()).get_result::<i64>(self.db_conn)?;
                let items = users
                    .order(id.asc())
                    .limit(page.limit)
                    .offset(page.offset())
                    .get_results::<User>(self.db_conn)?;
                Ok((items, total))
            }).map_err(|e: FailureError| e.context("List users error occurred").into())
    }

    fn create(&self, payload: InsertUser) -> RepoResult<User> {
        debug!("Create new user {}.", payload.username);
        acl::check(&*self.acl, Resource::Users, Action::Create, self, None)
            .and_then(|_| {
                diesel::insert_into(users)
                    .values(&payload)
                    .get_result::<User>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Create new user: {} error occurred", payload.username)).into())
    }

    fn update(&self, id_arg: i32, payload: UserChangeset) -> RepoResult<User> {
        debug!("Updating user with id {}.", id_arg);
        users
            .find(id_arg)
            .get_result::<User>(self.db_conn)
            .map_err(From::from)
            .and_then(|value| acl::check(&*self.acl, Resource::Users, Action::Update, self, Some(&value)))
            .and_then(|_| {
                diesel::update(users.filter(id.eq(id_arg)))
                    .set(&payload)
                    .get_result::<User>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Updates specific user: id: {} error occurred", id_arg)).into())
    }

    fn delete(&self, id_arg: i32) -> RepoResult<User> {
        debug!("Delete user with id {}.", id_arg);
        acl::check(&*self.acl, Resource::Users, Action::Delete, self, None)
            .and_then(|_| {
                diesel::delete(users.filter(id.eq(id_arg)))
                    .get_result::<User>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Delete user: {} error occurred", id_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, User>
    for UsersRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id: i32, scope: &Scope, obj: Option<&User>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => obj.map(|user| user.id == user_id).unwrap_or(false),
        }
    }
}
