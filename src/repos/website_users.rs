//! Repo for website_users table
use chrono::Utc;
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
use schema::website_users::dsl::*;

/// Website users repository
pub struct WebsiteUsersRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<WebsiteUser>>,
}

pub trait WebsiteUsersRepo {
    /// Find specific website user by id
    fn find(&self, id_arg: i32) -> RepoResult<Option<WebsiteUser>>;

    /// Find website user by lowercased email
    fn find_by_email(&self, email_arg: String) -> RepoResult<Option<WebsiteUser>>;

    /// Returns one page of website users, newest first, and the total count
    fn list(&self, search: Option<String>, page: PageParams) -> RepoResult<(Vec<WebsiteUser>, i64)>;

    /// Creates new website user
    fn create(&self, payload: InsertWebsiteUser) -> RepoResult<WebsiteUser>;

    /// Updates specific website user
    fn update(&self, id_arg: i32, payload: UpdateWebsiteUser) -> RepoResult<WebsiteUser>;

    /// Deletes specific website user
    fn delete(&self, id_arg: i32) -> RepoResult<WebsiteUser>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> WebsiteUsersRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<WebsiteUser>>) -> Self {
        Self { db_conn, acl }
    }
}

macro_rules! filter_website_users {
    ($query:expr, $search:expr) => {{
        let mut query = $query;
        if let Some(ref term) = $search {
            let pattern = format!("%{}%", term);
            query = query.filter(
                first_name
                    .ilike(pattern.clone())
                    .or(last_name.ilike(pattern.clone()))
                    .or(email.ilike(pattern.clone()))
                    .or(phone.ilike(pattern)),
            );
        }
        query
    }};
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> WebsiteUsersRepo
    for WebsiteUsersRepoImpl<'a, T>
{
    fn find(&self, id_arg: i32) -> RepoResult<Option<WebsiteUser>> {
        debug!("Find in website users with id {}.", id_arg);
        website_users
            .filter(id.eq(id_arg))
            .get_result::<WebsiteUser>(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<WebsiteUser>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::WebsiteUsers, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find website user by id: {} error occurred", id_arg)).into())
    }

    fn find_by_email(&self, email_arg: String) -> RepoResult<Option<WebsiteUser>> {
        debug!("Find in website users with email {}.", email_arg);
        website_users
            .filter(email.eq(email_arg.to_lowercase()))
            .get_result::<WebsiteUser>(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<WebsiteUser>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::WebsiteUsers, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find website user by email: {} error occurred", email_arg)).into())
    }

    fn list(&self, search: Option<String>, page: PageParams) -> RepoResult<(Vec<WebsiteUser>, i64)> {
        debug!("List website users with search {:?} and page {:?}.", search, page);
        acl::check(&*self.acl, Resource::WebsiteUsers, Action::Read, self, None)
            .and_then(|_| {
                let total = filter_website_users!(website_users.select(count_star()).into_boxed(), search).get_result::<i64>(self.db_conn)?;
                let items = filter_website_users!(website_users.into_boxed(), search)
                    .order((created_at.desc(), id.desc()))
                    .limit(page.limit)
                    .offset(page.offset())
                    .get_results::<WebsiteUser>(self.db_conn)?;
                Ok((items, total))
            }).map_err(|e: FailureError| e.context("List website users error occurred").into())
    }

    fn create(&self, payload: InsertWebsiteUser) -> RepoResult<WebsiteUser> {
        debug!("Create new website user with email {}.", payload.email);
        acl::check(&*self.acl, Resource::WebsiteUsers, Action::Create, self, None)
            .and_then(|_| {
                diesel::insert_into(website_users)
                    .values(&payload)
                    .get_result::<WebsiteUser>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Create new website user: {} error occurred", payload.email)).into())
    }

    fn update(&self, id_arg: i32, payload: UpdateWebsiteUser) -> RepoResult<WebsiteUser> {
        debug!("Updating website user with id {} and payload {:?}.", id_arg, payload);
        let mut payload = payload;
        payload.updated_at = Some(Utc::now().naive_utc());

        website_users
            .find(id_arg)
            .get_result::<WebsiteUser>(self.db_conn)
            .map_err(From::from)
            .and_then(|value| acl::check(&*self.acl, Resource::WebsiteUsers, Action::Update, self, Some(&value)))
            .and_then(|_| {
                diesel::update(website_users.filter(id.eq(id_arg)))
                    .set(&payload)
                    .get_result::<WebsiteUser>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| {
                e.context(format!("Updates specific website user: id: {}, payload: {:?}, error occurred", id_arg, payload))
                    .into()
            })
    }

    fn delete(&self, id_arg: i32) -> RepoResult<WebsiteUser> {
        debug!("Delete website user with id {}.", id_arg);
        acl::check(&*self.acl, Resource::WebsiteUsers, Action::Delete, self, None)
            .and_then(|_| {
                diesel::delete(website_users.filter(id.eq(id_arg)))
                    .get_result::<WebsiteUser>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Delete website user: {} error occurred", id_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, WebsiteUser>
    for WebsiteUsersRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id: i32, scope: &Scope, obj: Option<&WebsiteUser>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => obj.map(|user| user.id == user_id).unwrap_or(false),
        }
    }
}
