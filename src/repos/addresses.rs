//! Repo for user_addresses table
use chrono::Utc;
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
use schema::user_addresses::dsl::*;

/// Addresses repository, responsible for saved delivery addresses
pub struct AddressesRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<Address>>,
}

pub trait AddressesRepo {
    /// Returns addresses of the user, default first, then newest first
    fn list_for_user(&self, user_id_arg: i32) -> RepoResult<Vec<Address>>;

    /// Find address by id among the addresses of the user
    fn find_for_user(&self, user_id_arg: i32, id_arg: i32) -> RepoResult<Option<Address>>;

    /// Creates new address
    fn create(&self, payload: InsertAddress) -> RepoResult<Address>;

    /// Updates specific address
    fn update(&self, id_arg: i32, payload: UpdateAddress) -> RepoResult<Address>;

    /// Drops the default flag from every address of the user except `keep_id`
    fn clear_default(&self, user_id_arg: i32, keep_id: Option<i32>) -> RepoResult<usize>;

    /// Deletes specific address
    fn delete(&self, id_arg: i32) -> RepoResult<Address>;

    /// Deletes every address of the user
    fn delete_for_user(&self, user_id_arg: i32) -> RepoResult<usize>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> AddressesRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<Address>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> AddressesRepo for AddressesRepoImpl<'a, T> {
    fn list_for_user(&self, user_id_arg: i32) -> RepoResult<Vec<Address>> {
        debug!("List addresses of user {}.", user_id_arg);
        user_addresses
            .filter(user_id.eq(user_id_arg))
            .order((is_default.desc(), created_at.desc(), id.desc()))
            .get_results::<Address>(self.db_conn)
            .map_err(From::from)
            .and_then(|values: Vec<Address>| {
                for value in &values {
                    acl::check(&*self.acl, Resource::Addresses, Action::Read, self, Some(value))?;
                }
                Ok(values)
            }).map_err(|e: FailureError| e.context(format!("List addresses of user {} error occurred", user_id_arg)).into())
    }

    fn find_for_user(&self, user_id_arg: i32, id_arg: i32) -> RepoResult<Option<Address>> {
        debug!("Find address {} of user {}.", id_arg, user_id_arg);
        user_addresses
            .filter(id.eq(id_arg))
            .filter(user_id.eq(user_id_arg))
            .get_result::<Address>(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<Address>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::Addresses, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find address {} of user {} error occurred", id_arg, user_id_arg)).into())
    }

    fn create(&self, payload: InsertAddress) -> RepoResult<Address> {
        debug!("Create new address {:?}.", payload);
        diesel::insert_into(user_addresses)
            .values(&payload)
            .get_result::<Address>(self.db_conn)
            .map_err(From::from)
            .and_then(|value| {
                acl::check(&*self.acl, Resource::Addresses, Action::Create, self, Some(&value))?;
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Create new address: {:?} error occurred", payload)).into())
    }

    fn update(&self, id_arg: i32, payload: UpdateAddress) -> RepoResult<Address> {
        debug!("Updating address with id {} and payload {:?}.", id_arg, payload);
        let mut payload = payload;
        payload.updated_at = Some(Utc::now().naive_utc());

        user_addresses
            .find(id_arg)
            .get_result::<Address>(self.db_conn)
            .map_err(From::from)
            .and_then(|value| acl::check(&*self.acl, Resource::Addresses, Action::Update, self, Some(&value)))
            .and_then(|_| {
                diesel::update(user_addresses.filter(id.eq(id_arg)))
                    .set(&payload)
                    .get_result::<Address>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| {
                e.context(format!("Updates specific address: id: {}, payload: {:?}, error occurred", id_arg, payload))
                    .into()
            })
    }

    fn clear_default(&self, user_id_arg: i32, keep_id: Option<i32>) -> RepoResult<usize> {
        debug!("Clear default address of user {} keeping {:?}.", user_id_arg, keep_id);
        let now = Utc::now().naive_utc();
        let filtered = user_addresses
            .filter(user_id.eq(user_id_arg))
            .filter(is_default.eq(true))
            .filter(id.ne(keep_id.unwrap_or(0)));
        filtered
            .clone()
            .get_results::<Address>(self.db_conn)
            .map_err(From::from)
            .and_then(|values: Vec<Address>| {
                for value in &values {
                    acl::check(&*self.acl, Resource::Addresses, Action::Update, self, Some(value))?;
                }
                diesel::update(filtered)
                    .set((is_default.eq(false), updated_at.eq(now)))
                    .execute(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Clear default address of user {} error occurred", user_id_arg)).into())
    }

    fn delete(&self, id_arg: i32) -> RepoResult<Address> {
        debug!("Delete address with id {}.", id_arg);
        user_addresses
            .find(id_arg)
            .get_result::<Address>(self.db_conn)
            .map_err(From::from)
            .and_then(|value| acl::check(&*self.acl, Resource::Addresses, Action::Delete, self, Some(&value)))
            .and_then(|_| {
                diesel::delete(user_addresses.filter(id.eq(id_arg)))
                    .get_result::<Address>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Delete address: {} error occurred", id_arg)).into())
    }

    fn delete_for_user(&self, user_id_arg: i32) -> RepoResult<usize> {
        debug!("Delete addresses of user {}.", user_id_arg);
        acl::check(&*self.acl, Resource::Addresses, Action::Delete, self, None)
            .and_then(|_| {
                diesel::delete(user_addresses.filter(user_id.eq(user_id_arg)))
                    .execute(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Delete addresses of user {} error occurred", user_id_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, Address>
    for AddressesRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id_arg: i32, scope: &Scope, obj: Option<&Address>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => obj.map(|row| row.is_owned_by(user_id_arg)).unwrap_or(false),
        }
    }
}
