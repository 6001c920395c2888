//! Repo for order_items table
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
use schema::order_items::dsl::*;

/// Order items repository
pub struct OrderItemsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<OrderItem>>,
}

pub trait OrderItemsRepo {
    /// Inserts all lines of an order
    fn create_many(&self, payload: Vec<NewOrderItem>) -> RepoResult<Vec<OrderItem>>;

    /// Returns lines of the given orders
    fn list_for_orders(&self, order_ids: Vec<i32>) -> RepoResult<Vec<OrderItem>>;

    /// Deletes every line of an order
    fn delete_by_order(&self, order_id_arg: i32) -> RepoResult<usize>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> OrderItemsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<OrderItem>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> OrderItemsRepo for OrderItemsRepoImpl<'a, T> {
    fn create_many(&self, payload: Vec<NewOrderItem>) -> RepoResult<Vec<OrderItem>> {
        debug!("Create order items {:?}.", payload);
        acl::check(&*self.acl, Resource::OrderItems, Action::Create, self, None)
            .and_then(|_| {
                diesel::insert_into(order_items)
                    .values(&payload)
                    .get_results::<OrderItem>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Create order items: {:?} error occurred", payload)).into())
    }

    fn list_for_orders(&self, order_ids: Vec<i32>) -> RepoResult<Vec<OrderItem>> {
        debug!("List order items of orders {:?}.", order_ids);
        acl::check(&*self.acl, Resource::OrderItems, Action::Read, self, None)
            .and_then(|_| {
                order_items
                    .filter(order_id.eq_any(&order_ids))
                    .order(id.asc())
                    .get_results::<OrderItem>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("List order items of orders {:?} error occurred", order_ids)).into())
    }

    fn delete_by_order(&self, order_id_arg: i32) -> RepoResult<usize> {
        debug!("Delete order items of order {}.", order_id_arg);
        acl::check(&*self.acl, Resource::OrderItems, Action::Delete, self, None)
            .and_then(|_| {
                diesel::delete(order_items.filter(order_id.eq(order_id_arg)))
                    .execute(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Delete order items of order {} error occurred", order_id_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, OrderItem>
    for OrderItemsRepoImpl<'a, T>
{
    fn is_in_scope(&self, _user_id: i32, scope: &Scope, _obj: Option<&OrderItem>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => false,
        }
    }
}
