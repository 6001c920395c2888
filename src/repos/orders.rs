//! Repo for orders table
use chrono::Utc;
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::dsl::count_star;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::sql_types::{BigInt, Text};
use diesel::Connection;
use failure::Error as FailureError;
use failure::Fail;

use models::*;
use repos::acl;
use repos::legacy_acl::CheckScope;
use repos::types::{RepoAcl, RepoResult};
use schema::orders::dsl::*;

sql_function!(fn nextval(sequence: Text) -> BigInt);

pub const ORDER_NUMBER_SEQUENCE: &str = "order_number_seq";

/// Orders repository, responsible for handling orders
pub struct OrdersRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<Order>>,
}

pub trait OrdersRepo {
    /// Draws the next value of the order number sequence
    fn next_order_seq(&self) -> RepoResult<i64>;

    /// Creates new order
    fn create(&self, payload: NewOrder) -> RepoResult<Order>;

    /// Find specific order by id
    fn find(&self, id_arg: i32) -> RepoResult<Option<Order>>;

    /// Returns one page of orders, newest first, and the total count
    fn list(&self, search: OrdersSearch, page: PageParams) -> RepoResult<(Vec<Order>, i64)>;

    /// Returns every order of the website user, newest first
    fn list_for_user(&self, website_user_id_arg: i32) -> RepoResult<Vec<Order>>;

    /// Updates specific order
    fn update(&self, id_arg: i32, payload: UpdateOrder) -> RepoResult<Order>;

    /// Deletes specific order
    fn delete(&self, id_arg: i32) -> RepoResult<Order>;

    /// Unlinks the orders of a deleted website user
    fn detach_user(&self, website_user_id_arg: i32) -> RepoResult<usize>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> OrdersRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<Order>>) -> Self {
        Self { db_conn, acl }
    }
}

macro_rules! filter_orders {
    ($query:expr, $search:expr) => {{
        let mut query = $query;
        if let Some(status_arg) = $search.status {
            query = query.filter(status.eq(status_arg));
        }
        if let Some(user_id_arg) = $search.website_user_id {
            query = query.filter(website_user_id.eq(user_id_arg));
        }
        query
    }};
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> OrdersRepo for OrdersRepoImpl<'a, T> {
    fn next_order_seq(&self) -> RepoResult<i64> {
        debug!("Draw next value of {}.", ORDER_NUMBER_SEQUENCE);
        diesel::select(nextval(ORDER_NUMBER_SEQUENCE))
            .get_result::<i64>(self.db_conn)
            .map_err(|e| e.context("Draw next order number error occurred").into())
    }

    fn create(&self, payload: NewOrder) -> RepoResult<Order> {
        debug!("Create new order {:?}.", payload);
        acl::check(&*self.acl, Resource::Orders, Action::Create, self, None)
            .and_then(|_| {
                diesel::insert_into(orders)
                    .values(&payload)
                    .get_result::<Order>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Create new order: {:?} error occurred", payload)).into())
    }

    fn find(&self, id_arg: i32) -> RepoResult<Option<Order>> {
        debug!("Find in orders with id {}.", id_arg);
        orders
            .filter(id.eq(id_arg))
            .get_result::<Order>(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<Order>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::Orders, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find order by id: {} error occurred", id_arg)).into())
    }

    fn list(&self, search: OrdersSearch, page: PageParams) -> RepoResult<(Vec<Order>, i64)> {
        debug!("List orders with search {:?} and page {:?}.", search, page);
        acl::check(&*self.acl, Resource::Orders, Action::Read, self, None)
            .and_then(|_| {
                let total = filter_orders!(orders.select(count_star()).into_boxed(), search).get_result::<i64>(self.db_conn)?;
                let items = filter_orders!(orders.into_boxed(), search)
                    .order((created_at.desc(), id.desc()))
                    .limit(page.limit)
                    .offset(page.offset())
                    .get_results::<Order>(self.db_conn)?;
                Ok((items, total))
            }).map_err(|e: FailureError| e.context("List orders error occurred").into())
    }

    fn list_for_user(&self, website_user_id_arg: i32) -> RepoResult<Vec<Order>> {
        debug!("List orders of website user {}.", website_user_id_arg);
        orders
            .filter(website_user_id.eq(website_user_id_arg))
            .order((created_at.desc(), id.desc()))
            .get_results::<Order>(self.db_conn)
            .map_err(From::from)
            .and_then(|values: Vec<Order>| {
                for value in &values {
                    acl::check(&*self.acl, Resource::Orders, Action::Read, self, Some(value))?;
                }
                Ok(values)
            }).map_err(|e: FailureError| {
                e.context(format!("List orders of website user {} error occurred", website_user_id_arg))
                    .into()
            })
    }

    fn update(&self, id_arg: i32, payload: UpdateOrder) -> RepoResult<Order> {
        debug!("Updating order with id {} and payload {:?}.", id_arg, payload);
        let mut payload = payload;
        payload.updated_at = Some(Utc::now().naive_utc());

        orders
            .find(id_arg)
            .get_result::<Order>(self.db_conn)
            .map_err(From::from)
            .and_then(|value| acl::check(&*self.acl, Resource::Orders, Action::Update, self, Some(&value)))
            .and_then(|_| {
                diesel::update(orders.filter(id.eq(id_arg)))
                    .set(&payload)
                    .get_result::<Order>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| {
                e.context(format!("Updates specific order: id: {}, payload: {:?}, error occurred", id_arg, payload))
                    .into()
            })
    }

    fn delete(&self, id_arg: i32) -> RepoResult<Order> {
        debug!("Delete order with id {}.", id_arg);
        acl::check(&*self.acl, Resource::Orders, Action::Delete, self, None)
            .and_then(|_| {
                diesel::delete(orders.filter(id.eq(id_arg)))
                    .get_result::<Order>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Delete order: {} error occurred", id_arg)).into())
    }

    fn detach_user(&self, website_user_id_arg: i32) -> RepoResult<usize> {
        debug!("Detach orders of website user {}.", website_user_id_arg);
        acl::check(&*self.acl, Resource::Orders, Action::Update, self, None)
            .and_then(|_| {
                diesel::update(orders.filter(website_user_id.eq(website_user_id_arg)))
                    .set(website_user_id.eq(None::<i32>))
                    .execute(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| {
                e.context(format!("Detach orders of website user {} error occurred", website_user_id_arg))
                    .into()
            })
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, Order>
    for OrdersRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id: i32, scope: &Scope, obj: Option<&Order>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => obj.map(|order| order.website_user_id == Some(user_id)).unwrap_or(false),
        }
    }
}
