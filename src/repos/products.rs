//! Repo for products table. Products are ranked by `sort_order` within their category.
use chrono::Utc;
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::dsl::{count_star, max};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;
use failure::Fail;

use models::*;
use repos::acl;
use repos::legacy_acl::CheckScope;
use repos::types::{RepoAcl, RepoResult};
use schema::categories::dsl as Categories;
use schema::products::dsl::*;

/// Products repository, responsible for handling products
pub struct ProductsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<Product>>,
}

pub trait ProductsRepo {
    /// Find specific product by id
    fn find(&self, id_arg: i32) -> RepoResult<Option<Product>>;

    /// Find products by ids
    fn find_many(&self, ids: Vec<i32>) -> RepoResult<Vec<Product>>;

    /// Returns one page of products ordered by `sort_order` and the total count
    fn list(&self, search: ProductsSearch, page: PageParams) -> RepoResult<(Vec<Product>, i64)>;

    /// Returns `(id, sort_order)` of every product in the category
    fn sort_scope(&self, category_id_arg: i32) -> RepoResult<Vec<(i32, i32)>>;

    /// Biggest `sort_order` in use within the category
    fn max_sort_order(&self, category_id_arg: i32) -> RepoResult<Option<i32>>;

    /// Number of products in the category
    fn count_by_category(&self, category_id_arg: i32) -> RepoResult<i64>;

    /// Creates new product
    fn create(&self, payload: InsertProduct) -> RepoResult<Product>;

    /// Updates specific product
    fn update(&self, id_arg: i32, payload: UpdateProduct) -> RepoResult<Product>;

    /// Writes new `sort_order` values
    fn set_sort_orders(&self, updates: &[SortOrderUpdate]) -> RepoResult<()>;

    /// Deletes specific product
    fn delete(&self, id_arg: i32) -> RepoResult<Product>;

    /// Deletes every product of the category, returns the number of deleted rows
    fn delete_by_category(&self, category_id_arg: i32) -> RepoResult<usize>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ProductsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<Product>>) -> Self {
        Self { db_conn, acl }
    }
}

macro_rules! filter_products {
    ($query:expr, $search:expr) => {{
        let mut query = $query;
        if let Some(ref term) = $search.search {
            let pattern = format!("%{}%", term);
            query = query.filter(name_en.ilike(pattern.clone()).or(name_ar.ilike(pattern)));
        }
        if let Some(category_id_arg) = $search.category_id {
            query = query.filter(category_id.eq(category_id_arg));
        }
        if let Some(featured) = $search.featured {
            query = query.filter(is_featured.eq(featured));
        }
        if $search.public_only {
            let active_categories = Categories::categories
                .select(Categories::id)
                .filter(Categories::is_active.eq(true));
            query = query.filter(is_active.eq(true)).filter(category_id.eq_any(active_categories));
        }
        query
    }};
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ProductsRepo for ProductsRepoImpl<'a, T> {
    fn find(&self, id_arg: i32) -> RepoResult<Option<Product>> {
        debug!("Find in products with id {}.", id_arg);
        products
            .filter(id.eq(id_arg))
            .get_result::<Product>(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<Product>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::Products, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find product by id: {} error occurred", id_arg)).into())
    }

    fn find_many(&self, ids: Vec<i32>) -> RepoResult<Vec<Product>> {
        debug!("Find in products with ids {:?}.", ids);
        products
            .filter(id.eq_any(&ids))
            .get_results::<Product>(self.db_conn)
            .map_err(From::from)
            .and_then(|values: Vec<Product>| {
                for value in &values {
                    acl::check(&*self.acl, Resource::Products, Action::Read, self, Some(value))?;
                }
                Ok(values)
            }).map_err(|e: FailureError| e.context(format!("Find products by ids: {:?} error occurred", ids)).into())
    }

    fn list(&self, search: ProductsSearch, page: PageParams) -> RepoResult<(Vec<Product>, i64)> {
        debug!("List products with search {:?} and page {:?}.", search, page);
        acl::check(&*self.acl, Resource::Products, Action::Read, self, None)
            .and_then(|_| {
                let total = filter_products!(products.select(count_star()).into_boxed(), search).get_result::<i64>(self.db_conn)?;
                let items = filter_products!(products.into_boxed(), search)
                    .order((sort_order.asc(), id.asc()))
                    .limit(page.limit)
                    .offset(page.offset())
                    .get_results::<Product>(self.db_conn)?;
                Ok((items, total))
            }).map_err(|e: FailureError| e.context("List products error occurred").into())
    }

    fn sort_scope(&self, category_id_arg: i32) -> RepoResult<Vec<(i32, i32)>> {
        debug!("Load sort scope of products in category {}.", category_id_arg);
        acl::check(&*self.acl, Resource::Products, Action::Read, self, None)
            .and_then(|_| {
                products
                    .filter(category_id.eq(category_id_arg))
                    .select((id, sort_order))
                    .order((sort_order.asc(), id.asc()))
                    .get_results::<(i32, i32)>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| {
                e.context(format!("Load sort scope of products in category {} error occurred", category_id_arg))
                    .into()
            })
    }

    fn max_sort_order(&self, category_id_arg: i32) -> RepoResult<Option<i32>> {
        debug!("Find max sort order of products in category {}.", category_id_arg);
        products
            .filter(category_id.eq(category_id_arg))
            .select(max(sort_order))
            .get_result::<Option<i32>>(self.db_conn)
            .map_err(|e| {
                e.context(format!("Find max sort order of products in category {} error occurred", category_id_arg))
                    .into()
            })
    }

    fn count_by_category(&self, category_id_arg: i32) -> RepoResult<i64> {
        debug!("Count products in category {}.", category_id_arg);
        products
            .filter(category_id.eq(category_id_arg))
            .select(count_star())
            .get_result::<i64>(self.db_conn)
            .map_err(|e| {
                e.context(format!("Count products in category {} error occurred", category_id_arg))
                    .into()
            })
    }

    fn create(&self, payload: InsertProduct) -> RepoResult<Product> {
        debug!("Create new product {:?}.", payload);
        let query = diesel::insert_into(products).values(&payload);
        query
            .get_result::<Product>(self.db_conn)
            .map_err(From::from)
            .and_then(|value| {
                acl::check(&*self.acl, Resource::Products, Action::Create, self, Some(&value))?;
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Create new product: {:?} error occurred", payload)).into())
    }

    fn update(&self, id_arg: i32, payload: UpdateProduct) -> RepoResult<Product> {
        debug!("Updating product with id {} and payload {:?}.", id_arg, payload);
        let mut payload = payload;
        payload.updated_at = Some(Utc::now().naive_utc());

        products
            .find(id_arg)
            .get_result::<Product>(self.db_conn)
            .map_err(From::from)
            .and_then(|value| acl::check(&*self.acl, Resource::Products, Action::Update, self, Some(&value)))
            .and_then(|_| {
                let filtered = products.filter(id.eq(id_arg));
                diesel::update(filtered)
                    .set(&payload)
                    .get_result::<Product>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| {
                e.context(format!("Updates specific product: id: {}, payload: {:?}, error occurred", id_arg, payload))
                    .into()
            })
    }

    fn set_sort_orders(&self, updates: &[SortOrderUpdate]) -> RepoResult<()> {
        debug!("Set sort orders of products {:?}.", updates);
        acl::check(&*self.acl, Resource::Products, Action::Update, self, None)
            .and_then(|_| {
                let now = Utc::now().naive_utc();
                for update in updates {
                    diesel::update(products.filter(id.eq(update.id)))
                        .set((sort_order.eq(update.sort_order), updated_at.eq(now)))
                        .execute(self.db_conn)?;
                }
                Ok(())
            }).map_err(|e: FailureError| e.context("Set sort orders of products error occurred").into())
    }

    fn delete(&self, id_arg: i32) -> RepoResult<Product> {
        debug!("Delete product with id {}.", id_arg);
        acl::check(&*self.acl, Resource::Products, Action::Delete, self, None)
            .and_then(|_| {
                diesel::delete(products.filter(id.eq(id_arg)))
                    .get_result::<Product>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Delete product: {} error occurred", id_arg)).into())
    }

    fn delete_by_category(&self, category_id_arg: i32) -> RepoResult<usize> {
        debug!("Delete products of category {}.", category_id_arg);
        acl::check(&*self.acl, Resource::Products, Action::Delete, self, None)
            .and_then(|_| {
                diesel::delete(products.filter(category_id.eq(category_id_arg)))
                    .execute(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Delete products of category: {} error occurred", category_id_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, Product>
    for ProductsRepoImpl<'a, T>
{
    fn is_in_scope(&self, _user_id: i32, scope: &Scope, _obj: Option<&Product>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => false,
        }
    }
}
