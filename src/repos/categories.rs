//! Repo for categories table. Categories share one global `sort_order` scope.
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
use schema::categories::dsl::*;

/// Categories repository, responsible for handling categories
pub struct CategoriesRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<Category>>,
}

pub trait CategoriesRepo {
    /// Find specific category by id
    fn find(&self, id_arg: i32) -> RepoResult<Option<Category>>;

    /// Find category by slug
    fn find_by_slug(&self, slug_arg: String) -> RepoResult<Option<Category>>;

    /// Returns one page of categories ordered by `sort_order` and the total count
    fn list(&self, search: CategoriesSearch, page: PageParams) -> RepoResult<(Vec<Category>, i64)>;

    /// Returns `(id, sort_order)` of every category
    fn sort_scope(&self) -> RepoResult<Vec<(i32, i32)>>;

    /// Biggest `sort_order` in use
    fn max_sort_order(&self) -> RepoResult<Option<i32>>;

    /// Creates new category
    fn create(&self, payload: InsertCategory) -> RepoResult<Category>;

    /// Updates specific category
    fn update(&self, id_arg: i32, payload: UpdateCategory) -> RepoResult<Category>;

    /// Writes new `sort_order` values
    fn set_sort_orders(&self, updates: &[SortOrderUpdate]) -> RepoResult<()>;

    /// Deletes specific category
    fn delete(&self, id_arg: i32) -> RepoResult<Category>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CategoriesRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<Category>>) -> Self {
        Self { db_conn, acl }
    }
}

macro_rules! filter_categories {
    ($query:expr, $search:expr) => {{
        let mut query = $query;
        if let Some(ref term) = $search.search {
            let pattern = format!("%{}%", term);
            query = query.filter(name_en.ilike(pattern.clone()).or(name_ar.ilike(pattern)));
        }
        if $search.active_only {
            query = query.filter(is_active.eq(true));
        }
        query
    }};
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CategoriesRepo for CategoriesRepoImpl<'a, T> {
    fn find(&self, id_arg: i32) -> RepoResult<Option<Category>> {
        debug!("Find in categories with id {}.", id_arg);
        categories
            .filter(id.eq(id_arg))
            .get_result::<Category>(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<Category>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::Categories, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find category by id: {} error occurred", id_arg)).into())
    }

    fn find_by_slug(&self, slug_arg: String) -> RepoResult<Option<Category>> {
        debug!("Find in categories with slug {}.", slug_arg);
        categories
            .filter(slug.eq(&slug_arg))
            .get_result::<Category>(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<Category>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::Categories, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find category by slug: {} error occurred", slug_arg)).into())
    }

    fn list(&self, search: CategoriesSearch, page: PageParams) -> RepoResult<(Vec<Category>, i64)> {
        debug!("List categories with search {:?} and page {:?}.", search, page);
        acl::check(&*self.acl, Resource::Categories, Action::Read, self, None)
            .and_then(|_| {
                let total = filter_categories!(categories.select(count_star()).into_boxed(), search).get_result::<i64>(self.db_conn)?;
                let items = filter_categories!(categories.into_boxed(), search)
                    .order((sort_order.asc(), id.asc()))
                    .limit(page.limit)
                    .offset(page.offset())
                    .get_results::<Category>(self.db_conn)?;
                Ok((items, total))
            }).map_err(|e: FailureError| e.context("List categories error occurred").into())
    }

    fn sort_scope(&self) -> RepoResult<Vec<(i32, i32)>> {
        debug!("Load sort scope of categories.");
        acl::check(&*self.acl, Resource::Categories, Action::Read, self, None)
            .and_then(|_| {
                categories
                    .select((id, sort_order))
                    .order((sort_order.asc(), id.asc()))
                    .get_results::<(i32, i32)>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context("Load categories sort scope error occurred").into())
    }

    fn max_sort_order(&self) -> RepoResult<Option<i32>> {
        debug!("Find max sort order of categories.");
        categories
            .select(max(sort_order))
            .get_result::<Option<i32>>(self.db_conn)
            .map_err(|e| e.context("Find max sort order of categories error occurred").into())
    }

    fn create(&self, payload: InsertCategory) -> RepoResult<Category> {
        debug!("Create new category {:?}.", payload);
        let query = diesel::insert_into(categories).values(&payload);
        query
            .get_result::<Category>(self.db_conn)
            .map_err(From::from)
            .and_then(|value| {
                acl::check(&*self.acl, Resource::Categories, Action::Create, self, Some(&value))?;
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Create new category: {:?} error occurred", payload)).into())
    }

    fn update(&self, id_arg: i32, payload: UpdateCategory) -> RepoResult<Category> {
        debug!("Updating category with id {} and payload {:?}.", id_arg, payload);
        let mut payload = payload;
        payload.updated_at = Some(Utc::now().naive_utc());

        categories
            .find(id_arg)
            .get_result::<Category>(self.db_conn)
            .map_err(From::from)
            .and_then(|value| acl::check(&*self.acl, Resource::Categories, Action::Update, self, Some(&value)))
            .and_then(|_| {
                let filtered = categories.filter(id.eq(id_arg));
                diesel::update(filtered)
                    .set(&payload)
                    .get_result::<Category>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| {
                e.context(format!("Updates specific category: id: {}, payload: {:?}, error occurred", id_arg, payload))
                    .into()
            })
    }

    fn set_sort_orders(&self, updates: &[SortOrderUpdate]) -> RepoResult<()> {
        debug!("Set sort orders of categories {:?}.", updates);
        acl::check(&*self.acl, Resource::Categories, Action::Update, self, None)
            .and_then(|_| {
                let now = Utc::now().naive_utc();
                for update in updates {
                    diesel::update(categories.filter(id.eq(update.id)))
                        .set((sort_order.eq(update.sort_order), updated_at.eq(now)))
                        .execute(self.db_conn)?;
                }
                Ok(())
            }).map_err(|e: FailureError| e.context("Set sort orders of categories error occurred").into())
    }

    fn delete(&self, id_arg: i32) -> RepoResult<Category> {
        debug!("Delete category with id {}.", id_arg);
        acl::check(&*self.acl, Resource::Categories, Action::Delete, self, None)
            .and_then(|_| {
                diesel::delete(categories.filter(id.eq(id_arg)))
                    .get_result::<Category>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Delete category: {} error occurred", id_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, Category>
    for CategoriesRepoImpl<'a, T>
{
    fn is_in_scope(&self, _user_id: i32, scope: &Scope, _obj: Option<&Category>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => false,
        }
    }
}
