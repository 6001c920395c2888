//! Categories Services, presents CRUD operations with categories

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use errors::Error;
use models::*;
use repos::ReposFactory;
use services::types::ServiceFuture;
use services::{validate, Service};

pub trait CategoriesService {
    /// Returns one page of categories ordered by `sort_order`
    fn list_categories(&self, search: CategoriesSearch, page: PageParams) -> ServiceFuture<Page<Category>>;
    /// Returns category by ID together with its product count
    fn get_category(&self, category_id: i32, active_only: bool) -> ServiceFuture<CategoryWithCount>;
    /// Creates new category
    fn create_category(&self, payload: NewCategory) -> ServiceFuture<Category>;
    /// Updates specific category
    fn update_category(&self, category_id: i32, payload: UpdateCategory) -> ServiceFuture<Category>;
    /// Deletes category with all of its products
    fn delete_category(&self, category_id: i32) -> ServiceFuture<DeletedCategory>;
    /// Swaps category position with its neighbour
    fn reorder_category(&self, category_id: i32, direction: Direction) -> ServiceFuture<ReorderResult>;
}

fn slug_taken() -> FailureError {
    format_err!("Slug already exists")
        .context(Error::Validate(validation_errors!({"slug": ["slug" => "Slug already exists"]})))
        .into()
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > CategoriesService for Service<T, M, F>
{
    fn list_categories(&self, search: CategoriesSearch, page: PageParams) -> ServiceFuture<Page<Category>> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let categories_repo = repo_factory.create_categories_repo(&*conn, session);
            categories_repo
                .list(search, page)
                .map(|(items, total)| Page::new(items, page, total))
                .map_err(|e: FailureError| e.context("Service categories, list endpoint error occurred.").into())
        })
    }

    fn get_category(&self, category_id: i32, active_only: bool) -> ServiceFuture<CategoryWithCount> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let categories_repo = repo_factory.create_categories_repo(&*conn, session);
            let products_repo = repo_factory.create_products_repo(&*conn, session);
            categories_repo
                .find(category_id)
                .and_then(|category| {
                    category
                        .filter(|category| !active_only || category.is_active)
                        .ok_or_else(|| format_err!("Category {} not found", category_id).context(Error::NotFound).into())
                }).and_then(|category| {
                    let product_count = products_repo.count_by_category(category.id)?;
                    Ok(CategoryWithCount { category, product_count })
                }).map_err(|e: FailureError| e.context("Service categories, get endpoint error occurred.").into())
        })
    }

    fn create_category(&self, payload: NewCategory) -> ServiceFuture<Category> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let categories_repo = repo_factory.create_categories_repo(&*conn, session);
            conn.transaction::<Category, FailureError, _>(move || {
                validate(&payload)?;
                if categories_repo.find_by_slug(payload.slug.clone())?.is_some() {
                    return Err(slug_taken());
                }
                let sort_order = next_sort_order(categories_repo.max_sort_order()?);
                let category = categories_repo.create(InsertCategory::new(payload, sort_order))?;
                info!("Category {} created with sort order {}", category.id, category.sort_order);
                Ok(category)
            }).map_err(|e: FailureError| e.context("Service categories, create endpoint error occurred.").into())
        })
    }

    fn update_category(&self, category_id: i32, payload: UpdateCategory) -> ServiceFuture<Category> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let categories_repo = repo_factory.create_categories_repo(&*conn, session);
            conn.transaction::<Category, FailureError, _>(move || {
                validate(&payload)?;
                let current = categories_repo
                    .find(category_id)?
                    .ok_or_else(|| format_err!("Category {} not found", category_id).context(Error::NotFound))?;
                if let Some(ref slug) = payload.slug {
                    if *slug != current.slug {
                        if categories_repo.find_by_slug(slug.clone())?.is_some() {
                            return Err(slug_taken());
                        }
                    }
                }
                categories_repo.update(category_id, payload)
            }).map_err(|e: FailureError| e.context("Service categories, update endpoint error occurred.").into())
        })
    }

    fn delete_category(&self, category_id: i32) -> ServiceFuture<DeletedCategory> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let categories_repo = repo_factory.create_categories_repo(&*conn, session);
            let products_repo = repo_factory.create_products_repo(&*conn, session);
            conn.transaction::<DeletedCategory, FailureError, _>(move || {
                categories_repo
                    .find(category_id)?
                    .ok_or_else(|| format_err!("Category {} not found", category_id).context(Error::NotFound))?;
                let deleted_products = products_repo.delete_by_category(category_id)?;
                categories_repo.delete(category_id)?;
                info!("Category {} deleted with {} products", category_id, deleted_products);
                Ok(DeletedCategory {
                    id: category_id,
                    deleted_products,
                })
            }).map_err(|e: FailureError| e.context("Service categories, delete endpoint error occurred.").into())
        })
    }

    fn reorder_category(&self, category_id: i32, direction: Direction) -> ServiceFuture<ReorderResult> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let categories_repo = repo_factory.create_categories_repo(&*conn, session);
            conn.transaction::<ReorderResult, FailureError, _>(move || {
                let siblings = categories_repo.sort_scope()?;
                let updates = plan_reorder(&siblings, category_id, direction)
                    .ok_or_else(|| format_err!("Category {} not found", category_id).context(Error::NotFound))?;
                categories_repo.set_sort_orders(&updates)?;
                Ok(ReorderResult::new(updates))
            }).map_err(|e: FailureError| e.context("Service categories, reorder endpoint error occurred.").into())
        })
    }
}

#[cfg(test)]
pub mod tests {
    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::categories::CategoriesService;

    fn admin() -> SessionContext {
        SessionContext::Admin {
            id: MOCK_ADMIN_ID,
            role: AdminRole::Moderator,
        }
    }

    fn seeded_factory() -> ReposFactoryMock {
        let factory = ReposFactoryMock::default();
        factory.with_store(|store| {
            store.categories = vec![create_category(1, 1), create_category(2, 2), create_category(3, 3)];
            store.products = vec![create_product(10, 1, 1, "10"), create_product(11, 1, 2, "5.5"), create_product(12, 2, 1, "7")];
        });
        factory
    }

    fn new_category(slug: &str) -> NewCategory {
        NewCategory {
            name_en: "Paint protection".to_string(),
            name_ar: "حماية الطلاء".to_string(),
            description_en: None,
            description_ar: None,
            slug: slug.to_string(),
            image: None,
            is_active: None,
            sort_order: None,
        }
    }

    #[test]
    fn test_create_category_goes_last() {
        let mut core = Core::new().unwrap();
        let service = create_service_with_factory(admin(), seeded_factory());
        let work = service.create_category(new_category("paint-protection"));
        let result = core.run(work).unwrap();
        assert_eq!(result.sort_order, 4);
        assert!(result.is_active);
    }

    #[test]
    fn test_create_category_with_taken_slug() {
        let mut core = Core::new().unwrap();
        let service = create_service_with_factory(admin(), seeded_factory());
        let work = service.create_category(new_category("category-2"));
        let err = core.run(work).unwrap_err();
        assert_eq!(error_code(&err), 400);
        assert_eq!(invalid_fields(&err), vec!["slug".to_string()]);
    }

    #[test]
    fn test_create_category_with_invalid_slug() {
        let mut core = Core::new().unwrap();
        let service = create_service(admin());
        let work = service.create_category(new_category("Not A Slug"));
        let err = core.run(work).unwrap_err();
        assert_eq!(invalid_fields(&err), vec!["slug".to_string()]);
    }

    #[test]
    fn test_delete_category_cascades_products() {
        let mut core = Core::new().unwrap();
        let factory = seeded_factory();
        let service = create_service_with_factory(admin(), factory.clone());
        let result = core.run(service.delete_category(1)).unwrap();
        assert_eq!(result.deleted_products, 2);
        factory.with_store(|store| {
            assert_eq!(store.products.iter().filter(|p| p.category_id == 1).count(), 0);
            assert_eq!(store.products.len(), 1);
            assert!(store.categories.iter().all(|c| c.id != 1));
        });
    }

    #[test]
    fn test_get_category_reports_product_count() {
        let mut core = Core::new().unwrap();
        let service = create_service_with_factory(admin(), seeded_factory());
        let result = core.run(service.get_category(1, false)).unwrap();
        assert_eq!(result.product_count, 2);
    }

    #[test]
    fn test_get_inactive_category_publicly_is_not_found() {
        let mut core = Core::new().unwrap();
        let factory = seeded_factory();
        factory.with_store(|store| store.categories[0].is_active = false);
        let service = create_service_with_factory(SessionContext::Guest, factory);
        let err = core.run(service.get_category(1, true)).unwrap_err();
        assert_eq!(error_code(&err), 404);
    }

    #[test]
    fn test_reorder_category_swaps_with_previous() {
        let mut core = Core::new().unwrap();
        let factory = seeded_factory();
        let service = create_service_with_factory(admin(), factory.clone());
        let result = core.run(service.reorder_category(2, Direction::Up)).unwrap();
        assert!(result.changed);
        factory.with_store(|store| {
            let orders: Vec<(i32, i32)> = store.categories.iter().map(|c| (c.id, c.sort_order)).collect();
            assert_eq!(orders, vec![(1, 2), (2, 1), (3, 3)]);
        });
    }

    #[test]
    fn test_reorder_first_category_up_is_noop() {
        let mut core = Core::new().unwrap();
        let service = create_service_with_factory(admin(), seeded_factory());
        let result = core.run(service.reorder_category(1, Direction::Up)).unwrap();
        assert!(!result.changed);
        assert!(result.items.is_empty());
    }

    #[test]
    fn test_reorder_unknown_category() {
        let mut core = Core::new().unwrap();
        let service = create_service_with_factory(admin(), seeded_factory());
        let err = core.run(service.reorder_category(42, Direction::Down)).unwrap_err();
        assert_eq!(error_code(&err), 404);
    }
}
