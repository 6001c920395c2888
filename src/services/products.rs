//! Products Services, presents CRUD operations with product

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use errors::Error;
use models::*;
use repos::{CategoriesRepo, ReposFactory};
use services::types::ServiceFuture;
use services::{validate, Service};

pub trait ProductsService {
    /// Returns one page of products ordered by `sort_order`
    fn list_products(&self, search: ProductsSearch, page: PageParams) -> ServiceFuture<Page<Product>>;
    /// Returns product by ID. With `public_only` hidden products are reported as missing
    fn get_product(&self, product_id: i32, public_only: bool) -> ServiceFuture<Product>;
    /// Creates new product at the end of its category
    fn create_product(&self, payload: NewProduct) -> ServiceFuture<Product>;
    /// Updates specific product
    fn update_product(&self, product_id: i32, payload: UpdateProduct) -> ServiceFuture<Product>;
    /// Moves product to the end of another category
    fn move_product(&self, product_id: i32, payload: MoveProduct) -> ServiceFuture<Product>;
    /// Deletes specific product
    fn delete_product(&self, product_id: i32) -> ServiceFuture<Product>;
    /// Swaps product position with its neighbour inside the category
    fn reorder_product(&self, product_id: i32, direction: Direction) -> ServiceFuture<ReorderResult>;
}

fn product_not_found(product_id: i32) -> FailureError {
    format_err!("Product {} not found", product_id).context(Error::NotFound).into()
}

fn ensure_category_exists(categories_repo: &CategoriesRepo, category_id: i32) -> Result<(), FailureError> {
    match categories_repo.find(category_id)? {
        Some(_) => Ok(()),
        None => Err(format_err!("Category {} does not exist", category_id)
            .context(Error::Validate(
                validation_errors!({"categoryId": ["category" => "Category does not exist"]}),
            )).into()),
    }
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > ProductsService for Service<T, M, F>
{
    fn list_products(&self, search: ProductsSearch, page: PageParams) -> ServiceFuture<Page<Product>> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let products_repo = repo_factory.create_products_repo(&*conn, session);
            products_repo
                .list(search, page)
                .map(|(items, total)| Page::new(items, page, total))
                .map_err(|e: FailureError| e.context("Service products, list endpoint error occurred.").into())
        })
    }

    fn get_product(&self, product_id: i32, public_only: bool) -> ServiceFuture<Product> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let products_repo = repo_factory.create_products_repo(&*conn, session);
            let categories_repo = repo_factory.create_categories_repo(&*conn, session);
            products_repo
                .find(product_id)
                .and_then(|product| product.ok_or_else(|| product_not_found(product_id)))
                .and_then(|product| {
                    if public_only {
                        let category_active = categories_repo
                            .find(product.category_id)?
                            .map(|category| category.is_active)
                            .unwrap_or(false);
                        if !product.is_active || !category_active {
                            return Err(product_not_found(product_id));
                        }
                    }
                    Ok(product)
                }).map_err(|e: FailureError| e.context("Service products, get endpoint error occurred.").into())
        })
    }

    fn create_product(&self, payload: NewProduct) -> ServiceFuture<Product> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let products_repo = repo_factory.create_products_repo(&*conn, session);
            let categories_repo = repo_factory.create_categories_repo(&*conn, session);
            conn.transaction::<Product, FailureError, _>(move || {
                validate(&payload)?;
                ensure_category_exists(&*categories_repo, payload.category_id)?;
                let sort_order = next_sort_order(products_repo.max_sort_order(payload.category_id)?);
                let product = products_repo.create(InsertProduct::new(payload, sort_order))?;
                info!(
                    "Product {} created in category {} with sort order {}",
                    product.id, product.category_id, product.sort_order
                );
                Ok(product)
            }).map_err(|e: FailureError| e.context("Service products, create endpoint error occurred.").into())
        })
    }

    fn update_product(&self, product_id: i32, payload: UpdateProduct) -> ServiceFuture<Product> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let products_repo = repo_factory.create_products_repo(&*conn, session);
            let categories_repo = repo_factory.create_categories_repo(&*conn, session);
            conn.transaction::<Product, FailureError, _>(move || {
                validate(&payload)?;
                let current = products_repo.find(product_id)?.ok_or_else(|| product_not_found(product_id))?;
                let mut payload = payload;
                if let Some(category_id) = payload.category_id {
                    if category_id != current.category_id {
                        ensure_category_exists(&*categories_repo, category_id)?;
                        if payload.sort_order.is_none() {
                            payload.sort_order = Some(next_sort_order(products_repo.max_sort_order(category_id)?));
                        }
                    }
                }
                products_repo.update(product_id, payload)
            }).map_err(|e: FailureError| e.context("Service products, update endpoint error occurred.").into())
        })
    }

    fn move_product(&self, product_id: i32, payload: MoveProduct) -> ServiceFuture<Product> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let products_repo = repo_factory.create_products_repo(&*conn, session);
            let categories_repo = repo_factory.create_categories_repo(&*conn, session);
            conn.transaction::<Product, FailureError, _>(move || {
                let current = products_repo.find(product_id)?.ok_or_else(|| product_not_found(product_id))?;
                if current.category_id == payload.category_id {
                    return Ok(current);
                }
                ensure_category_exists(&*categories_repo, payload.category_id)?;
                let sort_order = next_sort_order(products_repo.max_sort_order(payload.category_id)?);
                let changeset = UpdateProduct {
                    category_id: Some(payload.category_id),
                    sort_order: Some(sort_order),
                    ..Default::default()
                };
                let product = products_repo.update(product_id, changeset)?;
                info!(
                    "Product {} moved from category {} to {}",
                    product_id, current.category_id, product.category_id
                );
                Ok(product)
            }).map_err(|e: FailureError| e.context("Service products, move endpoint error occurred.").into())
        })
    }

    fn delete_product(&self, product_id: i32) -> ServiceFuture<Product> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let products_repo = repo_factory.create_products_repo(&*conn, session);
            products_repo
                .find(product_id)
                .and_then(|product| product.ok_or_else(|| product_not_found(product_id)))
                .and_then(|_| products_repo.delete(product_id))
                .map_err(|e: FailureError| e.context("Service products, delete endpoint error occurred.").into())
        })
    }

    fn reorder_product(&self, product_id: i32, direction: Direction) -> ServiceFuture<ReorderResult> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let products_repo = repo_factory.create_products_repo(&*conn, session);
            conn.transaction::<ReorderResult, FailureError, _>(move || {
                let product = products_repo.find(product_id)?.ok_or_else(|| product_not_found(product_id))?;
                let siblings = products_repo.sort_scope(product.category_id)?;
                let updates = plan_reorder(&siblings, product_id, direction).ok_or_else(|| product_not_found(product_id))?;
                products_repo.set_sort_orders(&updates)?;
                Ok(ReorderResult::new(updates))
            }).map_err(|e: FailureError| e.context("Service products, reorder endpoint error occurred.").into())
        })
    }
}

#[cfg(test)]
pub mod tests {
    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::products::ProductsService;

    fn admin() -> SessionContext {
        SessionContext::Admin {
            id: MOCK_ADMIN_ID,
            role: AdminRole::Administrator,
        }
    }

    /// Category 1 holds products 10..=23 (14 items), category 2 holds 30 and 31
    fn catalog() -> ReposFactoryMock {
        let factory = ReposFactoryMock::default();
        factory.with_store(|store| {
            store.categories = vec![create_category(1, 1), create_category(2, 2)];
            store.products = (0..14).map(|i| create_product(10 + i, 1, i + 1, "10")).collect();
            store.products.push(create_product(30, 2, 1, "5"));
            store.products.push(create_product(31, 2, 2, "5"));
        });
        factory
    }

    fn new_product(category_id: i32) -> NewProduct {
        NewProduct {
            name_en: "Ceramic coating".to_string(),
            name_ar: "طلاء سيراميك".to_string(),
            description_en: None,
            description_ar: None,
            price: "120.500".parse().unwrap(),
            category_id,
            image: None,
            stock: None,
            is_active: None,
            is_featured: Some(true),
            is_available: None,
            sort_order: None,
        }
    }

    #[test]
    fn test_second_page_of_products() {
        let mut core = Core::new().unwrap();
        let service = create_service_with_factory(SessionContext::Guest, catalog());
        let search = ProductsSearch {
            category_id: Some(1),
            public_only: true,
            ..Default::default()
        };
        let page = core.run(service.list_products(search, PageParams::new(Some(2), Some(12)))).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.pagination.total, 14);
        assert!(!page.pagination.has_next);
        assert!(page.pagination.has_prev);
    }

    #[test]
    fn test_public_listing_hides_products_of_inactive_categories() {
        let mut core = Core::new().unwrap();
        let factory = catalog();
        factory.with_store(|store| store.categories[1].is_active = false);
        let service = create_service_with_factory(SessionContext::Guest, factory);
        let search = ProductsSearch {
            public_only: true,
            ..Default::default()
        };
        let page = core.run(service.list_products(search, PageParams::new(None, Some(100)))).unwrap();
        assert_eq!(page.pagination.total, 14);
        assert!(page.items.iter().all(|p| p.category_id == 1));
    }

    #[test]
    fn test_create_product_in_missing_category() {
        let mut core = Core::new().unwrap();
        let service = create_service_with_factory(admin(), catalog());
        let err = core.run(service.create_product(new_product(99))).unwrap_err();
        assert_eq!(error_code(&err), 400);
        assert_eq!(invalid_fields(&err), vec!["categoryId".to_string()]);
    }

    #[test]
    fn test_create_product_appends_to_category() {
        let mut core = Core::new().unwrap();
        let service = create_service_with_factory(admin(), catalog());
        let product = core.run(service.create_product(new_product(2))).unwrap();
        assert_eq!(product.sort_order, 3);
        assert_eq!(product.stock, 0);
        assert!(product.is_featured);
    }

    #[test]
    fn test_create_product_with_negative_price() {
        let mut core = Core::new().unwrap();
        let service = create_service_with_factory(admin(), catalog());
        let mut payload = new_product(1);
        payload.price = "-1".parse().unwrap();
        let err = core.run(service.create_product(payload)).unwrap_err();
        assert_eq!(invalid_fields(&err), vec!["price".to_string()]);
    }

    #[test]
    fn test_reorder_product_swaps_inside_category_only() {
        let mut core = Core::new().unwrap();
        let factory = catalog();
        let service = create_service_with_factory(admin(), factory.clone());
        let result = core.run(service.reorder_product(11, Direction::Up)).unwrap();
        assert_eq!(
            result.items,
            vec![SortOrderUpdate { id: 10, sort_order: 2 }, SortOrderUpdate { id: 11, sort_order: 1 }]
        );
        factory.with_store(|store| {
            let other: Vec<i32> = store.products.iter().filter(|p| p.category_id == 2).map(|p| p.sort_order).collect();
            assert_eq!(other, vec![1, 2]);
        });
    }

    #[test]
    fn test_reorder_last_product_down_is_noop() {
        let mut core = Core::new().unwrap();
        let service = create_service_with_factory(admin(), catalog());
        let result = core.run(service.reorder_product(31, Direction::Down)).unwrap();
        assert!(!result.changed);
    }

    #[test]
    fn test_move_product_appends_to_destination() {
        let mut core = Core::new().unwrap();
        let service = create_service_with_factory(admin(), catalog());
        let product = core.run(service.move_product(10, MoveProduct { category_id: 2 })).unwrap();
        assert_eq!(product.category_id, 2);
        assert_eq!(product.sort_order, 3);
    }

    #[test]
    fn test_get_inactive_product_publicly_is_not_found() {
        let mut core = Core::new().unwrap();
        let factory = catalog();
        factory.with_store(|store| store.products[0].is_active = false);
        let service = create_service_with_factory(SessionContext::Guest, factory);
        let err = core.run(service.get_product(10, true)).unwrap_err();
        assert_eq!(error_code(&err), 404);
    }
}
