//! WebsiteUsers Services, customer accounts as seen from the back office
use chrono::Utc;
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

pub trait WebsiteUsersService {
    /// Returns one page of customer accounts matching `search` by name or email
    fn list_website_users(&self, search: Option<String>, page: PageParams) -> ServiceFuture<Page<WebsiteUser>>;
    /// Returns customer account by ID
    fn get_website_user(&self, user_id: i32) -> ServiceFuture<WebsiteUser>;
    /// Updates customer account, deactivation ends its sessions
    fn update_website_user(&self, user_id: i32, payload: UpdateWebsiteUser) -> ServiceFuture<WebsiteUser>;
    /// Deletes customer account with its addresses and sessions, orders are kept
    fn delete_website_user(&self, user_id: i32) -> ServiceFuture<WebsiteUser>;
}

fn website_user_not_found(user_id: i32) -> FailureError {
    format_err!("Website user {} not found", user_id).context(Error::NotFound).into()
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > WebsiteUsersService for Service<T, M, F>
{
    fn list_website_users(&self, search: Option<String>, page: PageParams) -> ServiceFuture<Page<WebsiteUser>> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let website_users_repo = repo_factory.create_website_users_repo(&*conn, session);
            website_users_repo
                .list(search, page)
                .map(|(items, total)| Page::new(items, page, total))
                .map_err(|e: FailureError| e.context("Service website users, list endpoint error occurred.").into())
        })
    }

    fn get_website_user(&self, user_id: i32) -> ServiceFuture<WebsiteUser> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let website_users_repo = repo_factory.create_website_users_repo(&*conn, session);
            website_users_repo
                .find(user_id)
                .and_then(|user| user.ok_or_else(|| website_user_not_found(user_id)))
                .map_err(|e: FailureError| e.context("Service website users, get endpoint error occurred.").into())
        })
    }

    fn update_website_user(&self, user_id: i32, payload: UpdateWebsiteUser) -> ServiceFuture<WebsiteUser> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let website_users_repo = repo_factory.create_website_users_repo(&*conn, session);
            let sessions_repo = repo_factory.create_sessions_repo_with_sys_acl(&*conn);
            conn.transaction::<WebsiteUser, FailureError, _>(move || {
                validate(&payload)?;
                website_users_repo
                    .find(user_id)?
                    .ok_or_else(|| website_user_not_found(user_id))?;
                let user = website_users_repo.update(
                    user_id,
                    UpdateWebsiteUser {
                        updated_at: Some(Utc::now().naive_utc()),
                        ..payload
                    },
                )?;
                if !user.is_active {
                    let dropped = sessions_repo.delete_for_subject(SessionKind::Customer, user.id)?;
                    info!("Website user {} deactivated, {} sessions dropped", user.id, dropped);
                }
                Ok(user)
            }).map_err(|e: FailureError| e.context("Service website users, update endpoint error occurred.").into())
        })
    }

    fn delete_website_user(&self, user_id: i32) -> ServiceFuture<WebsiteUser> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let website_users_repo = repo_factory.create_website_users_repo(&*conn, session);
            let addresses_repo = repo_factory.create_addresses_repo(&*conn, session);
            let orders_repo = repo_factory.create_orders_repo(&*conn, session);
            let sessions_repo = repo_factory.create_sessions_repo_with_sys_acl(&*conn);
            conn.transaction::<WebsiteUser, FailureError, _>(move || {
                website_users_repo
                    .find(user_id)?
                    .ok_or_else(|| website_user_not_found(user_id))?;
                let addresses = addresses_repo.delete_for_user(user_id)?;
                let sessions = sessions_repo.delete_for_subject(SessionKind::Customer, user_id)?;
                let orders = orders_repo.detach_user(user_id)?;
                let user = website_users_repo.delete(user_id)?;
                info!(
                    "Website user {} deleted with {} addresses and {} sessions, {} orders detached",
                    user_id, addresses, sessions, orders
                );
                Ok(user)
            }).map_err(|e: FailureError| e.context("Service website users, delete endpoint error occurred.").into())
        })
    }
}

#[cfg(test)]
pub mod tests {
    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::orders::OrdersService;
    use services::website_users::WebsiteUsersService;

    fn administrator() -> SessionContext {
        SessionContext::Admin {
            id: MOCK_ADMIN_ID,
            role: AdminRole::Administrator,
        }
    }

    fn customers() -> ReposFactoryMock {
        let factory = ReposFactoryMock::default();
        factory.with_store(|store| {
            let mut second = create_website_user(2, "hash");
            second.first_name = "Omar".to_string();
            store.website_users = vec![create_website_user(1, "hash"), second];
            store.addresses = vec![create_address(1, 1, true), create_address(2, 2, true)];
            store.categories = vec![create_category(1, 1)];
            store.products = vec![create_product(10, 1, 1, "10")];
            store.sessions = vec![Session {
                id: "customer-token".to_string(),
                kind: SessionKind::Customer,
                subject_id: 1,
                expires_at: mock_timestamp(3600),
                created_at: mock_timestamp(0),
            }];
        });
        factory
    }

    #[test]
    fn test_search_by_name() {
        let mut core = Core::new().unwrap();
        let service = create_service_with_factory(administrator(), customers());
        let page = core
            .run(service.list_website_users(Some("omar".to_string()), PageParams::default()))
            .unwrap();
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.items[0].id, 2);
    }

    #[test]
    fn test_deactivation_drops_sessions() {
        let mut core = Core::new().unwrap();
        let factory = customers();
        let service = create_service_with_factory(administrator(), factory.clone());
        let payload = UpdateWebsiteUser {
            is_active: Some(false),
            ..Default::default()
        };
        let user = core.run(service.update_website_user(1, payload)).unwrap();
        assert!(!user.is_active);
        factory.with_store(|store| assert!(store.sessions.is_empty()));
    }

    #[test]
    fn test_delete_keeps_orders() {
        let mut core = Core::new().unwrap();
        let factory = customers();
        let customer = create_service_with_factory(SessionContext::Customer { id: 1 }, factory.clone());
        let mut payload = guest_order_request(vec![OrderItemRequest { product_id: 10, quantity: 1 }], "10");
        payload.selected_address_id = Some(1);
        let placed = core.run(customer.create_order(payload)).unwrap();

        let service = create_service_with_factory(administrator(), factory.clone());
        core.run(service.delete_website_user(1)).unwrap();
        factory.with_store(|store| {
            assert!(store.website_users.iter().all(|u| u.id != 1));
            assert!(store.addresses.iter().all(|a| a.user_id != 1));
            assert!(store.sessions.is_empty());
            let order = store.orders.iter().find(|o| o.id == placed.order_id).unwrap();
            assert_eq!(order.website_user_id, None);
        });
    }

    #[test]
    fn test_delete_unknown_website_user() {
        let mut core = Core::new().unwrap();
        let service = create_service_with_factory(administrator(), customers());
        let err = core.run(service.delete_website_user(77)).unwrap_err();
        assert_eq!(error_code(&err), 404);
    }
}
