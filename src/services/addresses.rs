//! Addresses Services, saved delivery addresses of the logged in website user
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
use services::{require_customer, validate, Service};

pub trait AddressesService {
    /// Returns addresses of the current user, default first
    fn list_addresses(&self) -> ServiceFuture<Vec<Address>>;
    /// Saves new address. The first address always becomes default.
    fn create_address(&self, payload: NewAddress) -> ServiceFuture<Address>;
    /// Updates address of the current user
    fn update_address(&self, address_id: i32, payload: UpdateAddress) -> ServiceFuture<Address>;
    /// Deletes address, promoting another one if the default was removed
    fn delete_address(&self, address_id: i32) -> ServiceFuture<Address>;
    /// Makes address the only default one
    fn set_default_address(&self, address_id: i32) -> ServiceFuture<Address>;
}

fn address_not_found(address_id: i32) -> FailureError {
    format_err!("Address {} not found", address_id).context(Error::NotFound).into()
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > AddressesService for Service<T, M, F>
{
    fn list_addresses(&self) -> ServiceFuture<Vec<Address>> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let addresses_repo = repo_factory.create_addresses_repo(&*conn, session);
            require_customer(session)
                .and_then(|user_id| addresses_repo.list_for_user(user_id))
                .map_err(|e: FailureError| e.context("Service addresses, list endpoint error occurred.").into())
        })
    }

    fn create_address(&self, payload: NewAddress) -> ServiceFuture<Address> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let addresses_repo = repo_factory.create_addresses_repo(&*conn, session);
            conn.transaction::<Address, FailureError, _>(move || {
                let user_id = require_customer(session)?;
                validate(&payload)?;
                let is_first = addresses_repo.list_for_user(user_id)?.is_empty();
                let is_default = is_first || payload.is_default;
                if is_default {
                    addresses_repo.clear_default(user_id, None)?;
                }
                addresses_repo.create(InsertAddress::new(user_id, NewAddress { is_default, ..payload }))
            }).map_err(|e: FailureError| e.context("Service addresses, create endpoint error occurred.").into())
        })
    }

    fn update_address(&self, address_id: i32, payload: UpdateAddress) -> ServiceFuture<Address> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let addresses_repo = repo_factory.create_addresses_repo(&*conn, session);
            conn.transaction::<Address, FailureError, _>(move || {
                let user_id = require_customer(session)?;
                validate(&payload)?;
                let current = addresses_repo
                    .find_for_user(user_id, address_id)?
                    .ok_or_else(|| address_not_found(address_id))?;
                // the only address stays default
                let payload = if payload.is_default == Some(false) && current.is_default {
                    UpdateAddress {
                        is_default: None,
                        ..payload
                    }
                } else {
                    payload
                };
                if payload.is_default == Some(true) {
                    addresses_repo.clear_default(user_id, Some(address_id))?;
                }
                addresses_repo.update(
                    address_id,
                    UpdateAddress {
                        updated_at: Some(Utc::now().naive_utc()),
                        ..payload
                    },
                )
            }).map_err(|e: FailureError| e.context("Service addresses, update endpoint error occurred.").into())
        })
    }

    fn delete_address(&self, address_id: i32) -> ServiceFuture<Address> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let addresses_repo = repo_factory.create_addresses_repo(&*conn, session);
            conn.transaction::<Address, FailureError, _>(move || {
                let user_id = require_customer(session)?;
                addresses_repo
                    .find_for_user(user_id, address_id)?
                    .ok_or_else(|| address_not_found(address_id))?;
                let deleted = addresses_repo.delete(address_id)?;
                if deleted.is_default {
                    if let Some(next) = addresses_repo.list_for_user(user_id)?.into_iter().next() {
                        debug!("Address {} becomes default for website user {}", next.id, user_id);
                        addresses_repo.update(
                            next.id,
                            UpdateAddress {
                                is_default: Some(true),
                                updated_at: Some(Utc::now().naive_utc()),
                                ..Default::default()
                            },
                        )?;
                    }
                }
                Ok(deleted)
            }).map_err(|e: FailureError| e.context("Service addresses, delete endpoint error occurred.").into())
        })
    }

    fn set_default_address(&self, address_id: i32) -> ServiceFuture<Address> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let addresses_repo = repo_factory.create_addresses_repo(&*conn, session);
            conn.transaction::<Address, FailureError, _>(move || {
                let user_id = require_customer(session)?;
                addresses_repo
                    .find_for_user(user_id, address_id)?
                    .ok_or_else(|| address_not_found(address_id))?;
                addresses_repo.clear_default(user_id, Some(address_id))?;
                addresses_repo.update(
                    address_id,
                    UpdateAddress {
                        is_default: Some(true),
                        updated_at: Some(Utc::now().naive_utc()),
                        ..Default::default()
                    },
                )
            }).map_err(|e: FailureError| e.context("Service addresses, set_default endpoint error occurred.").into())
        })
    }
}

#[cfg(test)]
pub mod tests {
    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::addresses::AddressesService;

    fn customer() -> SessionContext {
        SessionContext::Customer { id: MOCK_CUSTOMER_ID }
    }

    fn new_address(is_default: bool) -> NewAddress {
        NewAddress {
            title: Some("Office".to_string()),
            first_name: "Sara".to_string(),
            last_name: "Ahmed".to_string(),
            phone: "55598765".to_string(),
            address: "Tower 3, Floor 9, Office 12".to_string(),
            city: "Kuwait City".to_string(),
            area: "Sharq".to_string(),
            is_default,
        }
    }

    fn defaults(factory: &ReposFactoryMock) -> Vec<i32> {
        factory.with_store(|store| {
            store
                .addresses
                .iter()
                .filter(|a| a.user_id == MOCK_CUSTOMER_ID && a.is_default)
                .map(|a| a.id)
                .collect()
        })
    }

    #[test]
    fn test_first_address_becomes_default() {
        let mut core = Core::new().unwrap();
        let service = create_service(customer());
        let address = core.run(service.create_address(new_address(false))).unwrap();
        assert!(address.is_default);
        assert_eq!(address.user_id, MOCK_CUSTOMER_ID);
    }

    #[test]
    fn test_new_default_address_replaces_old_one() {
        let mut core = Core::new().unwrap();
        let factory = ReposFactoryMock::default();
        factory.with_store(|store| store.addresses = vec![create_address(1, MOCK_CUSTOMER_ID, true)]);
        let service = create_service_with_factory(customer(), factory.clone());
        let address = core.run(service.create_address(new_address(true))).unwrap();
        assert_eq!(defaults(&factory), vec![address.id]);
    }

    #[test]
    fn test_second_address_is_not_default() {
        let mut core = Core::new().unwrap();
        let factory = ReposFactoryMock::default();
        factory.with_store(|store| store.addresses = vec![create_address(1, MOCK_CUSTOMER_ID, true)]);
        let service = create_service_with_factory(customer(), factory.clone());
        let address = core.run(service.create_address(new_address(false))).unwrap();
        assert!(!address.is_default);
        assert_eq!(defaults(&factory), vec![1]);
    }

    #[test]
    fn test_list_addresses_requires_login() {
        let mut core = Core::new().unwrap();
        let service = create_service(SessionContext::Guest);
        let err = core.run(service.list_addresses()).unwrap_err();
        assert_eq!(error_code(&err), 401);
    }

    #[test]
    fn test_update_foreign_address_is_not_found() {
        let mut core = Core::new().unwrap();
        let factory = ReposFactoryMock::default();
        factory.with_store(|store| store.addresses = vec![create_address(7, 2, true)]);
        let service = create_service_with_factory(customer(), factory);
        let payload = UpdateAddress {
            area: Some("Hawally".to_string()),
            ..Default::default()
        };
        let err = core.run(service.update_address(7, payload)).unwrap_err();
        assert_eq!(error_code(&err), 404);
    }

    #[test]
    fn test_update_with_short_phone() {
        let mut core = Core::new().unwrap();
        let factory = ReposFactoryMock::default();
        factory.with_store(|store| store.addresses = vec![create_address(1, MOCK_CUSTOMER_ID, true)]);
        let service = create_service_with_factory(customer(), factory);
        let payload = UpdateAddress {
            phone: Some("1234".to_string()),
            ..Default::default()
        };
        let err = core.run(service.update_address(1, payload)).unwrap_err();
        assert_eq!(invalid_fields(&err), vec!["phone".to_string()]);
    }

    #[test]
    fn test_deleting_default_promotes_next() {
        let mut core = Core::new().unwrap();
        let factory = ReposFactoryMock::default();
        factory.with_store(|store| {
            store.addresses = vec![
                create_address(1, MOCK_CUSTOMER_ID, true),
                create_address(2, MOCK_CUSTOMER_ID, false),
                create_address(3, MOCK_CUSTOMER_ID, false),
            ]
        });
        let service = create_service_with_factory(customer(), factory.clone());
        let deleted = core.run(service.delete_address(1)).unwrap();
        assert!(deleted.is_default);
        assert_eq!(defaults(&factory), vec![3]);
    }

    #[test]
    fn test_set_default_keeps_single_default() {
        let mut core = Core::new().unwrap();
        let factory = ReposFactoryMock::default();
        factory.with_store(|store| {
            store.addresses = vec![create_address(1, MOCK_CUSTOMER_ID, true), create_address(2, MOCK_CUSTOMER_ID, false)]
        });
        let service = create_service_with_factory(customer(), factory.clone());
        let address = core.run(service.set_default_address(2)).unwrap();
        assert!(address.is_default);
        assert_eq!(defaults(&factory), vec![2]);
    }
}
