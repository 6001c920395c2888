//! Users Services, back-office accounts managed by administrators
use chrono::Utc;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use errors::Error;
use models::*;
use repos::ReposFactory;
use services::auth::hash_password;
use services::types::ServiceFuture;
use services::{require_admin, validate, Service};

pub trait UsersService {
    /// Returns one page of admin accounts
    fn list_users(&self, page: PageParams) -> ServiceFuture<Page<User>>;
    /// Returns admin account by ID
    fn get_user(&self, user_id: i32) -> ServiceFuture<User>;
    /// Creates admin account
    fn create_user(&self, payload: NewUser) -> ServiceFuture<User>;
    /// Updates admin account
    fn update_user(&self, user_id: i32, payload: UpdateUser) -> ServiceFuture<User>;
    /// Deletes admin account with its sessions
    fn delete_user(&self, user_id: i32) -> ServiceFuture<User>;
}

fn user_not_found(user_id: i32) -> FailureError {
    format_err!("User {} not found", user_id).context(Error::NotFound).into()
}

fn self_lockout(field: &'static str, message: &'static str) -> FailureError {
    format_err!("{}", message)
        .context(Error::Validate(validation_errors!({field: ["self" => message]})))
        .into()
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > UsersService for Service<T, M, F>
{
    fn list_users(&self, page: PageParams) -> ServiceFuture<Page<User>> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let users_repo = repo_factory.create_users_repo(&*conn, session);
            users_repo
                .list(page)
                .map(|(items, total)| Page::new(items, page, total))
                .map_err(|e: FailureError| e.context("Service users, list endpoint error occurred.").into())
        })
    }

    fn get_user(&self, user_id: i32) -> ServiceFuture<User> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let users_repo = repo_factory.create_users_repo(&*conn, session);
            users_repo
                .find(user_id)
                .and_then(|user| user.ok_or_else(|| user_not_found(user_id)))
                .map_err(|e: FailureError| e.context("Service users, get endpoint error occurred.").into())
        })
    }

    fn create_user(&self, payload: NewUser) -> ServiceFuture<User> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();
        let cost = self.static_context.config.session.bcrypt_cost;

        self.spawn_on_pool(move |conn| {
            let users_repo = repo_factory.create_users_repo(&*conn, session);
            conn.transaction::<User, FailureError, _>(move || {
                validate(&payload)?;
                let email = payload.email.trim().to_lowercase();
                if users_repo.find_by_login(payload.username.clone())?.is_some() {
                    return Err(format_err!("Username {} is taken", payload.username)
                        .context(Error::Validate(validation_errors!({"username": ["exists" => "Username already exists"]})))
                        .into());
                }
                if users_repo.find_by_login(email.clone())?.is_some() {
                    return Err(format_err!("Email {} is taken", email)
                        .context(Error::Validate(validation_errors!({"email": ["exists" => "Email already exists"]})))
                        .into());
                }
                let user = users_repo.create(InsertUser {
                    username: payload.username,
                    email,
                    password_hash: hash_password(&payload.password, cost)?,
                    role: payload.role,
                })?;
                info!("Admin account {} created with role {}", user.username, user.role);
                Ok(user)
            }).map_err(|e: FailureError| e.context("Service users, create endpoint error occurred.").into())
        })
    }

    fn update_user(&self, user_id: i32, payload: UpdateUser) -> ServiceFuture<User> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();
        let cost = self.static_context.config.session.bcrypt_cost;

        self.spawn_on_pool(move |conn| {
            let users_repo = repo_factory.create_users_repo(&*conn, session);
            let sessions_repo = repo_factory.create_sessions_repo_with_sys_acl(&*conn);
            conn.transaction::<User, FailureError, _>(move || {
                let (admin_id, _) = require_admin(session)?;
                validate(&payload)?;
                let current = users_repo.find(user_id)?.ok_or_else(|| user_not_found(user_id))?;
                if admin_id == user_id && payload.is_active == Some(false) {
                    return Err(self_lockout("isActive", "You can not deactivate your own account"));
                }
                let email = payload.email.map(|email| email.trim().to_lowercase());
                if let Some(ref email) = email {
                    if *email != current.email {
                        if users_repo.find_by_login(email.clone())?.is_some() {
                            return Err(format_err!("Email {} is taken", email)
                                .context(Error::Validate(validation_errors!({"email": ["exists" => "Email already exists"]})))
                                .into());
                        }
                    }
                }
                let password_hash = match payload.password {
                    Some(ref password) => Some(hash_password(password, cost)?),
                    None => None,
                };
                let user = users_repo.update(
                    user_id,
                    UserChangeset {
                        email,
                        password_hash,
                        role: payload.role,
                        is_active: payload.is_active,
                        updated_at: Some(Utc::now().naive_utc()),
                    },
                )?;
                if !user.is_active {
                    sessions_repo.delete_for_subject(SessionKind::Admin, user.id)?;
                }
                Ok(user)
            }).map_err(|e: FailureError| e.context("Service users, update endpoint error occurred.").into())
        })
    }

    fn delete_user(&self, user_id: i32) -> ServiceFuture<User> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let users_repo = repo_factory.create_users_repo(&*conn, session);
            let sessions_repo = repo_factory.create_sessions_repo_with_sys_acl(&*conn);
            conn.transaction::<User, FailureError, _>(move || {
                let (admin_id, _) = require_admin(session)?;
                if admin_id == user_id {
                    return Err(self_lockout("id", "You can not delete your own account"));
                }
                users_repo.find(user_id)?.ok_or_else(|| user_not_found(user_id))?;
                sessions_repo.delete_for_subject(SessionKind::Admin, user_id)?;
                let user = users_repo.delete(user_id)?;
                info!("Admin account {} deleted", user.username);
                Ok(user)
            }).map_err(|e: FailureError| e.context("Service users, delete endpoint error occurred.").into())
        })
    }
}

#[cfg(test)]
pub mod tests {
    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::users::UsersService;

    fn administrator() -> SessionContext {
        SessionContext::Admin {
            id: MOCK_ADMIN_ID,
            role: AdminRole::Administrator,
        }
    }

    fn staff() -> ReposFactoryMock {
        let factory = ReposFactoryMock::default();
        factory.with_store(|store| {
            store.users = vec![
                create_user(MOCK_ADMIN_ID, AdminRole::Administrator, "hash"),
                create_user(2, AdminRole::Moderator, "hash"),
            ]
        });
        factory
    }

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: MOCK_PASSWORD.to_string(),
            role: AdminRole::Moderator,
        }
    }

    #[test]
    fn test_create_user_hashes_password() {
        let mut core = Core::new().unwrap();
        let service = create_service_with_factory(administrator(), staff());
        let user = core.run(service.create_user(new_user("editor", "Editor@Example.com"))).unwrap();
        assert_eq!(user.email, "editor@example.com");
        assert_ne!(user.password_hash, MOCK_PASSWORD);
        assert!(user.password_hash.starts_with("$2"));
    }

    #[test]
    fn test_create_user_with_taken_username() {
        let mut core = Core::new().unwrap();
        let service = create_service_with_factory(administrator(), staff());
        let err = core.run(service.create_user(new_user("admin2", "other@example.com"))).unwrap_err();
        assert_eq!(invalid_fields(&err), vec!["username".to_string()]);
    }

    #[test]
    fn test_admin_can_not_deactivate_self() {
        let mut core = Core::new().unwrap();
        let service = create_service_with_factory(administrator(), staff());
        let payload = UpdateUser {
            is_active: Some(false),
            ..Default::default()
        };
        let err = core.run(service.update_user(MOCK_ADMIN_ID, payload)).unwrap_err();
        assert_eq!(error_code(&err), 400);
        assert_eq!(invalid_fields(&err), vec!["isActive".to_string()]);
    }

    #[test]
    fn test_admin_can_not_delete_self() {
        let mut core = Core::new().unwrap();
        let factory = staff();
        let service = create_service_with_factory(administrator(), factory.clone());
        let err = core.run(service.delete_user(MOCK_ADMIN_ID)).unwrap_err();
        assert_eq!(error_code(&err), 400);
        factory.with_store(|store| assert_eq!(store.users.len(), 2));
    }

    #[test]
    fn test_delete_user_drops_sessions() {
        let mut core = Core::new().unwrap();
        let factory = staff();
        factory.with_store(|store| {
            store.sessions = vec![Session {
                id: "moderator-token".to_string(),
                kind: SessionKind::Admin,
                subject_id: 2,
                expires_at: mock_timestamp(3600),
                created_at: mock_timestamp(0),
            }]
        });
        let service = create_service_with_factory(administrator(), factory.clone());
        let deleted = core.run(service.delete_user(2)).unwrap();
        assert_eq!(deleted.role, AdminRole::Moderator);
        factory.with_store(|store| {
            assert!(store.sessions.is_empty());
            assert_eq!(store.users.len(), 1);
        });
    }

    #[test]
    fn test_get_unknown_user() {
        let mut core = Core::new().unwrap();
        let service = create_service_with_factory(administrator(), staff());
        let err = core.run(service.get_user(99)).unwrap_err();
        assert_eq!(error_code(&err), 404);
    }
}
