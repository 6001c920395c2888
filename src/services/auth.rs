//! Auth Services, password logins and cookie sessions for website users
//! and admins
use bcrypt;
use chrono::{Duration, NaiveDateTime, Utc};
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;
use uuid::Uuid;

use errors::Error;
use models::*;
use repos::{ReposFactory, SessionsRepo};
use services::types::ServiceFuture;
use services::{require_admin, require_customer, validate, Service};

/// Account together with the freshly issued session
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoggedIn<U> {
    pub user: U,
    #[serde(skip_serializing)]
    pub token: String,
    pub expires_at: NaiveDateTime,
}

pub trait AuthService {
    /// Creates website user account and logs it in
    fn register(&self, payload: NewWebsiteUser) -> ServiceFuture<LoggedIn<WebsiteUser>>;
    /// Logs website user in by email
    fn login(&self, payload: LoginPayload) -> ServiceFuture<LoggedIn<WebsiteUser>>;
    /// Logs admin in by username or email
    fn admin_login(&self, payload: LoginPayload) -> ServiceFuture<LoggedIn<User>>;
    /// Drops session, missing tokens are ignored
    fn logout(&self, kind: SessionKind, token: Option<String>) -> ServiceFuture<()>;
    /// Returns current website user
    fn me(&self) -> ServiceFuture<WebsiteUser>;
    /// Returns current admin
    fn admin_me(&self) -> ServiceFuture<User>;
    /// Turns a session cookie into `SessionContext`
    fn resolve_session(&self, kind: SessionKind, token: Option<String>) -> ServiceFuture<SessionContext>;
}

fn invalid_credentials() -> FailureError {
    format_err!("Invalid login or password").context(Error::Unauthorized).into()
}

fn check_password(password: &str, password_hash: &str) -> Result<(), FailureError> {
    match bcrypt::verify(password, password_hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(invalid_credentials()),
        Err(e) => Err(format_err!("Password check failed: {}", e).context(Error::Unauthorized).into()),
    }
}

fn account_disabled() -> FailureError {
    format_err!("Account is disabled").context(Error::Forbidden).into()
}

/// Hashes a password with the configured bcrypt cost
pub fn hash_password(password: &str, cost: u32) -> Result<String, FailureError> {
    bcrypt::hash(password, cost).map_err(|e| format_err!("Password hashing failed: {}", e))
}

fn start_session(sessions_repo: &SessionsRepo, kind: SessionKind, subject_id: i32, ttl_hours: i64) -> Result<Session, FailureError> {
    let expires_at = Utc::now().naive_utc() + Duration::hours(ttl_hours);
    let session = sessions_repo.create(NewSession {
        id: Uuid::new_v4().to_string(),
        kind,
        subject_id,
        expires_at,
    })?;
    info!("Started {} session for {}", kind, subject_id);
    Ok(session)
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > AuthService for Service<T, M, F>
{
    fn register(&self, payload: NewWebsiteUser) -> ServiceFuture<LoggedIn<WebsiteUser>> {
        let repo_factory = self.static_context.repo_factory.clone();
        let ttl_hours = self.static_context.config.session.ttl_hours;
        let cost = self.static_context.config.session.bcrypt_cost;

        self.spawn_on_pool(move |conn| {
            let website_users_repo = repo_factory.create_website_users_repo_with_sys_acl(&*conn);
            let sessions_repo = repo_factory.create_sessions_repo_with_sys_acl(&*conn);
            conn.transaction::<LoggedIn<WebsiteUser>, FailureError, _>(move || {
                validate(&payload)?;
                let email = payload.email.trim().to_lowercase();
                if website_users_repo.find_by_email(email.clone())?.is_some() {
                    return Err(format_err!("Email {} is already registered", email)
                        .context(Error::Validate(validation_errors!({"email": ["exists" => "Email already registered"]})))
                        .into());
                }
                let user = website_users_repo.create(InsertWebsiteUser {
                    first_name: payload.first_name.trim().to_string(),
                    last_name: payload.last_name.trim().to_string(),
                    email,
                    phone: payload.phone,
                    password_hash: hash_password(&payload.password, cost)?,
                })?;
                let session = start_session(&*sessions_repo, SessionKind::Customer, user.id, ttl_hours)?;
                Ok(LoggedIn {
                    user,
                    token: session.id,
                    expires_at: session.expires_at,
                })
            }).map_err(|e: FailureError| e.context("Service auth, register endpoint error occurred.").into())
        })
    }

    fn login(&self, payload: LoginPayload) -> ServiceFuture<LoggedIn<WebsiteUser>> {
        let repo_factory = self.static_context.repo_factory.clone();
        let ttl_hours = self.static_context.config.session.ttl_hours;

        self.spawn_on_pool(move |conn| {
            let website_users_repo = repo_factory.create_website_users_repo_with_sys_acl(&*conn);
            let sessions_repo = repo_factory.create_sessions_repo_with_sys_acl(&*conn);
            validate(&payload)
                .and_then(|_| website_users_repo.find_by_email(payload.login.trim().to_string()))
                .and_then(|user| user.ok_or_else(invalid_credentials))
                .and_then(|user| {
                    check_password(&payload.password, &user.password_hash)?;
                    if !user.is_active {
                        return Err(account_disabled());
                    }
                    let session = start_session(&*sessions_repo, SessionKind::Customer, user.id, ttl_hours)?;
                    Ok(LoggedIn {
                        user,
                        token: session.id,
                        expires_at: session.expires_at,
                    })
                }).map_err(|e: FailureError| e.context("Service auth, login endpoint error occurred.").into())
        })
    }

    fn admin_login(&self, payload: LoginPayload) -> ServiceFuture<LoggedIn<User>> {
        let repo_factory = self.static_context.repo_factory.clone();
        let ttl_hours = self.static_context.config.session.ttl_hours;

        self.spawn_on_pool(move |conn| {
            let users_repo = repo_factory.create_users_repo_with_sys_acl(&*conn);
            let sessions_repo = repo_factory.create_sessions_repo_with_sys_acl(&*conn);
            validate(&payload)
                .and_then(|_| users_repo.find_by_login(payload.login.trim().to_string()))
                .and_then(|user| user.ok_or_else(invalid_credentials))
                .and_then(|user| {
                    check_password(&payload.password, &user.password_hash)?;
                    if !user.is_active {
                        return Err(account_disabled());
                    }
                    let session = start_session(&*sessions_repo, SessionKind::Admin, user.id, ttl_hours)?;
                    Ok(LoggedIn {
                        user,
                        token: session.id,
                        expires_at: session.expires_at,
                    })
                }).map_err(|e: FailureError| e.context("Service auth, admin_login endpoint error occurred.").into())
        })
    }

    fn logout(&self, kind: SessionKind, token: Option<String>) -> ServiceFuture<()> {
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let sessions_repo = repo_factory.create_sessions_repo_with_sys_acl(&*conn);
            let result = match token {
                Some(token) => sessions_repo.find(token.clone(), kind).and_then(|session| match session {
                    Some(_) => sessions_repo.delete(token).map(|_| ()),
                    None => Ok(()),
                }),
                None => Ok(()),
            };
            result.map_err(|e: FailureError| e.context("Service auth, logout endpoint error occurred.").into())
        })
    }

    fn me(&self) -> ServiceFuture<WebsiteUser> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let website_users_repo = repo_factory.create_website_users_repo(&*conn, session);
            require_customer(session)
                .and_then(|user_id| website_users_repo.find(user_id))
                .and_then(|user| user.ok_or_else(|| format_err!("Website user not found").context(Error::Unauthorized).into()))
                .map_err(|e: FailureError| e.context("Service auth, me endpoint error occurred.").into())
        })
    }

    fn admin_me(&self) -> ServiceFuture<User> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let users_repo = repo_factory.create_users_repo(&*conn, session);
            require_admin(session)
                .and_then(|(user_id, _)| users_repo.find(user_id))
                .and_then(|user| user.ok_or_else(|| format_err!("Admin not found").context(Error::Unauthorized).into()))
                .map_err(|e: FailureError| e.context("Service auth, admin_me endpoint error occurred.").into())
        })
    }

    fn resolve_session(&self, kind: SessionKind, token: Option<String>) -> ServiceFuture<SessionContext> {
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let token = match token {
                Some(token) => token,
                None => return Ok(SessionContext::Guest),
            };
            let sessions_repo = repo_factory.create_sessions_repo_with_sys_acl(&*conn);
            let session = match sessions_repo.find(token.clone(), kind)? {
                Some(session) => session,
                None => return Ok(SessionContext::Guest),
            };
            if session.expires_at <= Utc::now().naive_utc() {
                debug!("Session of {} {} expired", kind, session.subject_id);
                sessions_repo.delete(token)?;
                return Ok(SessionContext::Guest);
            }
            let context = match kind {
                SessionKind::Customer => repo_factory
                    .create_website_users_repo_with_sys_acl(&*conn)
                    .find(session.subject_id)?
                    .filter(|user| user.is_active)
                    .map(|user| SessionContext::Customer { id: user.id }),
                SessionKind::Admin => repo_factory
                    .create_users_repo_with_sys_acl(&*conn)
                    .find(session.subject_id)?
                    .filter(|user| user.is_active)
                    .map(|user| SessionContext::Admin {
                        id: user.id,
                        role: user.role,
                    }),
            };
            Ok(context.unwrap_or_default())
        })
    }
}

#[cfg(test)]
pub mod tests {
    use chrono::{Duration, Utc};
    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::auth::*;

    fn hashed() -> String {
        hash_password(MOCK_PASSWORD, 4).unwrap()
    }

    fn login(login: &str, password: &str) -> LoginPayload {
        LoginPayload {
            login: login.to_string(),
            password: password.to_string(),
        }
    }

    fn registration(email: &str) -> NewWebsiteUser {
        NewWebsiteUser {
            first_name: "Sara".to_string(),
            last_name: "Ahmed".to_string(),
            email: email.to_string(),
            phone: "55512345".to_string(),
            password: MOCK_PASSWORD.to_string(),
        }
    }

    fn session(token: &str, kind: SessionKind, subject_id: i32, expires_in_hours: i64) -> Session {
        Session {
            id: token.to_string(),
            kind,
            subject_id,
            expires_at: Utc::now().naive_utc() + Duration::hours(expires_in_hours),
            created_at: mock_timestamp(0),
        }
    }

    #[test]
    fn test_register_starts_session() {
        let mut core = Core::new().unwrap();
        let factory = ReposFactoryMock::default();
        let service = create_service_with_factory(SessionContext::Guest, factory.clone());
        let logged_in = core.run(service.register(registration("Sara@Example.com"))).unwrap();
        assert_eq!(logged_in.user.email, "sara@example.com");
        factory.with_store(|store| {
            assert_eq!(store.sessions.len(), 1);
            assert_eq!(store.sessions[0].id, logged_in.token);
            assert_eq!(store.sessions[0].kind, SessionKind::Customer);
            assert_ne!(store.website_users[0].password_hash, MOCK_PASSWORD);
        });
    }

    #[test]
    fn test_register_with_taken_email() {
        let mut core = Core::new().unwrap();
        let factory = ReposFactoryMock::default();
        factory.with_store(|store| store.website_users = vec![create_website_user(1, "hash")]);
        let service = create_service_with_factory(SessionContext::Guest, factory);
        let err = core.run(service.register(registration("customer1@example.com"))).unwrap_err();
        assert_eq!(invalid_fields(&err), vec!["email".to_string()]);
    }

    #[test]
    fn test_login_with_wrong_password() {
        let mut core = Core::new().unwrap();
        let factory = ReposFactoryMock::default();
        factory.with_store(|store| store.website_users = vec![create_website_user(1, &hashed())]);
        let service = create_service_with_factory(SessionContext::Guest, factory);
        let err = core.run(service.login(login("customer1@example.com", "wrong-password"))).unwrap_err();
        assert_eq!(error_code(&err), 401);
    }

    #[test]
    fn test_login_of_disabled_account() {
        let mut core = Core::new().unwrap();
        let factory = ReposFactoryMock::default();
        factory.with_store(|store| {
            let mut user = create_website_user(1, &hashed());
            user.is_active = false;
            store.website_users = vec![user];
        });
        let service = create_service_with_factory(SessionContext::Guest, factory);
        let err = core.run(service.login(login("customer1@example.com", MOCK_PASSWORD))).unwrap_err();
        assert_eq!(error_code(&err), 403);
    }

    #[test]
    fn test_admin_login_by_username() {
        let mut core = Core::new().unwrap();
        let factory = ReposFactoryMock::default();
        factory.with_store(|store| store.users = vec![create_user(1, AdminRole::Moderator, &hashed())]);
        let service = create_service_with_factory(SessionContext::Guest, factory.clone());
        let logged_in = core.run(service.admin_login(login("admin1", MOCK_PASSWORD))).unwrap();
        assert_eq!(logged_in.user.role, AdminRole::Moderator);
        factory.with_store(|store| assert_eq!(store.sessions[0].kind, SessionKind::Admin));
    }

    #[test]
    fn test_resolve_admin_session() {
        let mut core = Core::new().unwrap();
        let factory = ReposFactoryMock::default();
        factory.with_store(|store| {
            store.users = vec![create_user(1, AdminRole::Administrator, "hash")];
            store.sessions = vec![session("admin-token", SessionKind::Admin, 1, 1)];
        });
        let service = create_service_with_factory(SessionContext::Guest, factory);
        let context = core
            .run(service.resolve_session(SessionKind::Admin, Some("admin-token".to_string())))
            .unwrap();
        assert_eq!(
            context,
            SessionContext::Admin {
                id: 1,
                role: AdminRole::Administrator
            }
        );
    }

    #[test]
    fn test_customer_token_is_not_an_admin_token() {
        let mut core = Core::new().unwrap();
        let factory = ReposFactoryMock::default();
        factory.with_store(|store| {
            store.users = vec![create_user(1, AdminRole::Administrator, "hash")];
            store.website_users = vec![create_website_user(1, "hash")];
            store.sessions = vec![session("customer-token", SessionKind::Customer, 1, 1)];
        });
        let service = create_service_with_factory(SessionContext::Guest, factory);
        let context = core
            .run(service.resolve_session(SessionKind::Admin, Some("customer-token".to_string())))
            .unwrap();
        assert_eq!(context, SessionContext::Guest);
    }

    #[test]
    fn test_expired_session_is_dropped() {
        let mut core = Core::new().unwrap();
        let factory = ReposFactoryMock::default();
        factory.with_store(|store| {
            store.website_users = vec![create_website_user(1, "hash")];
            store.sessions = vec![session("old-token", SessionKind::Customer, 1, -1)];
        });
        let service = create_service_with_factory(SessionContext::Guest, factory.clone());
        let context = core
            .run(service.resolve_session(SessionKind::Customer, Some("old-token".to_string())))
            .unwrap();
        assert_eq!(context, SessionContext::Guest);
        factory.with_store(|store| assert!(store.sessions.is_empty()));
    }

    #[test]
    fn test_logout_removes_session() {
        let mut core = Core::new().unwrap();
        let factory = ReposFactoryMock::default();
        factory.with_store(|store| store.sessions = vec![session("token", SessionKind::Customer, 1, 1)]);
        let service = create_service_with_factory(SessionContext::Customer { id: 1 }, factory.clone());
        core.run(service.logout(SessionKind::Customer, Some("token".to_string()))).unwrap();
        core.run(service.logout(SessionKind::Customer, None)).unwrap();
        factory.with_store(|store| assert!(store.sessions.is_empty()));
    }

    #[test]
    fn test_me_for_guest_is_unauthorized() {
        let mut core = Core::new().unwrap();
        let service = create_service(SessionContext::Guest);
        let err = core.run(service.me()).unwrap_err();
        assert_eq!(error_code(&err), 401);
    }
}
