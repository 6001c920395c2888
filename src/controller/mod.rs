//! `Controller` is a top layer that handles all http-related
//! stuff like reading bodies, parsing params, forming a response.
//! Basically it provides inputs to `Service` layer and converts outputs
//! of `Service` layer to http responses

pub mod context;
pub mod routes;
pub mod upload;

use std::collections::HashMap;
use std::sync::Arc;

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use futures::future;
use futures::Future;
use hyper::header::Headers;
use hyper::server::Request;
use hyper::Method::{Delete, Get, Patch, Post, Put};
use hyper::{Body, StatusCode};
use r2d2::ManageConnection;
use serde::Serialize;

use self::context::{DynamicContext, StaticContext};
use self::routes::{create_route_parser, Route};
use errors::Error;
use http::request_util::{cookie_value, expired_cookie, parse_body, query_param, query_params, read_body, session_cookie};
use http::router::RouteParser;
use http::{Controller, ControllerFuture, Reply};
use models::*;
use repos::repo_factory::*;
use services::*;

pub const CUSTOMER_COOKIE: &str = "sf_session";
pub const ADMIN_COOKIE: &str = "sf_admin_session";

/// Limit for JSON request bodies
pub const JSON_BODY_LIMIT: usize = 1024 * 1024;
/// Room for multipart framing on top of the configured file size
const MULTIPART_OVERHEAD: usize = 64 * 1024;

macro_rules! serialize_future {
    ($e:expr) => {
        Box::new($e.and_then(|resp| Reply::json(&resp)))
    };
}

/// Controller handles route parsing and calling `Service` layer
pub struct ControllerImpl<T, M, F>
where
    T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
    M: ManageConnection<Connection = T>,
    F: ReposFactory<T>,
{
    pub static_context: StaticContext<T, M, F>,
    pub route_parser: Arc<RouteParser<Route>>,
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > ControllerImpl<T, M, F>
{
    /// Create a new controller based on services
    pub fn new(static_context: StaticContext<T, M, F>) -> Self {
        let route_parser = Arc::new(create_route_parser());
        Self {
            static_context,
            route_parser,
        }
    }
}

/// Parsed parts of an incoming request
struct RequestParts {
    method: ::hyper::Method,
    route: Option<Route>,
    query: HashMap<String, String>,
    headers: Headers,
    body: Body,
    token: Option<String>,
}

fn page_params(query: &HashMap<String, String>) -> Result<PageParams, FailureError> {
    Ok(PageParams::new(query_param(query, "page")?, query_param(query, "limit")?))
}

fn trimmed_search(query: &HashMap<String, String>) -> Result<Option<String>, FailureError> {
    query_param::<String>(query, "search").map(|search| {
        search
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty())
    })
}

fn logged_in_reply<U: Serialize>(logged_in: &LoggedIn<U>, cookie_name: &str, ttl_hours: i64, secure: bool) -> Result<Reply, FailureError> {
    Reply::json(logged_in).map(|reply| reply.with_cookie(session_cookie(cookie_name, &logged_in.token, ttl_hours * 3600, secure)))
}

fn route_not_found() -> ControllerFuture {
    Box::new(future::err(format_err!("Route not found").context(Error::NotFound).into()))
}

macro_rules! try_future {
    ($e:expr) => {
        match $e {
            Ok(value) => value,
            Err(e) => return Box::new(future::err(e)),
        }
    };
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > ControllerImpl<T, M, F>
{
    fn route_request(static_context: StaticContext<T, M, F>, session: SessionContext, parts: RequestParts) -> ControllerFuture {
        let RequestParts {
            method,
            route,
            query,
            headers,
            body,
            token,
        } = parts;

        let route = match route {
            Some(route) => route,
            None => return route_not_found(),
        };

        if route.is_admin() && !route.is_public_admin() && session.admin_id().is_none() {
            return Box::new(future::err(
                format_err!("Admin session required for {:?}", route)
                    .context(Error::Unauthorized)
                    .into(),
            ));
        }

        let ttl_hours = static_context.config.session.ttl_hours;
        let secure = static_context.config.session.secure_cookies;
        let upload_limit = static_context.config.uploads.max_size_bytes + MULTIPART_OVERHEAD;
        let service = Service::new(static_context, DynamicContext::new(session));

        match (method, route) {
            // GET /healthcheck
            (Get, Route::Healthcheck) => serialize_future!(service.healthcheck()),

            // GET /api/categories
            (Get, Route::Categories) => {
                let search = CategoriesSearch {
                    search: try_future!(trimmed_search(&query)),
                    active_only: true,
                };
                let page = try_future!(page_params(&query));
                serialize_future!(service.list_categories(search, page))
            }

            // GET /api/categories/<category_id>
            (Get, Route::Category(category_id)) => serialize_future!(service.get_category(category_id, true)),

            // GET /api/products
            (Get, Route::Products) => {
                let search = ProductsSearch {
                    search: try_future!(trimmed_search(&query)),
                    category_id: try_future!(query_param(&query, "categoryId")),
                    featured: try_future!(query_param(&query, "featured")),
                    public_only: true,
                };
                let page = try_future!(page_params(&query));
                serialize_future!(service.list_products(search, page))
            }

            // GET /api/products/<product_id>
            (Get, Route::Product(product_id)) => serialize_future!(service.get_product(product_id, true)),

            // POST /api/orders
            (Post, Route::Orders) => serialize_future!(
                parse_body::<CreateOrderRequest>(body, JSON_BODY_LIMIT).and_then(move |payload| service.create_order(payload))
            ),

            // GET /api/my-orders
            (Get, Route::MyOrders) => serialize_future!(service.list_my_orders()),

            // GET /api/addresses
            (Get, Route::Addresses) => serialize_future!(service.list_addresses()),

            // POST /api/addresses
            (Post, Route::Addresses) => serialize_future!(
                parse_body::<NewAddress>(body, JSON_BODY_LIMIT).and_then(move |payload| service.create_address(payload))
            ),

            // PUT /api/addresses/<address_id>
            (Put, Route::Address(address_id)) => serialize_future!(
                parse_body::<UpdateAddress>(body, JSON_BODY_LIMIT).and_then(move |payload| service.update_address(address_id, payload))
            ),

            // DELETE /api/addresses/<address_id>
            (Delete, Route::Address(address_id)) => serialize_future!(service.delete_address(address_id)),

            // POST /api/addresses/<address_id>/set-default
            (Post, Route::AddressSetDefault(address_id)) => serialize_future!(service.set_default_address(address_id)),

            // POST /api/auth/register
            (Post, Route::AuthRegister) => Box::new(
                parse_body::<NewWebsiteUser>(body, JSON_BODY_LIMIT)
                    .and_then(move |payload| service.register(payload))
                    .and_then(move |logged_in| logged_in_reply(&logged_in, CUSTOMER_COOKIE, ttl_hours, secure))
                    .map(|reply| reply.with_status(StatusCode::Created)),
            ),

            // POST /api/auth/login
            (Post, Route::AuthLogin) => Box::new(
                parse_body::<LoginPayload>(body, JSON_BODY_LIMIT)
                    .and_then(move |payload| service.login(payload))
                    .and_then(move |logged_in| logged_in_reply(&logged_in, CUSTOMER_COOKIE, ttl_hours, secure)),
            ),

            // POST /api/auth/logout
            (Post, Route::AuthLogout) => Box::new(
                service
                    .logout(SessionKind::Customer, token)
                    .and_then(|_| Reply::json(&json!({"success": true})))
                    .map(|reply| reply.with_cookie(expired_cookie(CUSTOMER_COOKIE))),
            ),

            // GET /api/auth/me
            (Get, Route::AuthMe) => serialize_future!(service.me()),

            // GET /api/content/<section>
            (Get, Route::Content(section)) => serialize_future!(service.get_content(section)),

            // POST /api/upload/image
            (Post, Route::UploadImage) => serialize_future!(
                read_body(body, upload_limit)
                    .and_then(move |bytes| upload::extract_image(&headers, bytes))
                    .and_then(move |image| service.upload_image(image))
            ),

            // POST /api/admin/auth/login
            (Post, Route::AdminAuthLogin) => Box::new(
                parse_body::<LoginPayload>(body, JSON_BODY_LIMIT)
                    .and_then(move |payload| service.admin_login(payload))
                    .and_then(move |logged_in| logged_in_reply(&logged_in, ADMIN_COOKIE, ttl_hours, secure)),
            ),

            // POST /api/admin/auth/logout
            (Post, Route::AdminAuthLogout) => Box::new(
                service
                    .logout(SessionKind::Admin, token)
                    .and_then(|_| Reply::json(&json!({"success": true})))
                    .map(|reply| reply.with_cookie(expired_cookie(ADMIN_COOKIE))),
            ),

            // GET /api/admin/auth/me
            (Get, Route::AdminAuthMe) => serialize_future!(service.admin_me()),

            // GET /api/admin/categories
            (Get, Route::AdminCategories) => {
                let search = CategoriesSearch {
                    search: try_future!(trimmed_search(&query)),
                    active_only: false,
                };
                let page = try_future!(page_params(&query));
                serialize_future!(service.list_categories(search, page))
            }

            // POST /api/admin/categories
            (Post, Route::AdminCategories) => Box::new(
                parse_body::<NewCategory>(body, JSON_BODY_LIMIT)
                    .and_then(move |payload| service.create_category(payload))
                    .and_then(|category| Reply::json(&category))
                    .map(|reply| reply.with_status(StatusCode::Created)),
            ),

            // GET /api/admin/categories/<category_id>
            (Get, Route::AdminCategory(category_id)) => serialize_future!(service.get_category(category_id, false)),

            // PUT /api/admin/categories/<category_id>
            (Put, Route::AdminCategory(category_id)) => serialize_future!(
                parse_body::<UpdateCategory>(body, JSON_BODY_LIMIT).and_then(move |payload| service.update_category(category_id, payload))
            ),

            // DELETE /api/admin/categories/<category_id>
            (Delete, Route::AdminCategory(category_id)) => serialize_future!(service.delete_category(category_id)),

            // PATCH /api/admin/categories/<category_id>/reorder
            (Patch, Route::AdminCategoryReorder(category_id)) | (Post, Route::AdminCategoryReorder(category_id)) => serialize_future!(
                parse_body::<ReorderPayload>(body, JSON_BODY_LIMIT)
                    .and_then(move |payload| service.reorder_category(category_id, payload.direction))
            ),

            // GET /api/admin/products
            (Get, Route::AdminProducts) => {
                let search = ProductsSearch {
                    search: try_future!(trimmed_search(&query)),
                    category_id: try_future!(query_param(&query, "categoryId")),
                    featured: try_future!(query_param(&query, "featured")),
                    public_only: false,
                };
                let page = try_future!(page_params(&query));
                serialize_future!(service.list_products(search, page))
            }

            // POST /api/admin/products
            (Post, Route::AdminProducts) => Box::new(
                parse_body::<NewProduct>(body, JSON_BODY_LIMIT)
                    .and_then(move |payload| service.create_product(payload))
                    .and_then(|product| Reply::json(&product))
                    .map(|reply| reply.with_status(StatusCode::Created)),
            ),

            // GET /api/admin/products/<product_id>
            (Get, Route::AdminProduct(product_id)) => serialize_future!(service.get_product(product_id, false)),

            // PUT /api/admin/products/<product_id>
            (Put, Route::AdminProduct(product_id)) => serialize_future!(
                parse_body::<UpdateProduct>(body, JSON_BODY_LIMIT).and_then(move |payload| service.update_product(product_id, payload))
            ),

            // DELETE /api/admin/products/<product_id>
            (Delete, Route::AdminProduct(product_id)) => serialize_future!(service.delete_product(product_id)),

            // PATCH /api/admin/products/<product_id>/reorder
            (Patch, Route::AdminProductReorder(product_id)) | (Post, Route::AdminProductReorder(product_id)) => serialize_future!(
                parse_body::<ReorderPayload>(body, JSON_BODY_LIMIT)
                    .and_then(move |payload| service.reorder_product(product_id, payload.direction))
            ),

            // PATCH /api/admin/products/<product_id>/move
            (Patch, Route::AdminProductMove(product_id)) => serialize_future!(
                parse_body::<MoveProduct>(body, JSON_BODY_LIMIT).and_then(move |payload| service.move_product(product_id, payload))
            ),

            // GET /api/admin/orders
            (Get, Route::AdminOrders) => {
                let search = OrdersSearch {
                    status: try_future!(query_param(&query, "status")),
                    website_user_id: try_future!(query_param(&query, "websiteUserId")),
                };
                let page = try_future!(page_params(&query));
                serialize_future!(service.list_orders(search, page))
            }

            // GET /api/admin/orders/<order_id>
            (Get, Route::AdminOrder(order_id)) => serialize_future!(service.get_order(order_id)),

            // PUT /api/admin/orders/<order_id>
            (Put, Route::AdminOrder(order_id)) => serialize_future!(
                parse_body::<UpdateOrder>(body, JSON_BODY_LIMIT).and_then(move |payload| service.update_order(order_id, payload))
            ),

            // DELETE /api/admin/orders/<order_id>
            (Delete, Route::AdminOrder(order_id)) => serialize_future!(service.delete_order(order_id)),

            // GET /api/admin/users
            (Get, Route::AdminUsers) => {
                let page = try_future!(page_params(&query));
                serialize_future!(service.list_users(page))
            }

            // POST /api/admin/users
            (Post, Route::AdminUsers) => Box::new(
                parse_body::<NewUser>(body, JSON_BODY_LIMIT)
                    .and_then(move |payload| service.create_user(payload))
                    .and_then(|user| Reply::json(&user))
                    .map(|reply| reply.with_status(StatusCode::Created)),
            ),

            // GET /api/admin/users/<user_id>
            (Get, Route::AdminUser(user_id)) => serialize_future!(service.get_user(user_id)),

            // PUT /api/admin/users/<user_id>
            (Put, Route::AdminUser(user_id)) => serialize_future!(
                parse_body::<UpdateUser>(body, JSON_BODY_LIMIT).and_then(move |payload| service.update_user(user_id, payload))
            ),

            // DELETE /api/admin/users/<user_id>
            (Delete, Route::AdminUser(user_id)) => serialize_future!(service.delete_user(user_id)),

            // GET /api/admin/website-users
            (Get, Route::AdminWebsiteUsers) => {
                let search = try_future!(trimmed_search(&query));
                let page = try_future!(page_params(&query));
                serialize_future!(service.list_website_users(search, page))
            }

            // GET /api/admin/website-users/<user_id>
            (Get, Route::AdminWebsiteUser(user_id)) => serialize_future!(service.get_website_user(user_id)),

            // PUT /api/admin/website-users/<user_id>
            (Put, Route::AdminWebsiteUser(user_id)) => serialize_future!(
                parse_body::<UpdateWebsiteUser>(body, JSON_BODY_LIMIT)
                    .and_then(move |payload| service.update_website_user(user_id, payload))
            ),

            // DELETE /api/admin/website-users/<user_id>
            (Delete, Route::AdminWebsiteUser(user_id)) => serialize_future!(service.delete_website_user(user_id)),

            // PUT /api/admin/content/<section>
            (Put, Route::AdminContent(section)) => serialize_future!(
                parse_body::<UpdateContent>(body, JSON_BODY_LIMIT).and_then(move |payload| service.update_content(section, payload))
            ),

            // Fallback
            (method, route) => Box::new(future::err(
                format_err!("No handler for {} {:?}", method, route)
                    .context(Error::NotFound)
                    .into(),
            )),
        }
    }
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > Controller for ControllerImpl<T, M, F>
{
    /// Handle a request and get future response
    fn call(&self, req: Request) -> ControllerFuture {
        let (method, uri, _, headers, body) = req.deconstruct();
        let route = self.route_parser.test(uri.path());
        let (kind, cookie_name) = match route {
            Some(ref route) if route.is_admin() => (SessionKind::Admin, ADMIN_COOKIE),
            _ => (SessionKind::Customer, CUSTOMER_COOKIE),
        };
        let token = cookie_value(&headers, cookie_name);
        let parts = RequestParts {
            method,
            route,
            query: query_params(uri.query()),
            headers,
            body,
            token: token.clone(),
        };

        let static_context = self.static_context.clone();
        let resolver = Service::new(static_context.clone(), DynamicContext::default());
        Box::new(
            resolver
                .resolve_session(kind, token)
                .and_then(move |session| Self::route_request(static_context, session, parts)),
        )
    }
}
