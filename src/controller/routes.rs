use http::router::RouteParser;

/// List of all routes with params for the app
#[derive(Clone, Debug, PartialEq)]
pub enum Route {
    Healthcheck,
    Categories,
    Category(i32),
    Products,
    Product(i32),
    Orders,
    MyOrders,
    Addresses,
    Address(i32),
    AddressSetDefault(i32),
    AuthRegister,
    AuthLogin,
    AuthLogout,
    AuthMe,
    Content(String),
    UploadImage,
    AdminAuthLogin,
    AdminAuthLogout,
    AdminAuthMe,
    AdminCategories,
    AdminCategory(i32),
    AdminCategoryReorder(i32),
    AdminProducts,
    AdminProduct(i32),
    AdminProductReorder(i32),
    AdminProductMove(i32),
    AdminOrders,
    AdminOrder(i32),
    AdminUsers,
    AdminUser(i32),
    AdminWebsiteUsers,
    AdminWebsiteUser(i32),
    AdminContent(String),
}

impl Route {
    /// Routes reading the admin session cookie
    pub fn is_admin(&self) -> bool {
        match *self {
            Route::AdminAuthLogin
            | Route::AdminAuthLogout
            | Route::AdminAuthMe
            | Route::AdminCategories
            | Route::AdminCategory(_)
            | Route::AdminCategoryReorder(_)
            | Route::AdminProducts
            | Route::AdminProduct(_)
            | Route::AdminProductReorder(_)
            | Route::AdminProductMove(_)
            | Route::AdminOrders
            | Route::AdminOrder(_)
            | Route::AdminUsers
            | Route::AdminUser(_)
            | Route::AdminWebsiteUsers
            | Route::AdminWebsiteUser(_)
            | Route::AdminContent(_)
            | Route::UploadImage => true,
            _ => false,
        }
    }

    /// Admin routes reachable without an admin session
    pub fn is_public_admin(&self) -> bool {
        match *self {
            Route::AdminAuthLogin | Route::AdminAuthLogout => true,
            _ => false,
        }
    }
}

fn id_param(params: &[&str]) -> Option<i32> {
    params.get(0).and_then(|string_id| string_id.parse::<i32>().ok())
}

pub fn create_route_parser() -> RouteParser<Route> {
    let mut router = RouteParser::default();

    // Healthcheck
    router.add_route(r"^/healthcheck$", || Route::Healthcheck);

    // Public catalog routes
    router.add_route(r"^/api/categories$", || Route::Categories);
    router.add_route_with_params(r"^/api/categories/(\d+)$", |params| id_param(&params).map(Route::Category));
    router.add_route(r"^/api/products$", || Route::Products);
    router.add_route_with_params(r"^/api/products/(\d+)$", |params| id_param(&params).map(Route::Product));

    // Orders routes
    router.add_route(r"^/api/orders$", || Route::Orders);
    router.add_route(r"^/api/my-orders$", || Route::MyOrders);

    // Addresses routes
    router.add_route(r"^/api/addresses$", || Route::Addresses);
    router.add_route_with_params(r"^/api/addresses/(\d+)$", |params| id_param(&params).map(Route::Address));
    router.add_route_with_params(r"^/api/addresses/(\d+)/set-default$", |params| {
        id_param(&params).map(Route::AddressSetDefault)
    });

    // Website users auth routes
    router.add_route(r"^/api/auth/register$", || Route::AuthRegister);
    router.add_route(r"^/api/auth/login$", || Route::AuthLogin);
    router.add_route(r"^/api/auth/logout$", || Route::AuthLogout);
    router.add_route(r"^/api/auth/me$", || Route::AuthMe);

    // Content routes
    router.add_route_with_params(r"^/api/content/([^/]+)$", |params| {
        params.get(0).map(|section| Route::Content(section.to_string()))
    });

    // Upload route
    router.add_route(r"^/api/upload/image$", || Route::UploadImage);

    // Admin auth routes
    router.add_route(r"^/api/admin/auth/login$", || Route::AdminAuthLogin);
    router.add_route(r"^/api/admin/auth/logout$", || Route::AdminAuthLogout);
    router.add_route(r"^/api/admin/auth/me$", || Route::AdminAuthMe);

    // Admin catalog routes
    router.add_route(r"^/api/admin/categories$", || Route::AdminCategories);
    router.add_route_with_params(r"^/api/admin/categories/(\d+)$", |params| id_param(&params).map(Route::AdminCategory));
    router.add_route_with_params(r"^/api/admin/categories/(\d+)/reorder$", |params| {
        id_param(&params).map(Route::AdminCategoryReorder)
    });
    router.add_route(r"^/api/admin/products$", || Route::AdminProducts);
    router.add_route_with_params(r"^/api/admin/products/(\d+)$", |params| id_param(&params).map(Route::AdminProduct));
    router.add_route_with_params(r"^/api/admin/products/(\d+)/reorder$", |params| {
        id_param(&params).map(Route::AdminProductReorder)
    });
    router.add_route_with_params(r"^/api/admin/products/(\d+)/move$", |params| id_param(&params).map(Route::AdminProductMove));

    // Admin management routes
    router.add_route(r"^/api/admin/orders$", || Route::AdminOrders);
    router.add_route_with_params(r"^/api/admin/orders/(\d+)$", |params| id_param(&params).map(Route::AdminOrder));
    router.add_route(r"^/api/admin/users$", || Route::AdminUsers);
    router.add_route_with_params(r"^/api/admin/users/(\d+)$", |params| id_param(&params).map(Route::AdminUser));
    router.add_route(r"^/api/admin/website-users$", || Route::AdminWebsiteUsers);
    router.add_route_with_params(r"^/api/admin/website-users/(\d+)$", |params| {
        id_param(&params).map(Route::AdminWebsiteUser)
    });
    router.add_route_with_params(r"^/api/admin/content/([^/]+)$", |params| {
        params.get(0).map(|section| Route::AdminContent(section.to_string()))
    });

    router
}
