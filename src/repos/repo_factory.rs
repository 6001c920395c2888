use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;

use models::*;
use repos::legacy_acl::{Acl, SystemACL};
use repos::*;

pub trait ReposFactory<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static>: Clone + Send + 'static {
    fn create_categories_repo<'a>(&self, db_conn: &'a C, session: SessionContext) -> Box<CategoriesRepo + 'a>;
    fn create_products_repo<'a>(&self, db_conn: &'a C, session: SessionContext) -> Box<ProductsRepo + 'a>;
    fn create_orders_repo<'a>(&self, db_conn: &'a C, session: SessionContext) -> Box<OrdersRepo + 'a>;
    fn create_order_items_repo<'a>(&self, db_conn: &'a C, session: SessionContext) -> Box<OrderItemsRepo + 'a>;
    fn create_addresses_repo<'a>(&self, db_conn: &'a C, session: SessionContext) -> Box<AddressesRepo + 'a>;
    fn create_website_users_repo<'a>(&self, db_conn: &'a C, session: SessionContext) -> Box<WebsiteUsersRepo + 'a>;
    fn create_website_users_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<WebsiteUsersRepo + 'a>;
    fn create_users_repo<'a>(&self, db_conn: &'a C, session: SessionContext) -> Box<UsersRepo + 'a>;
    fn create_users_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<UsersRepo + 'a>;
    fn create_sessions_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<SessionsRepo + 'a>;
    fn create_content_blocks_repo<'a>(&self, db_conn: &'a C, session: SessionContext) -> Box<ContentBlocksRepo + 'a>;
}

#[derive(Clone, Default)]
pub struct ReposFactoryImpl;

impl ReposFactoryImpl {
    pub fn new() -> Self {
        ReposFactoryImpl
    }

    fn get_acl<T>(&self, session: SessionContext) -> Box<Acl<Resource, Action, Scope, FailureError, T>> {
        match session {
            SessionContext::Guest => Box::new(UnauthorizedAcl::default()) as Box<Acl<Resource, Action, Scope, FailureError, T>>,
            SessionContext::Customer { id } => {
                Box::new(ApplicationAcl::new(vec![Role::Customer], id)) as Box<Acl<Resource, Action, Scope, FailureError, T>>
            }
            SessionContext::Admin { id, role } => {
                Box::new(ApplicationAcl::new(vec![role.into()], id)) as Box<Acl<Resource, Action, Scope, FailureError, T>>
            }
        }
    }

    fn get_sys_acl<T>(&self) -> Box<Acl<Resource, Action, Scope, FailureError, T>> {
        Box::new(SystemACL::default()) as Box<Acl<Resource, Action, Scope, FailureError, T>>
    }
}

impl<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ReposFactory<C> for ReposFactoryImpl {
    fn create_categories_repo<'a>(&self, db_conn: &'a C, session: SessionContext) -> Box<CategoriesRepo + 'a> {
        Box::new(CategoriesRepoImpl::new(db_conn, self.get_acl(session))) as Box<CategoriesRepo>
    }
    fn create_products_repo<'a>(&self, db_conn: &'a C, session: SessionContext) -> Box<ProductsRepo + 'a> {
        Box::new(ProductsRepoImpl::new(db_conn, self.get_acl(session))) as Box<ProductsRepo>
    }
    fn create_orders_repo<'a>(&self, db_conn: &'a C, session: SessionContext) -> Box<OrdersRepo + 'a> {
        Box::new(OrdersRepoImpl::new(db_conn, self.get_acl(session))) as Box<OrdersRepo>
    }
    fn create_order_items_repo<'a>(&self, db_conn: &'a C, session: SessionContext) -> Box<OrderItemsRepo + 'a> {
        Box::new(OrderItemsRepoImpl::new(db_conn, self.get_acl(session))) as Box<OrderItemsRepo>
    }
    fn create_addresses_repo<'a>(&self, db_conn: &'a C, session: SessionContext) -> Box<AddressesRepo + 'a> {
        Box::new(AddressesRepoImpl::new(db_conn, self.get_acl(session))) as Box<AddressesRepo>
    }
    fn create_website_users_repo<'a>(&self, db_conn: &'a C, session: SessionContext) -> Box<WebsiteUsersRepo + 'a> {
        Box::new(WebsiteUsersRepoImpl::new(db_conn, self.get_acl(session))) as Box<WebsiteUsersRepo>
    }
    fn create_website_users_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<WebsiteUsersRepo + 'a> {
        Box::new(WebsiteUsersRepoImpl::new(db_conn, self.get_sys_acl())) as Box<WebsiteUsersRepo>
    }
    fn create_users_repo<'a>(&self, db_conn: &'a C, session: SessionContext) -> Box<UsersRepo + 'a> {
        Box::new(UsersRepoImpl::new(db_conn, self.get_acl(session))) as Box<UsersRepo>
    }
    fn create_users_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<UsersRepo + 'a> {
        Box::new(UsersRepoImpl::new(db_conn, self.get_sys_acl())) as Box<UsersRepo>
    }
    fn create_sessions_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<SessionsRepo + 'a> {
        Box::new(SessionsRepoImpl::new(db_conn, self.get_sys_acl())) as Box<SessionsRepo>
    }
    fn create_content_blocks_repo<'a>(&self, db_conn: &'a C, session: SessionContext) -> Box<ContentBlocksRepo + 'a> {
        Box::new(ContentBlocksRepoImpl::new(db_conn, self.get_acl(session))) as Box<ContentBlocksRepo>
    }
}
