//! Repos is a module responsible for interacting with access control lists
//! Authorization module contains authorization logic for the repo layer app

#[macro_use]
pub mod macros;
pub mod legacy_acl;

use std::collections::HashMap;
use std::rc::Rc;

use errors::Error;
use failure::Error as FailureError;

use self::legacy_acl::{Acl, CheckScope};

use models::authorization::*;

pub fn check<T>(
    acl: &Acl<Resource, Action, Scope, FailureError, T>,
    resource: Resource,
    action: Action,
    scope_checker: &CheckScope<Scope, T>,
    obj: Option<&T>,
) -> Result<(), FailureError> {
    acl.allows(resource, action, scope_checker, obj).and_then(|allowed| {
        if allowed {
            Ok(())
        } else {
            Err(format_err!("Denied request to do {:?} on {:?}", action, resource)
                .context(Error::Forbidden)
                .into())
        }
    })
}

/// ApplicationAcl contains main logic for manipulation with resources
#[derive(Clone)]
pub struct ApplicationAcl {
    acls: Rc<HashMap<Role, Vec<Permission>>>,
    roles: Vec<Role>,
    user_id: i32,
}

impl ApplicationAcl {
    pub fn new(roles: Vec<Role>, user_id: i32) -> Self {
        let mut hash = ::std::collections::HashMap::new();
        hash.insert(
            Role::Administrator,
            vec![
                permission!(Resource::Addresses),
                permission!(Resource::Categories),
                permission!(Resource::ContentBlocks),
                permission!(Resource::OrderItems),
                permission!(Resource::Orders),
                permission!(Resource::Products),
                permission!(Resource::Sessions),
                permission!(Resource::Uploads),
                permission!(Resource::Users),
                permission!(Resource::WebsiteUsers),
            ],
        );
        hash.insert(
            Role::Moderator,
            vec![
                permission!(Resource::Categories),
                permission!(Resource::Products),
                permission!(Resource::Uploads),
                permission!(Resource::ContentBlocks, Action::Read),
                permission!(Resource::Users, Action::Read, Scope::Owned),
                permission!(Resource::Sessions, Action::All, Scope::Owned),
            ],
        );
        hash.insert(
            Role::Customer,
            vec![
                permission!(Resource::Categories, Action::Read),
                permission!(Resource::Products, Action::Read),
                permission!(Resource::ContentBlocks, Action::Read),
                permission!(Resource::Orders, Action::Create),
                permission!(Resource::Orders, Action::Read, Scope::Owned),
                permission!(Resource::OrderItems, Action::Create),
                permission!(Resource::OrderItems, Action::Read),
                permission!(Resource::Addresses, Action::All, Scope::Owned),
                permission!(Resource::WebsiteUsers, Action::Read, Scope::Owned),
                permission!(Resource::WebsiteUsers, Action::Update, Scope::Owned),
                permission!(Resource::Sessions, Action::All, Scope::Owned),
            ],
        );

        ApplicationAcl {
            acls: Rc::new(hash),
            roles,
            user_id,
        }
    }
}

impl<T> Acl<Resource, Action, Scope, FailureError, T> for ApplicationAcl {
    fn allows(&self, resource: Resource, action: Action, scope_checker: &CheckScope<Scope, T>, obj: Option<&T>) -> Result<bool, FailureError> {
        let empty: Vec<Permission> = Vec::new();
        let user_id = self.user_id;
        let hashed_acls = self.acls.clone();
        let acls = self
            .roles
            .iter()
            .flat_map(|role| hashed_acls.get(role).unwrap_or(&empty))
            .filter(|permission| (permission.resource == resource) && ((permission.action == action) || (permission.action == Action::All)))
            .filter(|permission| scope_checker.is_in_scope(user_id, &permission.scope, obj));

        if acls.count() > 0 {
            Ok(true)
        } else {
            error!("Denied request from user {} to do {} on {}.", user_id, action, resource);
            Ok(false)
        }
    }
}

/// UnauthorizedAcl contains main logic for manipulation with resources
#[derive(Clone, Default)]
pub struct UnauthorizedAcl;

impl<T> Acl<Resource, Action, Scope, FailureError, T> for UnauthorizedAcl {
    fn allows(&self, resource: Resource, action: Action, _scope_checker: &CheckScope<Scope, T>, _obj: Option<&T>) -> Result<bool, FailureError> {
        match (action, resource) {
            (Action::Read, Resource::Categories) | (Action::Read, Resource::Products) | (Action::Read, Resource::ContentBlocks) => Ok(true),
            (Action::Create, Resource::Orders) | (Action::Create, Resource::OrderItems) | (Action::Create, Resource::WebsiteUsers) => Ok(true),
            _ => {
                error!("Denied unauthorized request to do {} on {}.", action, resource);
                Ok(false)
            }
        }
    }
}
