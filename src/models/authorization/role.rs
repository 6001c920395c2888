//! Roles a signed-in requester can act with
use std::fmt;

use models::AdminRole;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Role {
    Customer,
    Moderator,
    Administrator,
}

impl From<AdminRole> for Role {
    fn from(role: AdminRole) -> Self {
        match role {
            AdminRole::Administrator => Role::Administrator,
            AdminRole::Moderator => Role::Moderator,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Role::Customer => write!(f, "customer"),
            Role::Moderator => write!(f, "moderator"),
            Role::Administrator => write!(f, "administrator"),
        }
    }
}
