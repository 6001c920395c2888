//! Enum for resources available in ACLs
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Resource {
    Addresses,
    Categories,
    ContentBlocks,
    OrderItems,
    Orders,
    Products,
    Sessions,
    Uploads,
    Users,
    WebsiteUsers,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Resource::Addresses => write!(f, "addresses"),
            Resource::Categories => write!(f, "categories"),
            Resource::ContentBlocks => write!(f, "content blocks"),
            Resource::OrderItems => write!(f, "order items"),
            Resource::Orders => write!(f, "orders"),
            Resource::Products => write!(f, "products"),
            Resource::Sessions => write!(f, "sessions"),
            Resource::Uploads => write!(f, "uploads"),
            Resource::Users => write!(f, "users"),
            Resource::WebsiteUsers => write!(f, "website users"),
        }
    }
}
