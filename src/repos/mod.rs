//! Repos is a module responsible for interacting with postgres db

#[macro_use]
pub mod acl;
pub mod addresses;
pub mod categories;
pub mod content_blocks;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod repo_factory;
pub mod sessions;
pub mod types;
pub mod users;
pub mod website_users;

pub use self::acl::*;
pub use self::addresses::*;
pub use self::categories::*;
pub use self::content_blocks::*;
pub use self::order_items::*;
pub use self::orders::*;
pub use self::products::*;
pub use self::repo_factory::*;
pub use self::sessions::*;
pub use self::types::*;
pub use self::users::*;
pub use self::website_users::*;
