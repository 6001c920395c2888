//! Models contains all structures that are used in different
//! modules of the app

pub mod address;
pub mod authorization;
pub mod category;
pub mod content_block;
pub mod money;
pub mod order;
pub mod order_item;
pub mod pagination;
pub mod product;
pub mod reorder;
pub mod session;
pub mod user;
pub mod validation_rules;
pub mod website_user;

pub use self::address::*;
pub use self::authorization::*;
pub use self::category::*;
pub use self::content_block::*;
pub use self::money::*;
pub use self::order::*;
pub use self::order_item::*;
pub use self::pagination::*;
pub use self::product::*;
pub use self::reorder::*;
pub use self::session::*;
pub use self::user::*;
pub use self::validation_rules::*;
pub use self::website_user::*;
