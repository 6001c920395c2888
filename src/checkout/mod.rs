//! Client side checkout flow: the cart and the wizard driving order placement

pub mod cart;
pub mod wizard;

pub use self::cart::*;
pub use self::wizard::*;
