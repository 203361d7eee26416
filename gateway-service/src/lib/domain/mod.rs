pub mod authorization;
pub mod catalog;
pub mod identity;
pub mod proxy;
