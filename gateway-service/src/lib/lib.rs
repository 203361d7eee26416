pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;

pub use domain::authorization;
pub use domain::catalog;
pub use domain::identity;
pub use domain::proxy;
pub use outbound::repositories;
