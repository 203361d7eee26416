pub mod models;
pub mod ports;
pub mod service;

pub use models::Authorization;
pub use service::AuthorizationEngine;
