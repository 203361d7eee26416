pub mod errors;
pub mod models;
pub mod service;

pub use errors::ProxyError;
pub use models::ProxyAdmission;
pub use service::ProxyGateway;
