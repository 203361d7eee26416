pub mod identity;
pub mod service;

pub use identity::PostgresIdentityRepository;
pub use service::PostgresServiceRepository;
