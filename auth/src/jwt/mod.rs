pub mod claims;
pub mod errors;
pub mod handler;

pub use claims::TokenClaims;
pub use errors::JwtError;
pub use handler::ParsedToken;
pub use handler::TokenService;
