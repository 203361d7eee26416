pub mod codec;
pub mod errors;
pub mod parameters;

pub use codec::KeyCodec;
pub use errors::KeyError;
pub use parameters::RsaKeyPair;
pub use parameters::RsaKeyParameters;
pub use parameters::RsaPrivateParameters;
