pub mod codec;

pub use codec::decode;
pub use codec::encode;
pub use codec::UmiCodecError;
