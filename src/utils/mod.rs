pub mod jwt;
pub mod money;
pub mod password;
pub mod phone;
pub mod signature;

pub use jwt::*;
pub use money::*;
pub use password::*;
pub use phone::*;
pub use signature::{SignatureRaster, decode_signature, decode_signature_png, encode_signature};
