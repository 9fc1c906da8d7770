pub mod avatar;
pub mod common;
pub mod processing;
pub mod server;

pub use avatar::{AvatarError, AvatarProfile};
pub use processing::lsb::{decode, encode, CodecError, PixelBuffer};
