pub mod attacks;
pub mod claims;
pub mod codec;
pub mod editor;
pub mod keys;
pub mod search;
pub mod signer;
