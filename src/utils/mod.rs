pub mod crypto;
pub mod transcript;
