pub mod constants;
pub mod crypto;
pub mod envelope;
pub mod records;
pub mod types;
pub mod verification;
