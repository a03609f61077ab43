pub mod adf;
pub mod summary;
