pub mod fields;
pub mod target;
pub mod ticket;
