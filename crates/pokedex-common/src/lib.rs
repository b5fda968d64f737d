pub mod catalog;
pub mod enrich;
pub mod error;
pub mod model;
