//! SeaORM entities for the gateway's tables.

pub mod boost;
pub mod post;
pub mod uploaded_file;
