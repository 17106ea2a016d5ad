pub mod schema;
pub mod solve;
pub mod validate;
