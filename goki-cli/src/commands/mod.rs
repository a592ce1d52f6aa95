//! CLI command implementations

pub mod create;
pub mod delete;
pub mod node;
pub mod sql;
pub mod status;

pub use create::create;
pub use delete::delete;
pub use sql::sql;
pub use status::status;
