pub mod database;
pub mod jwt;
pub mod store;

pub use database::Database;
pub use jwt::{Claims, JwtService, TokenError};
