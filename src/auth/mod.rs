pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

pub use error::*;
pub use handlers::*;
pub use middleware::*;
pub use models::*;
pub use password::*;
pub use repository::*;
pub use service::*;
pub use token::*;
