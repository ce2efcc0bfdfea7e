//! Database entities.

pub mod connection;
pub mod user;

pub use connection::Entity as Connection;
pub use user::Entity as User;
