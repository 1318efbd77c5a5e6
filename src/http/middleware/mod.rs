pub mod auth;

pub use auth::inbound_auth_middleware;
