//! Shared configuration, errors, and auth types for the GL report service.
//!
//! - Application configuration (server, database, JWT)
//! - Application-wide error taxonomy
//! - JWT claims carrying the authenticated shop

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;

pub use auth::Claims;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
