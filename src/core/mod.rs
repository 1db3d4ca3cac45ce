pub mod admission;
pub mod auth;
pub mod domain;
pub mod error;
pub mod services;
pub mod traits;
