//! Restaurant table reservations API - Library exports for testing
//!
//! (c) Softlandia 2025

pub mod api;
pub mod config;
pub mod container;
pub mod core;
pub mod infrastructure;
