//! Semantic movie recommendations over a review catalog
//!
//! Movie descriptions are embedded through an external provider and stored
//! next to each movie. A free-text prompt is matched to the closest stored
//! embedding, with a keyword search fallback whenever semantic ranking is
//! unavailable.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
