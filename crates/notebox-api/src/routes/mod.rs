//! # Route Modules

pub mod health;
pub mod notes;
