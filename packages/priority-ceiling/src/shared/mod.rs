//! Shared models used by every analysis stage

pub mod models;
