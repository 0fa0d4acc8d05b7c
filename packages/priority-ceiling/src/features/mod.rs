pub mod access_collection;
pub mod ceiling;
pub mod context_model;
pub mod debug_guard;
pub mod emission;
pub mod reachability;
pub mod region_validation;
