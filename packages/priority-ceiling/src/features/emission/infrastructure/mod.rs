pub mod c_renderer;
pub mod masking_simulator;
pub mod strategy_selector;

pub use c_renderer::*;
pub use masking_simulator::*;
pub use strategy_selector::*;
