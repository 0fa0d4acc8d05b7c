pub mod ceiling_calculator;

pub use ceiling_calculator::*;
