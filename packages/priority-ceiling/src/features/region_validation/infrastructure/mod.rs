pub mod early_exit;
pub mod nesting;
pub mod protection;
pub mod region_validator;

pub use early_exit::*;
pub use nesting::*;
pub use protection::*;
pub use region_validator::*;
