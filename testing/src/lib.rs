pub mod chrono;
pub mod dispatch;

mod utils;
pub use utils::*;
