pub mod backend;
pub mod error;
pub mod platform;

pub use backend::JsonFileBackend;
pub use platform::Platform;
