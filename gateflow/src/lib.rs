pub mod action;
pub mod builder;
pub mod error;
pub mod manager;
pub mod resolver;
pub mod seed;

pub use action::{
    ActionExecutor,
    ActionRegistry,
    LogDispatcher,
};
pub use builder::Builder;
pub use manager::WorkflowManager;
pub use resolver::DirectoryResolver;
