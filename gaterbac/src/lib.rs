pub mod builder;
pub mod condition;
pub mod error;
pub mod manager;
pub mod seed;

pub use builder::Builder;
pub use condition::{
    Evaluator,
    RuleRegistry,
    Subject,
};
pub use manager::PermissionManager;
