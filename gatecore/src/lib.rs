pub mod assignment;
pub mod audit;
pub mod error;
pub mod idgen;
pub mod permission;
pub mod role;
pub mod snapshot;
pub mod traits;
pub mod workflow;

/// The free-form key/value record conditions are evaluated against;
/// also the business data carried by a workflow instance.
pub type Context = serde_json::Map<String, serde_json::Value>;

/// A source of unix timestamps in seconds.
pub type TsSource = std::sync::Arc<dyn Fn() -> i64 + Send + Sync>;

/// Returns the current unix timestamp in seconds.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
