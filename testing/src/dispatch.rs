use gatecore::{
    error::DispatchError,
    traits::Dispatcher,
    workflow::WorkflowInstance,
};
use mockall::mock;
use serde_json::Value;

mock! {
    pub Dispatcher {}

    impl Dispatcher for Dispatcher {
        fn send_notification(
            &self,
            instance: &WorkflowInstance,
            target: &str,
            value: &Value,
        ) -> Result<(), DispatchError>;
        fn call_api(
            &self,
            instance: &WorkflowInstance,
            target: &str,
            value: &Value,
        ) -> Result<(), DispatchError>;
        fn create_record(
            &self,
            instance: &WorkflowInstance,
            target: &str,
            value: &Value,
        ) -> Result<(), DispatchError>;
    }
}
