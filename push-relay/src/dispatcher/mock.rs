//! Mock dispatcher for testing.
//!
//! Matches a fixed `(push type, package id)` pair, records calls, and returns
//! a configurable outcome.

use super::Dispatcher;
use crate::error::{PushError, PushResult};
use async_trait::async_trait;
use push_types::{DevicePushType, PushData, PushDestination};
use std::sync::{Arc, Mutex};

/// Mock dispatcher for testing.
///
/// Clones share state, so a test can keep a handle after boxing one copy
/// into a manager.
#[derive(Debug, Clone)]
pub struct MockDispatcher {
    name: String,
    push_type: DevicePushType,
    package_id: String,
    inner: Arc<Mutex<MockDispatcherInner>>,
}

#[derive(Debug, Default)]
struct MockDispatcherInner {
    dispatched: Vec<Vec<u8>>,
    fail_with: Option<String>,
}

impl MockDispatcher {
    /// Create a mock that accepts `package_id` for `push_type` and succeeds.
    pub fn new(name: &str, push_type: DevicePushType, package_id: &str) -> Self {
        Self {
            name: name.to_string(),
            push_type,
            package_id: package_id.to_string(),
            inner: Arc::new(Mutex::new(MockDispatcherInner::default())),
        }
    }

    /// Make every dispatch fail with a provider error carrying `reason`.
    pub fn failing(self, reason: &str) -> Self {
        self.inner.lock().unwrap().fail_with = Some(reason.to_string());
        self
    }

    /// Number of dispatch calls so far.
    pub fn calls(&self) -> usize {
        self.inner.lock().unwrap().dispatched.len()
    }

    /// Envelopes passed to dispatch, in call order.
    pub fn dispatched(&self) -> Vec<Vec<u8>> {
        self.inner.lock().unwrap().dispatched.clone()
    }

    /// Box a shared handle for a manager.
    pub fn boxed(&self) -> Box<dyn Dispatcher> {
        Box::new(self.clone())
    }
}

#[async_trait]
impl Dispatcher for MockDispatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn push_type(&self) -> DevicePushType {
        self.push_type
    }

    fn can_dispatch(&self, destination: &PushDestination) -> bool {
        if destination.push_type != self.push_type {
            return false;
        }
        match destination.native_identifier() {
            Ok(identifier) => identifier.package_id == self.package_id,
            Err(_) => false,
        }
    }

    async fn dispatch(&self, data: &PushData, _destination: &PushDestination) -> PushResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.dispatched.push(data.envelope.clone());

        match &inner.fail_with {
            Some(reason) => Err(PushError::provider(&self.name, reason)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_records_dispatches() {
        let mock = MockDispatcher::new("mock", DevicePushType::Fcm, "app");
        let dest = PushDestination::native(DevicePushType::Fcm, "app", "tok").unwrap();

        assert!(mock.can_dispatch(&dest));
        mock.dispatch(&PushData::new(vec![], b"one".to_vec()), &dest)
            .await
            .unwrap();

        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.dispatched(), vec![b"one".to_vec()]);
    }

    #[tokio::test]
    async fn failing_mock_returns_provider_error() {
        let mock = MockDispatcher::new("mock", DevicePushType::Apns, "app").failing("boom");
        let dest = PushDestination::native(DevicePushType::Apns, "app", "tok").unwrap();

        let err = mock
            .dispatch(&PushData::new(vec![], vec![]), &dest)
            .await
            .unwrap_err();
        assert_eq!(err, PushError::provider("mock", "boom"));
        assert_eq!(mock.calls(), 1);
    }

    #[test]
    fn mock_rejects_other_types_and_packages() {
        let mock = MockDispatcher::new("mock", DevicePushType::Apns, "app");
        let other_type = PushDestination::native(DevicePushType::Fcm, "app", "tok").unwrap();
        let other_pkg = PushDestination::native(DevicePushType::Apns, "other", "tok").unwrap();

        assert!(!mock.can_dispatch(&other_type));
        assert!(!mock.can_dispatch(&other_pkg));
    }
}
