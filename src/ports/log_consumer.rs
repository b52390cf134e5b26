//! LogConsumer port - Interface for reading records from the shared log.

use async_trait::async_trait;
use std::time::Duration;

use super::BusError;
use crate::domain::foundation::Record;

/// Port for polling a consumer-group subscription.
///
/// Offsets are committed by the implementation on its own schedule
/// (auto-commit), so a restart may redeliver records that were fetched but
/// not fully processed.
#[async_trait]
pub trait LogConsumer: Send {
    /// Wait up to `timeout` for new records.
    ///
    /// Returns an empty batch when nothing arrived in time. An error means
    /// this poll failed; the caller may poll again.
    async fn poll(&mut self, timeout: Duration) -> Result<Vec<Record>, BusError>;

    /// Commit what has been consumed and release the connection.
    async fn close(&mut self) -> Result<(), BusError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn LogConsumer) {}

    #[test]
    fn boxed_consumer_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Box<dyn LogConsumer>>();
    }
}
