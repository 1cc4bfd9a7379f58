use crate::domain::ports::Notifier;
use crate::error::NotifyError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

/// Notifier that writes the agreement email to the log instead of sending it.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        contact: &str,
        loan_id: &str,
        agreement_url: Option<&str>,
    ) -> Result<(), NotifyError> {
        info!(
            email = contact,
            loan_id,
            agreement_url = agreement_url.unwrap_or_default(),
            "sending agreement email"
        );
        Ok(())
    }
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub contact: String,
    pub loan_id: String,
    pub agreement_url: Option<String>,
}

/// In-memory outbox used by the test suites in place of a real mail sender.
///
/// Records every delivered notification in order. Delivery can be made to
/// fail for specific contacts to drive the failure path of the funding
/// transition. The server binary never wires it in; it uses [`LogNotifier`].
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every future delivery to `contact` fail.
    pub fn fail_for(&self, contact: impl Into<String>) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(contact.into());
    }

    /// Notifications delivered so far, in dispatch order.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        contact: &str,
        loan_id: &str,
        agreement_url: Option<&str>,
    ) -> Result<(), NotifyError> {
        let failing = self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(contact);
        if failing {
            return Err(NotifyError::Delivery {
                contact: contact.to_string(),
                reason: "mailbox unavailable".to_string(),
            });
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Notification {
                contact: contact.to_string(),
                loan_id: loan_id.to_string(),
                agreement_url: agreement_url.map(str::to_string),
            });
        Ok(())
    }
}
