//! Notification collaborator seam.
//!
//! The lifecycle engine calls out to a notifier after each successful
//! transition. Delivery is best-effort: a notifier failure is logged and
//! never rolls back or blocks the already-committed transition. Actual
//! delivery channels (email, WhatsApp) live outside the core.

use crate::asset::Asset;
use crate::types::Condition;
use chrono::NaiveDate;
use tracing::warn;

/// Result of a delivery attempt.
pub type NotifyResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// A lifecycle event worth telling someone about.
#[derive(Debug)]
pub enum Notification<'a> {
    /// An asset was handed to a borrower.
    CheckedOut {
        /// The updated asset.
        asset: &'a Asset,
        /// Who took it.
        borrower: &'a str,
        /// Agreed return date, if any.
        expected_return: Option<NaiveDate>,
    },
    /// An asset came back.
    CheckedIn {
        /// The updated asset.
        asset: &'a Asset,
        /// Who returned it.
        borrower: &'a str,
        /// Condition reported at return.
        condition: Condition,
    },
    /// Several assets went out to one borrower at once.
    BulkCheckedOut {
        /// The updated assets.
        assets: &'a [Asset],
        /// Who took them.
        borrower: &'a str,
    },
}

/// Receives lifecycle notifications.
///
/// Implementations must not assume they can veto a transition: by the
/// time `send` runs, the state change is already persisted.
pub trait Notifier: Send + Sync {
    /// Delivers one notification.
    fn send(&self, notification: Notification<'_>) -> NotifyResult;
}

/// Discards all notifications.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn send(&self, _notification: Notification<'_>) -> NotifyResult {
        Ok(())
    }
}

/// Fire-and-forget dispatch: failures are logged, never propagated.
pub(crate) fn dispatch(notifier: &dyn Notifier, notification: Notification<'_>) {
    if let Err(e) = notifier.send(notification) {
        warn!(error = %e, "notification delivery failed");
    }
}
