use tracing::info;

/// Collaborator for user-facing notifications. Delivery mechanics live
/// outside this crate; consumers hand over a message and nothing else.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Default notifier: messages go to the log.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        info!(%message, "notification");
    }
}
