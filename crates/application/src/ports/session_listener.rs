//! Session listener port

/// Receives session lifecycle notifications.
///
/// The UI implements this to navigate to its login screen.
pub trait SessionListener: Send + Sync {
    /// Called once per failed refresh, after the tokens have been cleared.
    fn login_required(&self, redirect_to: &str);
}

/// Listener that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSessionListener;

impl SessionListener for NoopSessionListener {
    fn login_required(&self, _redirect_to: &str) {}
}
