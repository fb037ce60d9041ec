//! Session events broadcast to UI subscribers.

use tenancy_application::ports::SessionListener;
use tokio::sync::broadcast;

/// A session lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session could not be recovered; the UI should show its login screen.
    LoginRequired {
        /// Route to navigate to.
        redirect_to: String,
    },
}

/// `SessionListener` that fans events out over a broadcast channel.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    /// Creates a channel buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new(16)
    }
}

impl SessionListener for SessionEvents {
    fn login_required(&self, redirect_to: &str) {
        let event = SessionEvent::LoginRequired {
            redirect_to: redirect_to.to_string(),
        };
        if self.sender.send(event).is_err() {
            tracing::debug!(redirect_to, "login required but nobody is subscribed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_subscribers_receive_login_required() {
        let events = SessionEvents::default();
        let mut first = events.subscribe();
        let mut second = events.subscribe();

        events.login_required("/login");

        let expected = SessionEvent::LoginRequired {
            redirect_to: "/login".to_string(),
        };
        assert_eq!(first.recv().await.unwrap(), expected);
        assert_eq!(second.recv().await.unwrap(), expected);
    }

    #[test]
    fn test_send_without_subscribers_is_harmless() {
        SessionEvents::new(0).login_required("/login");
    }
}
