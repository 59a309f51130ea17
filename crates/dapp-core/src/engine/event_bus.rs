//! Notification bus for user-facing notices.
//!
//! Handlers and the session watcher publish [`Notice`]s here; the front end
//! subscribes and renders them. Publishing never blocks and never fails the
//! operation that produced the notice.

use dapp_types::Notice;
use tokio::sync::broadcast;

/// Broadcast bus carrying notices to every subscriber.
pub struct EventBus {
	sender: broadcast::Sender<Notice>,
}

impl EventBus {
	/// Creates a bus buffering up to `capacity` notices per subscriber.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Each subscriber receives notices published after it subscribed.
	pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
		self.sender.subscribe()
	}

	/// Publishes a notice to all current subscribers.
	///
	/// Returns an error if nobody is listening.
	pub fn publish(&self, notice: Notice) -> Result<(), broadcast::error::SendError<Notice>> {
		self.sender.send(notice)?;
		Ok(())
	}
}

impl Clone for EventBus {
	fn clone(&self) -> Self {
		Self {
			sender: self.sender.clone(),
		}
	}
}
