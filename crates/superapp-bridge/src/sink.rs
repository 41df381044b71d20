//! Host to guest delivery.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::envelope::GuestCallback;

/// Receives settlements destined for a guest page.
pub trait GuestSink: Send + Sync {
	/// Delivers one settlement.
	fn deliver(&self, callback: GuestCallback);
}

/// Renders settlements into scripts and hands them to a script injector
/// (typically the web view's `evaluate_script`).
pub struct ScriptSink {
	namespace: String,
	inject: Arc<dyn Fn(String) + Send + Sync>,
}

impl ScriptSink {
	/// Creates a sink rendering calls on `window.<namespace>`.
	pub fn new<F>(namespace: impl Into<String>, inject: F) -> Self
	where
		F: Fn(String) + Send + Sync + 'static,
	{
		Self {
			namespace: namespace.into(),
			inject: Arc::new(inject),
		}
	}
}

impl GuestSink for ScriptSink {
	fn deliver(&self, callback: GuestCallback) {
		let script = callback.to_script(&self.namespace);
		tracing::trace!(script = %script, "injecting settlement");
		(self.inject)(script);
	}
}

/// Forwards typed settlements over a channel, for in-process guests.
#[derive(Clone)]
pub struct ChannelSink {
	sender: mpsc::UnboundedSender<GuestCallback>,
}

impl ChannelSink {
	/// Creates a sink and the receiving end of its channel.
	pub fn new() -> (Self, mpsc::UnboundedReceiver<GuestCallback>) {
		let (sender, receiver) = mpsc::unbounded_channel();
		(Self { sender }, receiver)
	}
}

impl GuestSink for ChannelSink {
	fn deliver(&self, callback: GuestCallback) {
		if self.sender.send(callback).is_err() {
			tracing::debug!("guest channel closed; settlement dropped");
		}
	}
}
