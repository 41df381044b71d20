//! Host-side request routing.
//!
//! The dispatcher decodes each raw channel message, looks up the handler of
//! its topic and runs it with a fresh [`BridgeContext`]. The handler is polled
//! inline until it first suspends, so every handler reaches its first await in
//! arrival order; only the remainder moves to its own task. Handlers complete in
//! any order and are correlated with their guest promise purely by request id.
//!
//! The dispatcher never answers on a handler's behalf: no auto-resolve, no
//! timeout, no retry. Malformed envelopes and unknown topics are logged and
//! dropped without a response.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::context::BridgeContext;
use crate::envelope::{BridgeEnvelope, RequestId};
use crate::error::{BridgeError, BridgeResult};
use crate::handlers;
use crate::screen::ScreenState;
use crate::topic::BridgeTopic;

/// Handles one topic.
///
/// Implementations settle the context themselves; failures become rejections.
#[async_trait]
pub trait BridgeHandler: Send + Sync {
	/// Handles one request.
	async fn handle(&self, data: Value, ctx: BridgeContext);
}

/// Adapts an async closure into a [`BridgeHandler`].
pub struct FnHandler<F>(F);

/// Wraps `f` as a handler.
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
	F: Fn(Value, BridgeContext) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = ()> + Send + 'static,
{
	FnHandler(f)
}

#[async_trait]
impl<F, Fut> BridgeHandler for FnHandler<F>
where
	F: Fn(Value, BridgeContext) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = ()> + Send + 'static,
{
	async fn handle(&self, data: Value, ctx: BridgeContext) {
		(self.0)(data, ctx).await
	}
}

/// Topic to handler table.
#[derive(Default)]
pub struct HandlerRegistry {
	handlers: HashMap<BridgeTopic, Arc<dyn BridgeHandler>>,
}

impl HandlerRegistry {
	/// An empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// A table with the built-in handler of every topic.
	pub fn with_defaults() -> Self {
		let mut registry = Self::new();
		handlers::register_defaults(&mut registry);
		registry
	}

	/// Registers the handler of `topic`.
	///
	/// # Errors
	///
	/// Returns [`BridgeError::DuplicateTopic`] if `topic` already has a handler.
	pub fn register<H>(&mut self, topic: BridgeTopic, handler: H) -> BridgeResult<()>
	where
		H: BridgeHandler + 'static,
	{
		if self.handlers.contains_key(&topic) {
			return Err(BridgeError::DuplicateTopic(topic.to_string()));
		}
		self.handlers.insert(topic, Arc::new(handler));
		Ok(())
	}

	/// Replaces the handler of `topic`, returning the previous one.
	pub fn replace<H>(&mut self, topic: BridgeTopic, handler: H) -> Option<Arc<dyn BridgeHandler>>
	where
		H: BridgeHandler + 'static,
	{
		self.handlers.insert(topic, Arc::new(handler))
	}

	pub(crate) fn replace_boxed(&mut self, topic: BridgeTopic, handler: Box<dyn BridgeHandler>) {
		self.handlers.insert(topic, Arc::from(handler));
	}

	/// The handler of `topic`.
	pub fn get(&self, topic: BridgeTopic) -> Option<Arc<dyn BridgeHandler>> {
		self.handlers.get(&topic).cloned()
	}

	/// Whether `topic` has a handler.
	pub fn contains(&self, topic: BridgeTopic) -> bool {
		self.handlers.contains_key(&topic)
	}

	/// Number of registered handlers.
	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	/// Whether no handler is registered.
	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}
}

/// Why a message produced no handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
	/// The raw message could not be decoded.
	Malformed(String),
	/// The topic is not part of the catalog.
	UnknownTopic(String),
	/// The topic is known but no handler is registered.
	NoHandler(BridgeTopic),
}

/// Result of dispatching one raw message.
#[derive(Debug)]
pub enum DispatchOutcome {
	/// A handler was started.
	Dispatched {
		/// Topic of the message.
		topic: BridgeTopic,
		/// Request id of the message.
		request_id: RequestId,
		/// The suspended remainder of the handler; `None` if it finished inline.
		task: Option<JoinHandle<()>>,
	},
	/// The message was dropped without a response.
	Dropped(DropReason),
}

impl DispatchOutcome {
	/// Waits for the handler, if one was started and did not finish inline.
	pub async fn join(self) {
		if let Self::Dispatched { task: Some(task), topic, .. } = self {
			if let Err(e) = task.await {
				tracing::error!(topic = %topic, "bridge handler task failed: {}", e);
			}
		}
	}

	/// Whether the message was dropped.
	pub fn is_dropped(&self) -> bool {
		matches!(self, Self::Dropped(_))
	}
}

/// Routes guest messages to handlers.
#[derive(Clone)]
pub struct HostDispatcher {
	handlers: Arc<HandlerRegistry>,
}

impl Default for HostDispatcher {
	fn default() -> Self {
		Self::new(HandlerRegistry::with_defaults())
	}
}

impl HostDispatcher {
	/// Creates a dispatcher over `handlers`.
	pub fn new(handlers: HandlerRegistry) -> Self {
		Self {
			handlers: Arc::new(handlers),
		}
	}

	/// The handler table.
	pub fn handlers(&self) -> &HandlerRegistry {
		&self.handlers
	}

	/// Dispatches one raw channel message from the guest of `screen`.
	///
	/// Returns once the handler has finished or suspended. Must be called from
	/// within a Tokio runtime.
	pub fn dispatch(&self, raw: &str, screen: &ScreenState) -> DispatchOutcome {
		let envelope = match BridgeEnvelope::decode(raw) {
			Ok(envelope) => envelope,
			Err(e) => {
				tracing::error!(app_id = %screen.app_id(), "dropping bridge message: {}", e);
				return DispatchOutcome::Dropped(DropReason::Malformed(e.to_string()));
			}
		};

		let Some(topic) = BridgeTopic::from_wire(&envelope.topic) else {
			tracing::warn!(
				app_id = %screen.app_id(),
				topic = %envelope.topic,
				request_id = %envelope.request_id,
				"no handler for bridge topic; message dropped"
			);
			return DispatchOutcome::Dropped(DropReason::UnknownTopic(envelope.topic));
		};

		let Some(handler) = self.handlers.get(topic) else {
			tracing::warn!(
				app_id = %screen.app_id(),
				topic = %topic,
				"bridge topic has no registered handler; message dropped"
			);
			return DispatchOutcome::Dropped(DropReason::NoHandler(topic));
		};

		tracing::debug!(
			app_id = %screen.app_id(),
			topic = %topic,
			request_id = %envelope.request_id,
			"dispatching bridge request"
		);

		let ctx = screen.context(topic.as_str(), envelope.request_id.clone());
		let data = envelope.data;
		let mut handling = Box::pin(async move {
			handler.handle(data, ctx).await;
		});
		let task = match (&mut handling).now_or_never() {
			Some(()) => None,
			None => Some(tokio::spawn(handling)),
		};

		DispatchOutcome::Dispatched {
			topic,
			request_id: envelope.request_id,
			task,
		}
	}
}
