//! Guest-side bridge client.
//!
//! A Rust rendition of the injected runtime: it owns the pending-request map
//! and the mirrored value slots of one guest page. Headless guests and tests
//! drive the host through it exactly as page scripts drive it through
//! `window.nativebridge`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::envelope::{BridgeEnvelope, GuestCallback, RequestId, Settlement};
use crate::error::{BridgeError, BridgeResult};
use crate::registry::TopicRegistry;
use crate::topic::BridgeTopic;

/// Guest to host transport: receives each encoded envelope.
pub type Transport = Arc<dyn Fn(String) + Send + Sync>;

type Waiter = oneshot::Sender<Result<Value, String>>;

/// Outcome of a settled request as observed by the guest.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientOutcome {
	/// The host resolved the request.
	Resolved(Value),
	/// The host rejected the request.
	Rejected(String),
}

/// A request awaiting its settlement.
#[derive(Debug)]
pub struct PendingResponse {
	request_id: RequestId,
	receiver: Option<oneshot::Receiver<Result<Value, String>>>,
}

impl PendingResponse {
	/// Identifier sent with the request.
	pub fn request_id(&self) -> &RequestId {
		&self.request_id
	}

	/// Waits for the matching `resolve`/`reject`.
	///
	/// Fire-and-forget topics resolve to `null` immediately.
	pub async fn settle(self) -> BridgeResult<ClientOutcome> {
		let Some(receiver) = self.receiver else {
			return Ok(ClientOutcome::Resolved(Value::Null));
		};
		match receiver.await {
			Ok(Ok(value)) => Ok(ClientOutcome::Resolved(value)),
			Ok(Err(message)) => Ok(ClientOutcome::Rejected(message)),
			Err(_) => Err(BridgeError::Abandoned(self.request_id.to_string())),
		}
	}
}

#[derive(Default)]
struct ClientState {
	pending: HashMap<RequestId, Waiter>,
	values: HashMap<String, Value>,
}

/// Owns the pending map and value slots of one guest page.
#[derive(Clone)]
pub struct BridgeClient {
	state: Arc<Mutex<ClientState>>,
	transport: Transport,
}

impl BridgeClient {
	/// Creates a client sending envelopes through `transport`.
	pub fn new(transport: Transport) -> Self {
		Self {
			state: Arc::new(Mutex::new(ClientState::default())),
			transport,
		}
	}

	/// Issues a request (`request<Topic>`).
	pub fn request(&self, topic: BridgeTopic, data: Value) -> PendingResponse {
		let request_id = RequestId::generate();
		self.request_with_id(topic, data, request_id)
	}

	/// Issues a request under a caller-chosen identifier.
	pub fn request_with_id(
		&self,
		topic: BridgeTopic,
		data: Value,
		request_id: RequestId,
	) -> PendingResponse {
		let receiver = if TopicRegistry::descriptor(topic).settles {
			let (tx, rx) = oneshot::channel();
			self.state.lock().pending.insert(request_id.clone(), tx);
			Some(rx)
		} else {
			None
		};

		let envelope = BridgeEnvelope::new(topic.as_str(), data, request_id.clone());
		(self.transport)(envelope.encode());

		PendingResponse {
			request_id,
			receiver,
		}
	}

	/// Settles a request successfully (`resolve<Topic>`).
	///
	/// The value is mirrored into the topic's slot even when no request with
	/// `request_id` is pending.
	pub fn resolve(&self, topic: &str, value: Value, request_id: &RequestId) {
		let waiter = {
			let mut state = self.state.lock();
			state.values.insert(topic.to_string(), value.clone());
			state.pending.remove(request_id)
		};
		if let Some(waiter) = waiter {
			let _ = waiter.send(Ok(value));
		}
	}

	/// Settles a request with an error (`reject<Topic>`).
	pub fn reject(&self, _topic: &str, message: impl Into<String>, request_id: &RequestId) {
		let waiter = self.state.lock().pending.remove(request_id);
		if let Some(waiter) = waiter {
			let _ = waiter.send(Err(message.into()));
		}
	}

	/// Applies a host callback.
	pub fn apply(&self, callback: GuestCallback) {
		match callback.settlement {
			Settlement::Resolved(value) => {
				self.resolve(&callback.topic, value, &callback.request_id)
			}
			Settlement::Rejected(message) => {
				self.reject(&callback.topic, message, &callback.request_id)
			}
		}
	}

	/// Reads the mirrored value of `topic` (`get<Topic>`).
	pub fn get(&self, topic: BridgeTopic) -> Option<Value> {
		self.state.lock().values.get(topic.as_str()).cloned()
	}

	/// Number of requests still awaiting settlement.
	pub fn pending_count(&self) -> usize {
		self.state.lock().pending.len()
	}

	/// Simulates a page reload: every pending request is abandoned.
	///
	/// Mirrored values survive, like globals restored by the host on reload.
	pub fn reload(&self) {
		self.state.lock().pending.clear();
	}
}
