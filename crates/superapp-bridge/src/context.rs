//! Per-invocation handler context.

use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::{GuestCallback, RequestId};
use crate::services::{GoogleAuthPrompt, HostServices, Navigator};
use crate::sink::GuestSink;
use crate::waiters::{ScannerSlot, TokenGate};

/// Settles exactly one guest request.
///
/// `resolve` and `reject` consume the responder, so a request can be settled
/// at most once. Settlements issued after the screen unmounted are discarded.
pub struct Responder {
	topic: String,
	request_id: RequestId,
	sink: Arc<dyn GuestSink>,
	mounted: Arc<AtomicBool>,
}

impl Responder {
	pub(crate) fn new(
		topic: impl Into<String>,
		request_id: RequestId,
		sink: Arc<dyn GuestSink>,
		mounted: Arc<AtomicBool>,
	) -> Self {
		Self {
			topic: topic.into(),
			request_id,
			sink,
			mounted,
		}
	}

	/// Wire identifier of the topic being answered.
	pub fn topic(&self) -> &str {
		&self.topic
	}

	/// Identifier of the request being answered.
	pub fn request_id(&self) -> &RequestId {
		&self.request_id
	}

	/// Fulfils the guest promise with `value`.
	pub fn resolve(self, value: Value) {
		let callback = GuestCallback::resolved(self.topic.clone(), self.request_id.clone(), value);
		self.deliver(callback);
	}

	/// Rejects the guest promise with `message`.
	pub fn reject(self, message: impl Display) {
		let message = message.to_string();
		tracing::debug!(
			topic = %self.topic,
			request_id = %self.request_id,
			"rejecting request: {}",
			message
		);
		let callback = GuestCallback::rejected(self.topic.clone(), self.request_id.clone(), message);
		self.deliver(callback);
	}

	fn deliver(self, callback: GuestCallback) {
		if !self.mounted.load(Ordering::Acquire) {
			tracing::debug!(
				topic = %self.topic,
				request_id = %self.request_id,
				"screen unmounted; settlement discarded"
			);
			return;
		}
		self.sink.deliver(callback);
	}
}

impl std::fmt::Debug for Responder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Responder")
			.field("topic", &self.topic)
			.field("request_id", &self.request_id)
			.finish_non_exhaustive()
	}
}

/// Device safe-area insets, in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SafeAreaInsets {
	/// Top inset.
	pub top: f64,
	/// Bottom inset.
	pub bottom: f64,
	/// Left inset.
	pub left: f64,
	/// Right inset.
	pub right: f64,
}

/// Capabilities handed to one handler invocation.
///
/// Built fresh for every inbound envelope. The token gate and scanner slot are
/// shared with the enclosing screen and outlive the invocation.
pub struct BridgeContext {
	pub(crate) responder: Responder,
	pub(crate) app_id: String,
	pub(crate) token_gate: Arc<TokenGate>,
	pub(crate) scanner: Arc<ScannerSlot>,
	pub(crate) insets: Option<SafeAreaInsets>,
	pub(crate) navigator: Option<Arc<dyn Navigator>>,
	pub(crate) google_auth: Option<Arc<dyn GoogleAuthPrompt>>,
	pub(crate) services: HostServices,
}

impl BridgeContext {
	/// Wire identifier of the topic being handled.
	pub fn topic(&self) -> &str {
		self.responder.topic()
	}

	/// Identifier of the request being handled.
	pub fn request_id(&self) -> &RequestId {
		self.responder.request_id()
	}

	/// Identifier of the micro-app owning the screen.
	pub fn app_id(&self) -> &str {
		&self.app_id
	}

	/// The app-scoped token, once known.
	pub fn current_token(&self) -> Option<String> {
		self.token_gate.current()
	}

	/// Token waiter queue of the screen.
	pub fn token_gate(&self) -> &Arc<TokenGate> {
		&self.token_gate
	}

	/// QR scanner slot of the screen.
	pub fn scanner(&self) -> &Arc<ScannerSlot> {
		&self.scanner
	}

	/// Device insets, when the platform reports them.
	pub fn insets(&self) -> Option<SafeAreaInsets> {
		self.insets
	}

	/// Navigation capability, when the screen provides one.
	pub fn navigator(&self) -> Option<&Arc<dyn Navigator>> {
		self.navigator.as_ref()
	}

	/// Google sign-in capability, when the screen provides one.
	pub fn google_auth(&self) -> Option<&Arc<dyn GoogleAuthPrompt>> {
		self.google_auth.as_ref()
	}

	/// Shared host collaborators.
	pub fn services(&self) -> &HostServices {
		&self.services
	}

	/// Fulfils the request.
	pub fn resolve(self, value: Value) {
		self.responder.resolve(value);
	}

	/// Rejects the request.
	pub fn reject(self, message: impl Display) {
		self.responder.reject(message);
	}

	/// Resolves on `Ok`, rejects with the error text on `Err`.
	pub fn settle<E: Display>(self, result: Result<Value, E>) {
		match result {
			Ok(value) => self.resolve(value),
			Err(e) => self.reject(e),
		}
	}

	/// Detaches the responder so the request can be settled later.
	pub fn into_responder(self) -> Responder {
		self.responder
	}
}
