//! State of one micro-app screen.
//!
//! Holds what outlives single invocations (token gate, scanner slot, mount
//! flag) and builds a fresh [`BridgeContext`] for every inbound envelope.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::context::{BridgeContext, Responder, SafeAreaInsets};
use crate::envelope::RequestId;
use crate::services::{GoogleAuthPrompt, HostServices, Navigator};
use crate::sink::GuestSink;
use crate::waiters::{ScannerSlot, TokenGate};

/// Shared state of one mounted micro-app screen.
#[derive(Clone)]
pub struct ScreenState {
	app_id: String,
	sink: Arc<dyn GuestSink>,
	services: HostServices,
	token_gate: Arc<TokenGate>,
	scanner: Arc<ScannerSlot>,
	mounted: Arc<AtomicBool>,
	insets: Option<SafeAreaInsets>,
	navigator: Option<Arc<dyn Navigator>>,
	google_auth: Option<Arc<dyn GoogleAuthPrompt>>,
}

impl ScreenState {
	/// Creates a builder for the screen of `app_id`.
	pub fn builder(
		app_id: impl Into<String>,
		sink: Arc<dyn GuestSink>,
		services: HostServices,
	) -> ScreenStateBuilder {
		ScreenStateBuilder {
			app_id: app_id.into(),
			sink,
			services,
			token_gate: None,
			insets: None,
			navigator: None,
			google_auth: None,
		}
	}

	/// Identifier of the hosted micro-app.
	pub fn app_id(&self) -> &str {
		&self.app_id
	}

	/// Token waiter queue.
	pub fn token_gate(&self) -> &Arc<TokenGate> {
		&self.token_gate
	}

	/// QR scanner slot.
	pub fn scanner(&self) -> &Arc<ScannerSlot> {
		&self.scanner
	}

	/// Whether settlements still reach the guest.
	pub fn is_mounted(&self) -> bool {
		self.mounted.load(Ordering::Acquire)
	}

	/// Stops delivering settlements. In-flight handlers keep running; their
	/// results are discarded.
	pub fn unmount(&self) {
		self.mounted.store(false, Ordering::Release);
		tracing::debug!(app_id = %self.app_id, "screen unmounted");
	}

	/// Delivers the app-scoped token, flushing parked token requests.
	pub fn deliver_token(&self, token: impl Into<String>) -> usize {
		self.token_gate.deliver(token)
	}

	/// Builds the context for one inbound request.
	pub fn context(&self, topic: &str, request_id: RequestId) -> BridgeContext {
		BridgeContext {
			responder: Responder::new(topic, request_id, self.sink.clone(), self.mounted.clone()),
			app_id: self.app_id.clone(),
			token_gate: self.token_gate.clone(),
			scanner: self.scanner.clone(),
			insets: self.insets,
			navigator: self.navigator.clone(),
			google_auth: self.google_auth.clone(),
			services: self.services.clone(),
		}
	}
}

/// Builder for [`ScreenState`].
pub struct ScreenStateBuilder {
	app_id: String,
	sink: Arc<dyn GuestSink>,
	services: HostServices,
	token_gate: Option<Arc<TokenGate>>,
	insets: Option<SafeAreaInsets>,
	navigator: Option<Arc<dyn Navigator>>,
	google_auth: Option<Arc<dyn GoogleAuthPrompt>>,
}

impl ScreenStateBuilder {
	/// Shares an existing token gate.
	pub fn token_gate(mut self, gate: Arc<TokenGate>) -> Self {
		self.token_gate = Some(gate);
		self
	}

	/// Sets the device insets.
	pub fn insets(mut self, insets: SafeAreaInsets) -> Self {
		self.insets = Some(insets);
		self
	}

	/// Sets the navigation capability.
	pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
		self.navigator = Some(navigator);
		self
	}

	/// Sets the Google sign-in capability.
	pub fn google_auth(mut self, prompt: Arc<dyn GoogleAuthPrompt>) -> Self {
		self.google_auth = Some(prompt);
		self
	}

	/// Builds a mounted screen.
	pub fn build(self) -> ScreenState {
		ScreenState {
			app_id: self.app_id,
			sink: self.sink,
			services: self.services,
			token_gate: self.token_gate.unwrap_or_default(),
			scanner: Arc::new(ScannerSlot::new()),
			mounted: Arc::new(AtomicBool::new(true)),
			insets: self.insets,
			navigator: self.navigator,
			google_auth: self.google_auth,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sink::ChannelSink;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[tokio::test]
	async fn test_context_is_bound_to_request() {
		// Arrange
		let (sink, mut rx) = ChannelSink::new();
		let screen = ScreenState::builder("wallet", Arc::new(sink), HostServices::headless())
			.insets(SafeAreaInsets::default())
			.build();

		// Act
		let ctx = screen.context("alert", RequestId::new("r-7"));
		assert_eq!(ctx.app_id(), "wallet");
		assert_eq!(ctx.request_id().as_str(), "r-7");
		ctx.resolve(json!(null));

		// Assert
		let callback = rx.recv().await.unwrap();
		assert_eq!(callback.topic, "alert");
		assert_eq!(callback.request_id.as_str(), "r-7");
	}

	#[rstest]
	fn test_contexts_share_token_gate() {
		let (sink, _rx) = ChannelSink::new();
		let screen = ScreenState::builder("wallet", Arc::new(sink), HostServices::headless()).build();

		screen.deliver_token("t-1");

		let ctx = screen.context("token", RequestId::new("1"));
		assert_eq!(ctx.current_token().as_deref(), Some("t-1"));
	}

	#[rstest]
	fn test_unmount_flag() {
		let (sink, _rx) = ChannelSink::new();
		let screen = ScreenState::builder("wallet", Arc::new(sink), HostServices::headless()).build();
		assert!(screen.is_mounted());
		screen.unmount();
		assert!(!screen.is_mounted());
	}
}
