//! Native bridge between the super-app shell and micro-app guest content.
//!
//! Guest content talks to the host over a single one-way string channel. Each
//! message is a JSON envelope `{topic, data, requestId}`; the host answers by
//! injecting a call to a generated `resolve<Topic>` / `reject<Topic>` method.
//!
//! # Architecture
//!
//! - [`BridgeTopic`]: closed catalog of request kinds with stable wire ids.
//! - [`TopicRegistry`]: static topic → method-name descriptors.
//! - [`RuntimeGenerator`]: builds the JavaScript object injected into guests.
//! - [`HostDispatcher`]: decodes envelopes and runs the matching
//!   [`BridgeHandler`] with a fresh [`BridgeContext`].
//! - [`ScreenState`]: per-screen state that outlives single requests (token
//!   gate, scanner slot, mount flag).
//! - [`BridgeClient`]: typed model of the guest side, used by tests and by
//!   hosts that embed a non-browser guest.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use superapp_bridge::{ChannelSink, HostDispatcher, HostServices, ScreenState};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (sink, mut callbacks) = ChannelSink::new();
//! let screen = ScreenState::builder("wallet", Arc::new(sink), HostServices::headless()).build();
//! let dispatcher = HostDispatcher::default();
//!
//! dispatcher
//!     .dispatch(r#"{"topic":"token","data":null,"requestId":"1"}"#, &screen)
//!     .join()
//!     .await;
//! screen.deliver_token("app-token");
//!
//! let callback = callbacks.recv().await.unwrap();
//! assert_eq!(callback.request_id.as_str(), "1");
//! # }
//! ```

pub mod client;
pub mod context;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod naming;
pub mod registry;
pub mod runtime;
pub mod screen;
pub mod services;
pub mod sink;
pub mod topic;
pub mod waiters;

pub use client::{BridgeClient, ClientOutcome, PendingResponse, Transport};
pub use context::{BridgeContext, Responder, SafeAreaInsets};
pub use dispatcher::{
	BridgeHandler, DispatchOutcome, DropReason, FnHandler, HandlerRegistry, HostDispatcher,
	handler_fn,
};
pub use envelope::{BridgeEnvelope, GuestCallback, RequestId, Settlement};
pub use error::{BridgeError, BridgeResult, CodecError};
pub use naming::{MethodNames, method_suffix};
pub use registry::{TopicDescriptor, TopicRegistry};
pub use runtime::{
	DEFAULT_NAMESPACE, DEFAULT_TRANSPORT, RuntimeGenerator, generate_injected_runtime,
};
pub use screen::{ScreenState, ScreenStateBuilder};
pub use services::{
	ConfirmChoice, Dialogs, FileLocalStore, GoogleAuthPrompt, GoogleDrive, HeadlessDialogs,
	HostServices, LocalStore, MemoryLocalStore, Navigator, UnconfiguredDrive,
};
pub use sink::{ChannelSink, GuestSink, ScriptSink};
pub use topic::BridgeTopic;
pub use waiters::{SCAN_CANCELLED, SCAN_SUPERSEDED, ScannerSlot, TokenGate, TokenRequest};

/// Commonly used types.
pub mod prelude {
	pub use crate::{
		BridgeContext, BridgeError, BridgeHandler, BridgeResult, BridgeTopic, GuestSink,
		HostDispatcher, HostServices, ScreenState,
	};
}
