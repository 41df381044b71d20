//! Resources that park guest requests across invocations.
//!
//! Both resources are explicit two-state machines:
//!
//! - [`TokenGate`]: `Waiting(fifo)` until the app-scoped token is delivered,
//!   then `Ready(token)`.
//! - [`ScannerSlot`]: `Idle` or `Armed(responder)` while the camera is shown.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde_json::Value;

use crate::context::Responder;

/// Rejection sent when the user dismisses the scanner.
pub const SCAN_CANCELLED: &str = "QR scan cancelled";

/// Rejection sent to a parked scan request replaced by a newer one.
pub const SCAN_SUPERSEDED: &str = "QR scan superseded";

enum TokenState {
	Waiting(VecDeque<Responder>),
	Ready(String),
}

/// What happened to a token request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRequest {
	/// Answered immediately with the known token.
	Resolved,
	/// Parked at this 1-based queue position.
	Queued(usize),
}

/// FIFO of token requests waiting for the token exchange to finish.
pub struct TokenGate {
	state: Mutex<TokenState>,
}

impl Default for TokenGate {
	fn default() -> Self {
		Self::new()
	}
}

impl TokenGate {
	/// A gate without a token.
	pub fn new() -> Self {
		Self {
			state: Mutex::new(TokenState::Waiting(VecDeque::new())),
		}
	}

	/// A gate that already knows the token.
	pub fn with_token(token: impl Into<String>) -> Self {
		Self {
			state: Mutex::new(TokenState::Ready(token.into())),
		}
	}

	/// The token, once delivered.
	pub fn current(&self) -> Option<String> {
		match &*self.state.lock() {
			TokenState::Ready(token) => Some(token.clone()),
			TokenState::Waiting(_) => None,
		}
	}

	/// Number of parked requests.
	pub fn waiting(&self) -> usize {
		match &*self.state.lock() {
			TokenState::Waiting(queue) => queue.len(),
			TokenState::Ready(_) => 0,
		}
	}

	/// Answers `responder` now if the token is known, otherwise parks it.
	pub fn request(&self, responder: Responder) -> TokenRequest {
		let token = {
			let mut state = self.state.lock();
			match &mut *state {
				TokenState::Ready(token) => token.clone(),
				TokenState::Waiting(queue) => {
					queue.push_back(responder);
					return TokenRequest::Queued(queue.len());
				}
			}
		};
		responder.resolve(Value::String(token));
		TokenRequest::Resolved
	}

	/// Stores the token and resolves every parked request in arrival order.
	///
	/// Returns how many parked requests were resolved.
	pub fn deliver(&self, token: impl Into<String>) -> usize {
		let token = token.into();
		let drained = {
			let mut state = self.state.lock();
			match std::mem::replace(&mut *state, TokenState::Ready(token.clone())) {
				TokenState::Waiting(queue) => queue,
				TokenState::Ready(_) => VecDeque::new(),
			}
		};

		let count = drained.len();
		for responder in drained {
			responder.resolve(Value::String(token.clone()));
		}
		tracing::debug!(flushed = count, "token delivered");
		count
	}

	/// Forgets the token (logout). Parked requests stay parked.
	pub fn reset(&self) {
		let mut state = self.state.lock();
		if matches!(&*state, TokenState::Ready(_)) {
			*state = TokenState::Waiting(VecDeque::new());
		}
	}
}

enum ScanState {
	Idle,
	Armed(Responder),
}

/// One-shot slot for the request that opened the QR scanner.
pub struct ScannerSlot {
	state: Mutex<ScanState>,
	visible: AtomicBool,
}

impl Default for ScannerSlot {
	fn default() -> Self {
		Self::new()
	}
}

impl ScannerSlot {
	/// An idle, hidden scanner.
	pub fn new() -> Self {
		Self {
			state: Mutex::new(ScanState::Idle),
			visible: AtomicBool::new(false),
		}
	}

	/// Whether the scanner UI should be shown.
	pub fn is_visible(&self) -> bool {
		self.visible.load(Ordering::Acquire)
	}

	/// Whether a request is parked.
	pub fn is_armed(&self) -> bool {
		matches!(&*self.state.lock(), ScanState::Armed(_))
	}

	/// Parks `responder` and shows the scanner.
	///
	/// A request already parked is rejected with [`SCAN_SUPERSEDED`].
	pub fn arm(&self, responder: Responder) {
		let previous = std::mem::replace(&mut *self.state.lock(), ScanState::Armed(responder));
		self.visible.store(true, Ordering::Release);
		if let ScanState::Armed(previous) = previous {
			previous.reject(SCAN_SUPERSEDED);
		}
	}

	/// Resolves the parked request with the scanned text and hides the scanner.
	///
	/// Returns `false` when no request was parked.
	pub fn complete(&self, scanned: impl Into<String>) -> bool {
		match self.take() {
			Some(responder) => {
				responder.resolve(Value::String(scanned.into()));
				true
			}
			None => false,
		}
	}

	/// Rejects the parked request with [`SCAN_CANCELLED`] and hides the scanner.
	pub fn cancel(&self) -> bool {
		match self.take() {
			Some(responder) => {
				responder.reject(SCAN_CANCELLED);
				true
			}
			None => false,
		}
	}

	fn take(&self) -> Option<Responder> {
		let previous = std::mem::replace(&mut *self.state.lock(), ScanState::Idle);
		self.visible.store(false, Ordering::Release);
		match previous {
			ScanState::Armed(responder) => Some(responder),
			ScanState::Idle => None,
		}
	}
}
