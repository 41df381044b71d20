//! Single-flight coordination.
//!
//! The first caller starts the operation; callers arriving while it runs await
//! the same shared future. Once it settles the slot is cleared, so the next
//! call starts a fresh operation.

use std::future::Future;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

/// Deduplicates concurrent runs of one operation.
pub struct SingleFlight<T>
where
	T: Clone + Send + Sync + 'static,
{
	inflight: Mutex<Option<Shared<BoxFuture<'static, T>>>>,
}

impl<T> Default for SingleFlight<T>
where
	T: Clone + Send + Sync + 'static,
{
	fn default() -> Self {
		Self {
			inflight: Mutex::new(None),
		}
	}
}

impl<T> SingleFlight<T>
where
	T: Clone + Send + Sync + 'static,
{
	/// Creates an idle coordinator.
	pub fn new() -> Self {
		Self::default()
	}

	/// Whether an operation is running.
	pub fn in_flight(&self) -> bool {
		self.inflight.lock().is_some()
	}

	/// Joins the running operation, or starts `start()` if none runs.
	pub async fn run<F, Fut>(&self, start: F) -> T
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = T> + Send + 'static,
	{
		let shared = {
			let mut slot = self.inflight.lock();
			// A settled future left behind by a cancelled caller is stale.
			match slot.as_ref().filter(|running| running.peek().is_none()) {
				Some(running) => running.clone(),
				None => {
					let fresh = start().boxed().shared();
					*slot = Some(fresh.clone());
					fresh
				}
			}
		};

		let output = shared.clone().await;

		let mut slot = self.inflight.lock();
		if slot.as_ref().is_some_and(|running| running.ptr_eq(&shared)) {
			*slot = None;
		}
		output
	}
}
