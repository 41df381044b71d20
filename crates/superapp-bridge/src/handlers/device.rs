use async_trait::async_trait;
use serde_json::{Value, json};

use crate::context::BridgeContext;
use crate::dispatcher::BridgeHandler;
use crate::handlers::{str_param, str_param_or};

pub(crate) const INSETS_UNAVAILABLE: &str = "Device safe area insets are not available";

/// Log target of messages forwarded by guest content.
pub const GUEST_LOG_TARGET: &str = "superapp::guest";

/// `device_safe_area_insets`: resolves with `{insets}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeviceSafeAreaInsetsHandler;

#[async_trait]
impl BridgeHandler for DeviceSafeAreaInsetsHandler {
	async fn handle(&self, _data: Value, ctx: BridgeContext) {
		match ctx.insets() {
			Some(insets) => ctx.resolve(json!({ "insets": insets })),
			None => ctx.reject(INSETS_UNAVAILABLE),
		}
	}
}

/// `close_webview`: leaves the micro-app screen. Fire-and-forget.
#[derive(Debug, Default, Clone, Copy)]
pub struct CloseWebviewHandler;

#[async_trait]
impl BridgeHandler for CloseWebviewHandler {
	async fn handle(&self, _data: Value, ctx: BridgeContext) {
		match ctx.navigator() {
			Some(navigator) => navigator.go_back(),
			None => tracing::warn!(app_id = %ctx.app_id(), "close_webview without navigator"),
		}
	}
}

/// `native_log`: forwards a guest log line to the host log. Fire-and-forget.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLogHandler;

#[async_trait]
impl BridgeHandler for NativeLogHandler {
	async fn handle(&self, data: Value, ctx: BridgeContext) {
		let level = str_param_or(&data, "level", "info");
		let message = str_param(&data, "message").unwrap_or_default();
		let extra = data.get("data").filter(|v| !v.is_null()).map(Value::to_string);
		let extra = extra.as_deref().unwrap_or("");
		let app_id = ctx.app_id();

		match level.to_ascii_lowercase().as_str() {
			"error" => tracing::error!(target: GUEST_LOG_TARGET, app_id, data = extra, "{}", message),
			"warn" | "warning" => {
				tracing::warn!(target: GUEST_LOG_TARGET, app_id, data = extra, "{}", message)
			}
			"debug" => tracing::debug!(target: GUEST_LOG_TARGET, app_id, data = extra, "{}", message),
			"trace" => tracing::trace!(target: GUEST_LOG_TARGET, app_id, data = extra, "{}", message),
			_ => tracing::info!(target: GUEST_LOG_TARGET, app_id, data = extra, "{}", message),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::SafeAreaInsets;
	use crate::envelope::Settlement;
	use crate::handlers::test_support::{id, screen, screen_builder};
	use crate::services::{HostServices, Navigator};
	use rstest::rstest;
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[derive(Default)]
	struct CountingNavigator(AtomicUsize);

	impl Navigator for CountingNavigator {
		fn go_back(&self) {
			self.0.fetch_add(1, Ordering::SeqCst);
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_insets_resolve_when_known() {
		let (builder, mut rx) = screen_builder(HostServices::headless());
		let screen = builder
			.insets(SafeAreaInsets {
				top: 47.0,
				bottom: 34.0,
				left: 0.0,
				right: 0.0,
			})
			.build();

		DeviceSafeAreaInsetsHandler
			.handle(Value::Null, screen.context("device_safe_area_insets", id("i")))
			.await;

		assert_eq!(
			rx.recv().await.unwrap().settlement,
			Settlement::Resolved(json!({"insets": {"top": 47.0, "bottom": 34.0, "left": 0.0, "right": 0.0}}))
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_insets_reject_when_unknown() {
		let (screen, mut rx) = screen();

		DeviceSafeAreaInsetsHandler
			.handle(Value::Null, screen.context("device_safe_area_insets", id("i")))
			.await;

		assert_eq!(
			rx.recv().await.unwrap().settlement,
			Settlement::Rejected(INSETS_UNAVAILABLE.to_string())
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_close_webview_navigates_back_without_settling() {
		let navigator = Arc::new(CountingNavigator::default());
		let (builder, mut rx) = screen_builder(HostServices::headless());
		let screen = builder.navigator(navigator.clone()).build();

		CloseWebviewHandler
			.handle(Value::Null, screen.context("close_webview", id("c")))
			.await;

		assert_eq!(navigator.0.load(Ordering::SeqCst), 1);
		assert!(rx.try_recv().is_err());
	}

	#[rstest]
	#[case(json!({"level": "error", "message": "boom", "data": {"x": 1}}))]
	#[case(json!({"level": "verbose", "message": "unknown level"}))]
	#[case(json!({}))]
	#[tokio::test]
	async fn test_native_log_never_settles(#[case] data: Value) {
		let (screen, mut rx) = screen();

		NativeLogHandler
			.handle(data, screen.context("native_log", id("n")))
			.await;

		assert!(rx.try_recv().is_err());
	}
}
