use async_trait::async_trait;
use serde_json::{Value, json};

use crate::context::BridgeContext;
use crate::dispatcher::BridgeHandler;
use crate::handlers::str_param;

pub(crate) const MISSING_SAVE_PARAMS: &str = "Missing required parameters: key and value";
pub(crate) const MISSING_KEY: &str = "Missing required parameter: key";

/// `save_local_data`: stores `value` under `key` in the app's namespace.
#[derive(Debug, Default, Clone, Copy)]
pub struct SaveLocalDataHandler;

#[async_trait]
impl BridgeHandler for SaveLocalDataHandler {
	async fn handle(&self, data: Value, ctx: BridgeContext) {
		let key = str_param(&data, "key").filter(|k| !k.is_empty());
		let value = data.get("value").filter(|v| !v.is_null());
		let (Some(key), Some(value)) = (key, value) else {
			ctx.reject(MISSING_SAVE_PARAMS);
			return;
		};

		let result = ctx
			.services()
			.store
			.set(ctx.app_id(), key, value.clone())
			.await
			.map(|()| Value::Null);
		ctx.settle(result);
	}
}

/// `get_local_data`: reads `key` from the app's namespace.
///
/// Resolves with `{value}`; a missing key yields `{value: null}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GetLocalDataHandler;

#[async_trait]
impl BridgeHandler for GetLocalDataHandler {
	async fn handle(&self, data: Value, ctx: BridgeContext) {
		let Some(key) = str_param(&data, "key").filter(|k| !k.is_empty()) else {
			ctx.reject(MISSING_KEY);
			return;
		};

		let result = ctx
			.services()
			.store
			.get(ctx.app_id(), key)
			.await
			.map(|value| json!({ "value": value.unwrap_or(Value::Null) }));
		ctx.settle(result);
	}
}
