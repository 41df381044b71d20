use async_trait::async_trait;
use serde_json::Value;

use crate::context::BridgeContext;
use crate::dispatcher::BridgeHandler;
use crate::waiters::TokenRequest;

/// `token`: answers with the app-scoped token, parking the request until the
/// token exchange delivers one.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenHandler;

#[async_trait]
impl BridgeHandler for TokenHandler {
	async fn handle(&self, _data: Value, ctx: BridgeContext) {
		let gate = ctx.token_gate().clone();
		let app_id = ctx.app_id().to_string();
		if let TokenRequest::Queued(position) = gate.request(ctx.into_responder()) {
			tracing::debug!(app_id = %app_id, position, "token not yet known; request parked");
		}
	}
}
