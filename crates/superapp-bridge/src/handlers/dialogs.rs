use async_trait::async_trait;
use serde_json::Value;

use crate::context::BridgeContext;
use crate::dispatcher::BridgeHandler;
use crate::handlers::str_param_or;

/// `alert`: shows a dialog and resolves once it is dismissed.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlertHandler;

#[async_trait]
impl BridgeHandler for AlertHandler {
	async fn handle(&self, data: Value, ctx: BridgeContext) {
		let title = str_param_or(&data, "title", "");
		let message = str_param_or(&data, "message", "");
		let button = str_param_or(&data, "buttonText", "OK");

		ctx.services().dialogs.alert(title, message, button).await;
		ctx.resolve(Value::Null);
	}
}

/// `confirm_alert`: shows a two-button dialog and resolves with
/// `"confirm"` or `"cancel"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfirmAlertHandler;

#[async_trait]
impl BridgeHandler for ConfirmAlertHandler {
	async fn handle(&self, data: Value, ctx: BridgeContext) {
		let title = str_param_or(&data, "title", "");
		let message = str_param_or(&data, "message", "");
		let cancel = str_param_or(&data, "cancelButtonText", "Cancel");
		let confirm = str_param_or(&data, "confirmButtonText", "Confirm");

		let choice = ctx
			.services()
			.dialogs
			.confirm(title, message, cancel, confirm)
			.await;
		ctx.resolve(Value::String(choice.as_str().to_string()));
	}
}
