use async_trait::async_trait;
use serde_json::Value;

use crate::context::BridgeContext;
use crate::dispatcher::BridgeHandler;

pub(crate) const NO_SIGN_IN: &str = "Google sign-in is not available on this screen";
pub(crate) const UPLOAD_NOT_OBJECT: &str = "Backup payload must be an object";

/// `google_login`: runs the interactive sign-in flow.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoogleLoginHandler;

#[async_trait]
impl BridgeHandler for GoogleLoginHandler {
	async fn handle(&self, _data: Value, ctx: BridgeContext) {
		let Some(prompt) = ctx.google_auth().cloned() else {
			ctx.reject(NO_SIGN_IN);
			return;
		};
		let result = prompt.prompt().await.map(|()| Value::Null);
		ctx.settle(result);
	}
}

/// `upload_to_google_drive`: uploads the given backup object.
#[derive(Debug, Default, Clone, Copy)]
pub struct UploadToGoogleDriveHandler;

#[async_trait]
impl BridgeHandler for UploadToGoogleDriveHandler {
	async fn handle(&self, data: Value, ctx: BridgeContext) {
		if !data.is_object() {
			ctx.reject(UPLOAD_NOT_OBJECT);
			return;
		}
		let result = ctx.services().drive.upload(data).await;
		ctx.settle(result);
	}
}

/// `restore_google_drive_backup`: downloads the latest backup.
#[derive(Debug, Default, Clone, Copy)]
pub struct RestoreGoogleDriveBackupHandler;

#[async_trait]
impl BridgeHandler for RestoreGoogleDriveBackupHandler {
	async fn handle(&self, _data: Value, ctx: BridgeContext) {
		let result = ctx.services().drive.restore_latest().await;
		ctx.settle(result);
	}
}

/// `check_google_auth_state`: whether a Google account is signed in.
#[derive(Debug, Default, Clone, Copy)]
pub struct CheckGoogleAuthStateHandler;

#[async_trait]
impl BridgeHandler for CheckGoogleAuthStateHandler {
	async fn handle(&self, _data: Value, ctx: BridgeContext) {
		let result = ctx.services().drive.is_signed_in().await.map(Value::Bool);
		ctx.settle(result);
	}
}

/// `google_user_info`: profile of the signed-in account.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoogleUserInfoHandler;

#[async_trait]
impl BridgeHandler for GoogleUserInfoHandler {
	async fn handle(&self, _data: Value, ctx: BridgeContext) {
		let result = ctx.services().drive.user_info().await;
		ctx.settle(result);
	}
}
