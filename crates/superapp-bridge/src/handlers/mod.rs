//! Built-in handlers, one per topic.
//!
//! Every handler validates its parameters, performs one unit of work and
//! settles the context. None of them retry.

mod device;
mod dialogs;
mod google;
mod qr;
mod storage;
mod token;

pub use device::{CloseWebviewHandler, DeviceSafeAreaInsetsHandler, NativeLogHandler};
pub use dialogs::{AlertHandler, ConfirmAlertHandler};
pub use google::{
	CheckGoogleAuthStateHandler, GoogleLoginHandler, GoogleUserInfoHandler,
	RestoreGoogleDriveBackupHandler, UploadToGoogleDriveHandler,
};
pub use qr::{QrCodeHandler, TotpQrMigrationDataHandler};
pub use storage::{GetLocalDataHandler, SaveLocalDataHandler};
pub use token::TokenHandler;

use serde_json::Value;

use crate::dispatcher::{BridgeHandler, HandlerRegistry};
use crate::topic::BridgeTopic;

/// Registers the built-in handler of every topic, replacing existing ones.
pub(crate) fn register_defaults(registry: &mut HandlerRegistry) {
	for topic in BridgeTopic::ALL {
		registry.replace_boxed(topic, default_handler(topic));
	}
}

/// The built-in handler of `topic`.
pub fn default_handler(topic: BridgeTopic) -> Box<dyn BridgeHandler> {
	match topic {
		BridgeTopic::Token => Box::new(TokenHandler),
		BridgeTopic::QrCode => Box::new(QrCodeHandler),
		BridgeTopic::SaveLocalData => Box::new(SaveLocalDataHandler),
		BridgeTopic::GetLocalData => Box::new(GetLocalDataHandler),
		BridgeTopic::TotpQrMigrationData => Box::new(TotpQrMigrationDataHandler),
		BridgeTopic::Alert => Box::new(AlertHandler),
		BridgeTopic::ConfirmAlert => Box::new(ConfirmAlertHandler),
		BridgeTopic::GoogleLogin => Box::new(GoogleLoginHandler),
		BridgeTopic::UploadToGoogleDrive => Box::new(UploadToGoogleDriveHandler),
		BridgeTopic::RestoreGoogleDriveBackup => Box::new(RestoreGoogleDriveBackupHandler),
		BridgeTopic::CheckGoogleAuthState => Box::new(CheckGoogleAuthStateHandler),
		BridgeTopic::GoogleUserInfo => Box::new(GoogleUserInfoHandler),
		BridgeTopic::DeviceSafeAreaInsets => Box::new(DeviceSafeAreaInsetsHandler),
		BridgeTopic::CloseWebview => Box::new(CloseWebviewHandler),
		BridgeTopic::NativeLog => Box::new(NativeLogHandler),
	}
}

/// Reads a string parameter, treating absent and non-string values as missing.
pub(crate) fn str_param<'a>(data: &'a Value, name: &str) -> Option<&'a str> {
	data.get(name).and_then(Value::as_str)
}

/// Reads a string parameter or falls back to `default`.
pub(crate) fn str_param_or<'a>(data: &'a Value, name: &str, default: &'a str) -> &'a str {
	str_param(data, name).unwrap_or(default)
}
