//! Bridge topics.
//!
//! A topic names one request kind the guest content can issue. The wire value
//! of a topic is published to micro-apps and must never change once released.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::BridgeError;

/// The closed set of request kinds understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BridgeTopic {
	/// App-scoped access token.
	Token,
	/// Scan a QR code with the device camera.
	QrCode,
	/// Persist a key/value pair for the calling micro-app.
	SaveLocalData,
	/// Read a value previously stored with `SaveLocalData`.
	GetLocalData,
	/// TOTP migration payload (mocked).
	TotpQrMigrationData,
	/// Native alert dialog.
	Alert,
	/// Native two-button confirmation dialog.
	ConfirmAlert,
	/// Interactive Google sign-in.
	GoogleLogin,
	/// Upload a backup object to Google Drive.
	UploadToGoogleDrive,
	/// Fetch the latest Google Drive backup.
	RestoreGoogleDriveBackup,
	/// Whether a Google account is currently signed in.
	CheckGoogleAuthState,
	/// Profile of the signed-in Google account.
	GoogleUserInfo,
	/// Device safe-area insets.
	DeviceSafeAreaInsets,
	/// Leave the micro-app screen.
	CloseWebview,
	/// Forward a guest log line to the host log.
	NativeLog,
}

impl BridgeTopic {
	/// Every topic in publication order.
	pub const ALL: [BridgeTopic; 15] = [
		BridgeTopic::Token,
		BridgeTopic::QrCode,
		BridgeTopic::SaveLocalData,
		BridgeTopic::GetLocalData,
		BridgeTopic::TotpQrMigrationData,
		BridgeTopic::Alert,
		BridgeTopic::ConfirmAlert,
		BridgeTopic::GoogleLogin,
		BridgeTopic::UploadToGoogleDrive,
		BridgeTopic::RestoreGoogleDriveBackup,
		BridgeTopic::CheckGoogleAuthState,
		BridgeTopic::GoogleUserInfo,
		BridgeTopic::DeviceSafeAreaInsets,
		BridgeTopic::CloseWebview,
		BridgeTopic::NativeLog,
	];

	/// The wire identifier of this topic.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::Token => "token",
			Self::QrCode => "QR_code",
			Self::SaveLocalData => "save_local_data",
			Self::GetLocalData => "get_local_data",
			Self::TotpQrMigrationData => "totp_qr_migration_data",
			Self::Alert => "alert",
			Self::ConfirmAlert => "confirm_alert",
			Self::GoogleLogin => "google_login",
			Self::UploadToGoogleDrive => "upload_to_google_drive",
			Self::RestoreGoogleDriveBackup => "restore_google_drive_backup",
			Self::CheckGoogleAuthState => "check_google_auth_state",
			Self::GoogleUserInfo => "google_user_info",
			Self::DeviceSafeAreaInsets => "device_safe_area_insets",
			Self::CloseWebview => "close_webview",
			Self::NativeLog => "native_log",
		}
	}

	/// Looks up a topic by its exact wire identifier.
	pub fn from_wire(value: &str) -> Option<Self> {
		Self::ALL.iter().copied().find(|topic| topic.as_str() == value)
	}
}

impl fmt::Display for BridgeTopic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for BridgeTopic {
	type Err = BridgeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_wire(s).ok_or_else(|| BridgeError::UnknownTopic(s.to_string()))
	}
}

impl Serialize for BridgeTopic {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for BridgeTopic {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		Self::from_wire(&raw)
			.ok_or_else(|| serde::de::Error::custom(format!("unknown bridge topic: {}", raw)))
	}
}
