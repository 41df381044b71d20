//! Method names derived from topic identifiers.
//!
//! Guest content calls `request<Topic>` and the host answers with
//! `resolve<Topic>` / `reject<Topic>`. `<Topic>` is the wire identifier with
//! underscores removed, the letter following each underscore upper-cased and
//! the first letter always upper-cased (`save_local_data` -> `SaveLocalData`,
//! `QR_code` -> `QRCode`).

use serde::Serialize;

use crate::topic::BridgeTopic;

/// Converts a wire identifier into the `<Topic>` fragment of its method names.
pub fn method_suffix(topic: &str) -> String {
	let mut out = String::with_capacity(topic.len());
	let mut upper_next = true;

	for ch in topic.chars() {
		if ch == '_' {
			upper_next = true;
			continue;
		}
		if upper_next {
			out.extend(ch.to_uppercase());
			upper_next = false;
		} else {
			out.push(ch);
		}
	}

	out
}

/// The four generated method names of one topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MethodNames {
	/// Issues a new request (`request<Topic>`).
	pub request: String,
	/// Settles a pending request successfully (`resolve<Topic>`).
	pub resolve: String,
	/// Settles a pending request with an error (`reject<Topic>`).
	pub reject: String,
	/// Reads the mirrored last value (`get<Topic>`).
	pub get: String,
}

impl MethodNames {
	/// Derives the method names of `topic`.
	pub fn for_topic(topic: BridgeTopic) -> Self {
		Self::from_wire(topic.as_str())
	}

	/// Derives the method names of a raw wire identifier.
	pub fn from_wire(topic: &str) -> Self {
		let suffix = method_suffix(topic);
		Self {
			request: format!("request{}", suffix),
			resolve: format!("resolve{}", suffix),
			reject: format!("reject{}", suffix),
			get: format!("get{}", suffix),
		}
	}

	/// All four names, in request/resolve/reject/get order.
	pub fn all(&self) -> [&str; 4] {
		[&self.request, &self.resolve, &self.reject, &self.get]
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::collections::HashSet;

	#[rstest]
	#[case("token", "Token")]
	#[case("QR_code", "QRCode")]
	#[case("save_local_data", "SaveLocalData")]
	#[case("totp_qr_migration_data", "TotpQrMigrationData")]
	#[case("close_webview", "CloseWebview")]
	fn test_method_suffix(#[case] topic: &str, #[case] expected: &str) {
		assert_eq!(method_suffix(topic), expected);
	}

	#[rstest]
	fn test_method_names_for_topic() {
		// Act
		let names = MethodNames::for_topic(BridgeTopic::GetLocalData);

		// Assert
		assert_eq!(names.request, "requestGetLocalData");
		assert_eq!(names.resolve, "resolveGetLocalData");
		assert_eq!(names.reject, "rejectGetLocalData");
		assert_eq!(names.get, "getGetLocalData");
	}

	#[rstest]
	fn test_method_names_are_pairwise_distinct_across_topics() {
		// Arrange
		let mut seen = HashSet::new();

		// Act & Assert
		for topic in BridgeTopic::ALL {
			for name in MethodNames::for_topic(topic).all() {
				assert!(seen.insert(name.to_string()), "duplicate method name: {}", name);
			}
		}
		assert_eq!(seen.len(), BridgeTopic::ALL.len() * 4);
	}

	#[rstest]
	fn test_method_suffix_is_deterministic() {
		for topic in BridgeTopic::ALL {
			assert_eq!(method_suffix(topic.as_str()), method_suffix(topic.as_str()));
		}
	}
}
