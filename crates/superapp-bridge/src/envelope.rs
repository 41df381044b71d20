//! Message codec for the bridge wire format.
//!
//! Guest to host: one JSON string per message,
//! `{"topic": string, "data": any, "requestId": string}`.
//!
//! Host to guest: a short script calling the generated settle method,
//! `window.nativebridge.resolveToken(<json>, "<requestId>");`.

use std::fmt;

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CodecError;
use crate::naming::MethodNames;

/// Length of the random part of a generated request id.
const REQUEST_ID_SUFFIX_LEN: usize = 9;

/// Correlates one guest request with its settlement.
///
/// Only unique within one page lifetime; a reload flushes every pending request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
	/// Wraps an existing identifier.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Generates `<unix millis><random suffix>`.
	pub fn generate() -> Self {
		let suffix: String = rand::thread_rng()
			.sample_iter(&Alphanumeric)
			.take(REQUEST_ID_SUFFIX_LEN)
			.map(char::from)
			.collect::<String>()
			.to_lowercase();
		Self(format!("{}{}", chrono::Utc::now().timestamp_millis(), suffix))
	}

	/// The identifier as sent on the wire.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Whether the guest omitted the identifier.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Display for RequestId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for RequestId {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

/// One guest to host message.
///
/// `topic` stays a raw string here: unknown topics must survive decoding so the
/// dispatcher can log and drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeEnvelope {
	/// Wire identifier of the requested operation.
	pub topic: String,
	/// Request parameters.
	#[serde(default)]
	pub data: Value,
	/// Guest-side correlation id.
	#[serde(default = "empty_request_id")]
	pub request_id: RequestId,
}

fn empty_request_id() -> RequestId {
	RequestId::new("")
}

impl BridgeEnvelope {
	/// Creates an envelope.
	pub fn new(topic: impl Into<String>, data: Value, request_id: RequestId) -> Self {
		Self {
			topic: topic.into(),
			data,
			request_id,
		}
	}

	/// Decodes a raw channel message.
	///
	/// Missing `data` decodes as `null`; a missing or non-string `requestId`
	/// decodes as an empty id (numbers are accepted and stringified).
	pub fn decode(raw: &str) -> Result<Self, CodecError> {
		let value: Value = serde_json::from_str(raw)?;
		let Value::Object(mut object) = value else {
			return Err(CodecError::NotAnObject);
		};

		let topic = match object.remove("topic") {
			Some(Value::String(topic)) if !topic.is_empty() => topic,
			_ => return Err(CodecError::MissingTopic),
		};
		let data = object.remove("data").unwrap_or(Value::Null);
		let request_id = match object.remove("requestId") {
			Some(Value::String(id)) => RequestId::new(id),
			Some(Value::Number(n)) => RequestId::new(n.to_string()),
			_ => empty_request_id(),
		};

		Ok(Self {
			topic,
			data,
			request_id,
		})
	}

	/// Encodes the envelope for the channel.
	pub fn encode(&self) -> String {
		// Serializing a struct of strings and a `Value` cannot fail.
		serde_json::to_string(self).unwrap_or_default()
	}
}

/// Outcome delivered back to the guest.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
	/// Fulfil the pending promise with a value.
	Resolved(Value),
	/// Reject the pending promise with a message.
	Rejected(String),
}

/// A host to guest settlement for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct GuestCallback {
	/// Wire identifier of the settled topic.
	pub topic: String,
	/// Identifier of the settled request.
	pub request_id: RequestId,
	/// Resolution or rejection.
	pub settlement: Settlement,
}

impl GuestCallback {
	/// A resolving callback.
	pub fn resolved(topic: impl Into<String>, request_id: RequestId, value: Value) -> Self {
		Self {
			topic: topic.into(),
			request_id,
			settlement: Settlement::Resolved(value),
		}
	}

	/// A rejecting callback.
	pub fn rejected(
		topic: impl Into<String>,
		request_id: RequestId,
		message: impl Into<String>,
	) -> Self {
		Self {
			topic: topic.into(),
			request_id,
			settlement: Settlement::Rejected(message.into()),
		}
	}

	/// Renders the script that settles the request inside the guest page.
	pub fn to_script(&self, namespace: &str) -> String {
		let names = MethodNames::from_wire(&self.topic);
		let (method, argument) = match &self.settlement {
			Settlement::Resolved(value) => (names.resolve, value.to_string()),
			Settlement::Rejected(message) => (names.reject, Value::from(message.as_str()).to_string()),
		};
		let request_id = Value::from(self.request_id.as_str()).to_string();

		format!(
			"window.{}.{}({}, {});true;",
			namespace, method, argument, request_id
		)
	}
}
