//! Bridge error types.

use thiserror::Error;

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors produced while decoding an inbound envelope.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
	/// The raw message is not valid JSON.
	#[error("invalid envelope JSON: {0}")]
	InvalidJson(#[from] serde_json::Error),

	/// The raw message is JSON but not an object.
	#[error("envelope must be a JSON object")]
	NotAnObject,

	/// The envelope carries no `topic` string.
	#[error("envelope is missing a topic")]
	MissingTopic,
}

/// Bridge system errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BridgeError {
	/// Envelope decoding failed.
	#[error(transparent)]
	Codec(#[from] CodecError),

	/// No topic with this wire identifier exists.
	#[error("unknown bridge topic: {0}")]
	UnknownTopic(String),

	/// A handler for this topic was already registered.
	#[error("handler already registered for topic: {0}")]
	DuplicateTopic(String),

	/// The guest reloaded or the client was dropped before settlement.
	#[error("request {0} was abandoned before it settled")]
	Abandoned(String),

	/// Local data storage failed.
	#[error("local storage error: {0}")]
	Storage(String),

	/// A host collaborator failed.
	#[error("{0}")]
	Service(String),

	/// IO error.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}
