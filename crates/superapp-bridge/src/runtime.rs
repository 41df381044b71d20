//! Injected client runtime generation.
//!
//! Produces the script injected into every micro-app page before its content
//! loads. The script installs `window.<namespace>` with, per topic:
//!
//! - `request<Topic>(data)`: creates a request id, parks `{resolve, reject}` in a
//!   page-local pending map, posts the envelope and returns a promise
//! - `resolve<Topic>(value, requestId)`: mirrors `value` into the value slot and
//!   fulfils the matching pending promise, if any
//! - `reject<Topic>(error, requestId)`: removes and rejects the matching entry
//! - `get<Topic>()`: reads the mirrored value slot without a new request
//!
//! Callers that ignore the promise can read `get<Topic>()` after the fact and
//! observe the same value.

use crate::registry::{TopicDescriptor, TopicRegistry};

/// Default global object name.
pub const DEFAULT_NAMESPACE: &str = "nativebridge";

/// Default guest to host transport function.
pub const DEFAULT_TRANSPORT: &str = "window.ReactNativeWebView.postMessage";

const RUNTIME_PRELUDE: &str = r#"(function() {
	if (window.__NAMESPACE__ && window.__NAMESPACE__.__installed) {
		return;
	}
	var pending = new Map();
	var values = window.__NAMESPACE__Values = window.__NAMESPACE__Values || {};

	function nextRequestId() {
		return Date.now().toString() + Math.random().toString(36).substring(2, 11);
	}

	function send(topic, data, requestId) {
		__TRANSPORT__(JSON.stringify({
			topic: topic,
			data: data === undefined ? null : data,
			requestId: requestId
		}));
	}

	function request(topic, data) {
		return new Promise(function(resolve, reject) {
			var requestId = nextRequestId();
			pending.set(requestId, { resolve: resolve, reject: reject });
			send(topic, data, requestId);
		});
	}

	function notify(topic, data) {
		send(topic, data, nextRequestId());
		return Promise.resolve();
	}

	function settle(topic, requestId, ok, payload) {
		if (ok) {
			values[topic] = payload;
		}
		var entry = pending.get(requestId);
		if (!entry) {
			return;
		}
		pending.delete(requestId);
		if (ok) {
			entry.resolve(payload);
		} else {
			entry.reject(payload);
		}
	}

	var bridge = { __installed: true };
"#;

const RUNTIME_EPILOGUE: &str = r#"
	window.__NAMESPACE__ = bridge;
})();
true;
"#;

/// Generates the injected runtime script.
///
/// # Examples
///
/// ```
/// use superapp_bridge::RuntimeGenerator;
///
/// let script = RuntimeGenerator::new().namespace("nativebridge").generate();
/// assert!(script.contains("requestToken"));
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeGenerator {
	namespace: String,
	transport: String,
}

impl Default for RuntimeGenerator {
	fn default() -> Self {
		Self {
			namespace: DEFAULT_NAMESPACE.to_string(),
			transport: DEFAULT_TRANSPORT.to_string(),
		}
	}
}

impl RuntimeGenerator {
	/// Creates a generator with the default namespace and transport.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the global object name.
	pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = namespace.into();
		self
	}

	/// Sets the transport function expression.
	pub fn transport(mut self, transport: impl Into<String>) -> Self {
		self.transport = transport.into();
		self
	}

	/// The configured namespace.
	pub fn namespace_name(&self) -> &str {
		&self.namespace
	}

	/// Produces the script for every registered topic.
	pub fn generate(&self) -> String {
		let mut js = RUNTIME_PRELUDE
			.replace("__NAMESPACE__", &self.namespace)
			.replace("__TRANSPORT__", &self.transport);

		for descriptor in TopicRegistry::descriptors() {
			js.push_str(&Self::topic_methods(descriptor));
		}

		js.push_str(&RUNTIME_EPILOGUE.replace("__NAMESPACE__", &self.namespace));
		js
	}

	fn topic_methods(descriptor: &TopicDescriptor) -> String {
		let topic = descriptor.topic.as_str();
		let names = &descriptor.methods;
		let issue = if descriptor.settles { "request" } else { "notify" };

		let mut js = format!("\n\t// {}\n", topic);
		js.push_str(&format!(
			"\tbridge.{} = function(data) {{ return {}(\"{}\", data); }};\n",
			names.request, issue, topic
		));
		js.push_str(&format!(
			"\tbridge.{} = function(data, requestId) {{ settle(\"{}\", requestId, true, data); }};\n",
			names.resolve, topic
		));
		js.push_str(&format!(
			"\tbridge.{} = function(error, requestId) {{ settle(\"{}\", requestId, false, error); }};\n",
			names.reject, topic
		));
		js.push_str(&format!(
			"\tbridge.{} = function() {{ return values[\"{}\"]; }};\n",
			names.get, topic
		));
		js
	}
}

/// Generates the runtime with default settings.
pub fn generate_injected_runtime() -> String {
	RuntimeGenerator::new().generate()
}
