//! Static topic table.
//!
//! One descriptor per [`BridgeTopic`], built once from [`BridgeTopic::ALL`].
//! The injected runtime and the host dispatcher both read from this table, so
//! guest method names and host settle calls cannot drift apart.

use once_cell::sync::Lazy;

use crate::naming::MethodNames;
use crate::topic::BridgeTopic;

/// Canonical description of one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDescriptor {
	/// The topic.
	pub topic: BridgeTopic,
	/// Generated method names.
	pub methods: MethodNames,
	/// Whether the guest ever receives a settlement for this topic.
	pub settles: bool,
}

static DESCRIPTORS: Lazy<Vec<TopicDescriptor>> = Lazy::new(|| {
	BridgeTopic::ALL
		.iter()
		.map(|&topic| TopicDescriptor {
			topic,
			methods: MethodNames::for_topic(topic),
			settles: !matches!(topic, BridgeTopic::CloseWebview | BridgeTopic::NativeLog),
		})
		.collect()
});

/// Read access to the static topic table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopicRegistry;

impl TopicRegistry {
	/// All descriptors in publication order.
	pub fn descriptors() -> &'static [TopicDescriptor] {
		&DESCRIPTORS
	}

	/// Descriptor of `topic`.
	pub fn descriptor(topic: BridgeTopic) -> &'static TopicDescriptor {
		// `DESCRIPTORS` is built from `BridgeTopic::ALL` in order.
		let index = BridgeTopic::ALL
			.iter()
			.position(|t| *t == topic)
			.unwrap_or_default();
		&DESCRIPTORS[index]
	}

	/// Descriptor of a raw wire identifier.
	pub fn lookup(wire: &str) -> Option<&'static TopicDescriptor> {
		BridgeTopic::from_wire(wire).map(Self::descriptor)
	}
}
