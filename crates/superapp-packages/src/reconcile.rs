//! Merging a persisted catalog with a freshly fetched one.

use crate::model::MicroApp;
use crate::queue::InstallRequest;

/// Result of [`reconcile`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
	/// The merged catalog, in remote order.
	pub catalog: Vec<MicroApp>,
	/// Installed apps whose remote version differs from the local one.
	pub updates: Vec<InstallRequest>,
	/// Ids only present remotely.
	pub added: Vec<String>,
	/// Ids only present locally.
	pub dropped: Vec<String>,
}

/// Merges `local` into `remote`.
///
/// The remote catalog decides which apps exist and carries their metadata.
/// Local install state (status, locator, client id, token) is kept until an
/// update install replaces it. An installed app whose newest remote version
/// string differs from the local one yields exactly one update request.
/// Apps present on both sides but not installed locally get no update request;
/// they are only refreshed in the catalog and install on demand.
pub fn reconcile(local: &[MicroApp], remote: Vec<MicroApp>) -> ReconcileOutcome {
	let mut outcome = ReconcileOutcome::default();

	for mut incoming in remote {
		match local.iter().find(|a| a.app_id == incoming.app_id) {
			Some(existing) => {
				if existing.is_downloaded() && existing.latest_version() != incoming.latest_version() {
					tracing::info!(
						app_id = %incoming.app_id,
						from = existing.latest_version().unwrap_or_default(),
						to = incoming.latest_version().unwrap_or_default(),
						"micro-app update available"
					);
					outcome.updates.push(InstallRequest::new(
						incoming.app_id.clone(),
						incoming.download_url().unwrap_or_default(),
					));
				}
				incoming.status = existing.status;
				incoming.web_view_uri = existing.web_view_uri.clone();
				incoming.client_id = existing.client_id.clone();
				incoming.exchanged_token = existing.exchanged_token.clone();
			}
			None => {
				incoming.mark_removed();
				outcome.added.push(incoming.app_id.clone());
			}
		}
		outcome.catalog.push(incoming);
	}

	outcome.dropped = local
		.iter()
		.filter(|a| !outcome.catalog.iter().any(|c| c.app_id == a.app_id))
		.map(|a| a.app_id.clone())
		.collect();
	outcome
}
