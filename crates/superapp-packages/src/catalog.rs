//! Where the remote catalog comes from.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::StatusCode;
use superapp_auth::{AuthError, AuthManager, AuthResult};

use crate::error::{PackageError, PackageResult};
use crate::model::MicroApp;

/// Supplies the authoritative micro-app catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
	/// Fetches the current catalog.
	async fn fetch(&self) -> PackageResult<Vec<MicroApp>>;
}

/// A catalog held in memory.
#[derive(Debug, Default)]
pub struct StaticCatalog {
	apps: RwLock<Vec<MicroApp>>,
}

impl StaticCatalog {
	/// A catalog of `apps`.
	pub fn new(apps: Vec<MicroApp>) -> Self {
		Self {
			apps: RwLock::new(apps),
		}
	}

	/// Replaces the published catalog.
	pub fn publish(&self, apps: Vec<MicroApp>) {
		*self.apps.write() = apps;
	}
}

#[async_trait]
impl CatalogSource for StaticCatalog {
	async fn fetch(&self) -> PackageResult<Vec<MicroApp>> {
		Ok(self.apps.read().clone())
	}
}

/// Fetches the catalog as a JSON array from an HTTP endpoint.
///
/// With an [`AuthManager`] attached, the request carries the session's bearer
/// token and a `401` goes through refresh-and-retry-once.
pub struct HttpCatalogSource {
	client: reqwest::Client,
	url: String,
	auth: Option<Arc<AuthManager>>,
}

impl HttpCatalogSource {
	/// A source for `url` with the given request timeout.
	pub fn new(url: impl Into<String>, timeout: Duration) -> PackageResult<Self> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| PackageError::Catalog(e.to_string()))?;
		Ok(Self {
			client,
			url: url.into(),
			auth: None,
		})
	}

	/// Authenticates requests through `auth`.
	pub fn with_auth(mut self, auth: Arc<AuthManager>) -> Self {
		self.auth = Some(auth);
		self
	}

	/// Endpoint URL.
	pub fn url(&self) -> &str {
		&self.url
	}

	async fn get(&self, bearer: Option<String>) -> AuthResult<Vec<MicroApp>> {
		let mut request = self.client.get(&self.url);
		if let Some(token) = bearer {
			request = request.bearer_auth(token);
		}
		let response = request
			.send()
			.await
			.map_err(|e| AuthError::Operation(e.to_string()))?;

		if response.status() == StatusCode::UNAUTHORIZED {
			return Err(AuthError::Unauthorized(format!("catalog request to {}", self.url)));
		}
		let response = response
			.error_for_status()
			.map_err(|e| AuthError::Operation(e.to_string()))?;
		response
			.json::<Vec<MicroApp>>()
			.await
			.map_err(|e| AuthError::Operation(e.to_string()))
	}
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
	async fn fetch(&self) -> PackageResult<Vec<MicroApp>> {
		let result = match &self.auth {
			Some(auth) => {
				auth.call_with_refresh(|token| self.get(Some(token)))
					.await
			}
			None => self.get(None).await,
		};
		result.map_err(|e| match e {
			AuthError::Operation(reason) => PackageError::Catalog(reason),
			other => PackageError::Auth(other),
		})
	}
}

impl std::fmt::Debug for HttpCatalogSource {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HttpCatalogSource")
			.field("url", &self.url)
			.field("authenticated", &self.auth.is_some())
			.finish()
	}
}
