use async_trait::async_trait;
use serde_json::{Value, json};

use crate::context::BridgeContext;
use crate::dispatcher::BridgeHandler;

/// `QR_code`: opens the scanner and parks the request until a scan completes
/// or the user cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct QrCodeHandler;

#[async_trait]
impl BridgeHandler for QrCodeHandler {
	async fn handle(&self, _data: Value, ctx: BridgeContext) {
		let scanner = ctx.scanner().clone();
		scanner.arm(ctx.into_responder());
	}
}

// Fixed payload until the authenticator migration flow is wired to a real
// export source.
const MIGRATION_MOCK: &str = "otpauth-migration://offline?data=CjEKCkhlbGxvId6tvu8SEnRlc3RAZXhhbXBsZS5jb20aB0V4YW1wbGUgASgBMAIQARgBIAA%3D";

/// `totp_qr_migration_data`: answers with a mock migration payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct TotpQrMigrationDataHandler;

#[async_trait]
impl BridgeHandler for TotpQrMigrationDataHandler {
	async fn handle(&self, _data: Value, ctx: BridgeContext) {
		ctx.resolve(json!({ "data": MIGRATION_MOCK }));
	}
}
