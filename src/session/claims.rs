//! Best-effort extraction of the expiry claim embedded in JWT access tokens.
//!
//! Decoding is strictly local bookkeeping: signatures are never verified and a token that fails
//! to decode simply yields no expiry. The server stays authoritative over token validity.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::_prelude::*;

#[derive(Deserialize)]
struct RegisteredClaims {
	#[serde(default)]
	exp: Option<i64>,
}

/// Decodes the `exp` claim from a compact JWT, returning `None` for opaque tokens.
pub fn expiry_claim(token: &str) -> Option<OffsetDateTime> {
	let mut segments = token.split('.');
	let _header = segments.next()?;
	let payload = segments.next()?;

	// Compact JWS is exactly header.payload.signature.
	if segments.next().is_none() || segments.next().is_some() {
		return None;
	}

	let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
	let claims: RegisteredClaims = serde_json::from_slice(&bytes).ok()?;

	OffsetDateTime::from_unix_timestamp(claims.exp?).ok()
}
