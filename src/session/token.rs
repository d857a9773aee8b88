//! Session token model, lifecycle helpers, and the redacted secret wrapper.

// self
use crate::{_prelude::*, session::claims};

/// Redacted access-token wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Current lifecycle status for a session token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is currently usable.
	Active,
	/// Token exceeded the expiry instant embedded in its claims.
	Expired,
	/// Token carries no readable expiry claim; the server remains the authority.
	Opaque,
}

/// Access token held for the current session, together with local bookkeeping.
///
/// The expiry instant is decoded best-effort from the token's embedded `exp` claim. Opaque
/// (non-JWT) tokens are carried as-is: the coordinator still attaches them and relies on the
/// server's authentication-failure signal to trigger a refresh.
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionToken {
	/// Bearer credential attached to outbound requests.
	pub access_token: TokenSecret,
	/// Instant at which this token was obtained (login or refresh settlement).
	pub obtained_at: OffsetDateTime,
	/// Expiry instant decoded from the token's `exp` claim, when present.
	pub expires_at: Option<OffsetDateTime>,
	/// Profile payload returned alongside the token, when the endpoint supplied one.
	pub profile: Option<UserProfile>,
}
impl SessionToken {
	/// Wraps a freshly issued access token, decoding its expiry claim when possible.
	pub fn new(access_token: impl Into<String>) -> Self {
		let access_token = access_token.into();
		let expires_at = claims::expiry_claim(&access_token);

		Self {
			access_token: TokenSecret::new(access_token),
			obtained_at: OffsetDateTime::now_utc(),
			expires_at,
			profile: None,
		}
	}

	/// Attaches the profile payload returned by the token endpoint.
	pub fn with_profile(mut self, profile: UserProfile) -> Self {
		self.profile = Some(profile);

		self
	}

	/// Overrides the obtained-at instant (primarily for deserialized fixtures).
	pub fn with_obtained_at(mut self, instant: OffsetDateTime) -> Self {
		self.obtained_at = instant;

		self
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		match self.expires_at {
			Some(expires_at) if instant >= expires_at => TokenStatus::Expired,
			Some(_) => TokenStatus::Active,
			None => TokenStatus::Opaque,
		}
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Expired)
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if the token will expire within `window` of the current clock.
	///
	/// Opaque tokens never report an upcoming expiry.
	pub fn expires_within(&self, window: Duration) -> bool {
		match self.expires_at {
			Some(expires_at) => expires_at - OffsetDateTime::now_utc() <= window,
			None => false,
		}
	}
}
impl Debug for SessionToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionToken")
			.field("access_token", &"<redacted>")
			.field("obtained_at", &self.obtained_at)
			.field("expires_at", &self.expires_at)
			.field("profile", &self.profile)
			.finish()
	}
}

/// Profile payload optionally returned by the refresh endpoint.
///
/// The struct keeps the commonly used fields typed and preserves everything else in `extra`, so
/// backend additions survive a round trip through the session store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
	/// Account email address, when supplied.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Human-readable display name, when supplied.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,
	/// Remaining profile fields, preserved verbatim.
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}
