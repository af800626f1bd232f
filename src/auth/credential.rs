//! Credential state for the third-party video platform and its freshness queries.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Early-refresh margin applied by [`Credential::needs_refresh_at`] unless configured otherwise.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::minutes(5);

/// Freshness of a credential at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
	/// No expiry has ever been recorded (never issued or cleared).
	Missing,
	/// Token is valid and outside the early-refresh margin.
	Fresh,
	/// Token is still valid but inside the early-refresh margin.
	RefreshDue,
	/// Token reached its expiry instant.
	Expired,
}

/// Errors raised when a persisted record breaks credential invariants.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CredentialError {
	/// Record claims to be authenticated but carries no access token.
	#[error("Authenticated credential record is missing an access token.")]
	AuthenticatedWithoutAccessToken,
}

/// Profile of the account the credential belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
	/// Provider-side account identifier.
	pub id: String,
	/// Account e-mail address.
	pub email: String,
	/// Display name.
	pub name: String,
	/// Avatar URL, when the provider returns one.
	#[serde(rename = "picture", default)]
	pub picture_url: Option<String>,
}

/// OAuth credential for exactly one external account.
///
/// `authenticated` implies an access token is present; the type only exposes mutators that keep
/// that true, and deserialization rejects records that break it.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CredentialRecord", into = "CredentialRecord")]
pub struct Credential {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	expires_at_ms: Option<i64>,
	authenticated: bool,
	user_info: Option<UserInfo>,
}
impl Credential {
	/// Access token, when one has been issued.
	pub fn access_token(&self) -> Option<&TokenSecret> {
		self.access_token.as_ref()
	}

	/// Refresh token, when one has been issued.
	pub fn refresh_token(&self) -> Option<&TokenSecret> {
		self.refresh_token.as_ref()
	}

	/// Expiry as Unix epoch milliseconds.
	pub fn expires_at_epoch_ms(&self) -> Option<i64> {
		self.expires_at_ms
	}

	/// Expiry as an instant; `None` when absent or outside the representable range.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_at_ms.and_then(|ms| {
			OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).ok()
		})
	}

	/// Whether tokens have been set since the last clear.
	pub fn is_authenticated(&self) -> bool {
		self.authenticated
	}

	/// Profile attached via [`TokenLifecycle::set_user_info`](crate::auth::TokenLifecycle::set_user_info).
	pub fn user_info(&self) -> Option<&UserInfo> {
		self.user_info.as_ref()
	}

	/// Returns `true` when no expiry is recorded or `instant` reached it.
	pub fn is_token_expired_at(&self, instant: OffsetDateTime) -> bool {
		match self.expires_at_ms {
			Some(expires_at) => epoch_ms(instant) >= expires_at,
			None => true,
		}
	}

	/// Returns `true` when no expiry is recorded or `instant` is within `margin` of it.
	///
	/// Negative margins are treated as zero so this stays a superset of
	/// [`is_token_expired_at`](Self::is_token_expired_at).
	pub fn needs_refresh_at(&self, instant: OffsetDateTime, margin: Duration) -> bool {
		match self.expires_at_ms {
			Some(expires_at) => epoch_ms(instant) >= expires_at.saturating_sub(margin_ms(margin)),
			None => true,
		}
	}

	/// Summarizes freshness at `instant`.
	pub fn status_at(&self, instant: OffsetDateTime, margin: Duration) -> CredentialStatus {
		if self.expires_at_ms.is_none() {
			return CredentialStatus::Missing;
		}
		if self.is_token_expired_at(instant) {
			return CredentialStatus::Expired;
		}
		if self.needs_refresh_at(instant, margin) {
			return CredentialStatus::RefreshDue;
		}

		CredentialStatus::Fresh
	}

	pub(crate) fn issue(
		&mut self,
		access_token: TokenSecret,
		refresh_token: Option<TokenSecret>,
		expires_in_secs: i64,
		issued_at: OffsetDateTime,
	) {
		self.access_token = Some(access_token);
		self.refresh_token = refresh_token;
		self.expires_at_ms =
			Some(epoch_ms(issued_at).saturating_add(expires_in_secs.saturating_mul(1_000)));
		self.authenticated = true;
	}

	pub(crate) fn set_user_info(&mut self, info: Option<UserInfo>) {
		self.user_info = info;
	}

	pub(crate) fn clear(&mut self) {
		*self = Self::default();
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at_ms", &self.expires_at_ms)
			.field("authenticated", &self.authenticated)
			.field("user_info", &self.user_info)
			.finish()
	}
}
impl TryFrom<CredentialRecord> for Credential {
	type Error = CredentialError;

	fn try_from(record: CredentialRecord) -> Result<Self, Self::Error> {
		if record.is_authenticated && record.access_token.is_none() {
			return Err(CredentialError::AuthenticatedWithoutAccessToken);
		}

		Ok(Self {
			access_token: record.access_token,
			refresh_token: record.refresh_token,
			expires_at_ms: record.expires_at,
			authenticated: record.is_authenticated,
			user_info: record.user_info,
		})
	}
}

// Persisted shape; keys match the record the web client writes.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialRecord {
	#[serde(default)]
	access_token: Option<TokenSecret>,
	#[serde(default)]
	refresh_token: Option<TokenSecret>,
	#[serde(default)]
	expires_at: Option<i64>,
	#[serde(default)]
	is_authenticated: bool,
	#[serde(default)]
	user_info: Option<UserInfo>,
}
impl From<Credential> for CredentialRecord {
	fn from(credential: Credential) -> Self {
		Self {
			access_token: credential.access_token,
			refresh_token: credential.refresh_token,
			expires_at: credential.expires_at_ms,
			is_authenticated: credential.authenticated,
			user_info: credential.user_info,
		}
	}
}

pub(crate) fn epoch_ms(instant: OffsetDateTime) -> i64 {
	(instant.unix_timestamp_nanos() / 1_000_000) as i64
}

fn margin_ms(margin: Duration) -> i64 {
	if margin.is_negative() {
		return 0;
	}

	i64::try_from(margin.whole_milliseconds()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn issued(expires_in_secs: i64, at: OffsetDateTime) -> Credential {
		let mut credential = Credential::default();

		credential.issue(
			TokenSecret::new("access"),
			Some(TokenSecret::new("refresh")),
			expires_in_secs,
			at,
		);

		credential
	}

	#[test]
	fn expiry_is_issue_time_plus_lifetime() {
		let at = macros::datetime!(2025-01-01 00:00 UTC);
		let credential = issued(3_600, at);

		assert_eq!(credential.expires_at(), Some(macros::datetime!(2025-01-01 01:00 UTC)));
		assert_eq!(credential.expires_at_epoch_ms(), Some(epoch_ms(at) + 3_600_000));
	}

	#[test]
	fn status_transitions_cover_all_states() {
		let at = macros::datetime!(2025-01-01 00:00 UTC);
		let credential = issued(3_600, at);
		let margin = DEFAULT_REFRESH_MARGIN;

		assert_eq!(Credential::default().status_at(at, margin), CredentialStatus::Missing);
		assert_eq!(credential.status_at(at, margin), CredentialStatus::Fresh);
		assert_eq!(
			credential.status_at(macros::datetime!(2025-01-01 00:55 UTC), margin),
			CredentialStatus::RefreshDue
		);
		assert_eq!(
			credential.status_at(macros::datetime!(2025-01-01 01:00 UTC), margin),
			CredentialStatus::Expired
		);
	}

	#[test]
	fn refresh_margin_boundary_is_inclusive() {
		let at = macros::datetime!(2025-01-01 00:00 UTC);
		let credential = issued(3_600, at);

		assert!(!credential.needs_refresh_at(
			macros::datetime!(2025-01-01 00:54:59.999 UTC),
			DEFAULT_REFRESH_MARGIN
		));
		assert!(
			credential
				.needs_refresh_at(macros::datetime!(2025-01-01 00:55 UTC), DEFAULT_REFRESH_MARGIN)
		);
	}

	#[test]
	fn negative_margin_keeps_monotonicity() {
		let at = macros::datetime!(2025-01-01 00:00 UTC);
		let credential = issued(60, at);
		let expired_at = macros::datetime!(2025-01-01 00:01 UTC);

		assert!(credential.is_token_expired_at(expired_at));
		assert!(credential.needs_refresh_at(expired_at, Duration::minutes(-10)));
	}

	#[test]
	fn oversized_margin_saturates() {
		let at = macros::datetime!(2025-01-01 00:00 UTC);
		let credential = issued(60, at);
		let expired_at = macros::datetime!(2025-01-01 00:01 UTC);

		assert!(credential.is_token_expired_at(expired_at));
		assert!(credential.needs_refresh_at(expired_at, Duration::MAX));
		assert!(credential.needs_refresh_at(at, Duration::MAX));
		assert_eq!(margin_ms(Duration::MAX), i64::MAX);
	}

	#[test]
	fn debug_redacts_secrets() {
		let credential = issued(60, OffsetDateTime::now_utc());
		let rendered = format!("{credential:?}");

		assert!(!rendered.contains("access\""));
		assert!(rendered.contains("<redacted>"));
	}

	#[test]
	fn persisted_shape_uses_client_keys() {
		let mut credential = issued(60, macros::datetime!(2025-01-01 00:00 UTC));

		credential.set_user_info(Some(UserInfo {
			id: "yt-1".into(),
			email: "listener@example.com".into(),
			name: "Listener".into(),
			picture_url: None,
		}));

		let value = serde_json::to_value(&credential).expect("Credential should serialize.");

		assert_eq!(value["accessToken"], "access");
		assert_eq!(value["refreshToken"], "refresh");
		assert_eq!(value["isAuthenticated"], true);
		assert_eq!(value["userInfo"]["email"], "listener@example.com");

		let back: Credential =
			serde_json::from_value(value).expect("Serialized credential should deserialize.");

		assert_eq!(back, credential);
	}

	#[test]
	fn authenticated_record_without_access_token_is_rejected() {
		let payload = r#"{"accessToken":null,"isAuthenticated":true}"#;

		assert!(serde_json::from_str::<Credential>(payload).is_err());

		let empty: Credential =
			serde_json::from_str("{}").expect("Empty record should deserialize.");

		assert_eq!(empty, Credential::default());
	}
}
