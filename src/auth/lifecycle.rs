//! Credential lifecycle bound to a durable store.
//!
//! [`TokenLifecycle`] owns the single [`Credential`] for one external account. Mutations take
//! `&mut self`, so whoever holds the lifecycle (normally the token-refresh flow) is the only
//! writer; readers that need shared access wrap it in a lock of their choosing. Every mutation
//! changes the in-memory credential first and then flushes the full record to the store under
//! the configured namespace. Flush failures never surface from mutators: they are counted in
//! [`PersistMetrics`] and logged, and callers that need a hard guarantee call
//! [`TokenLifecycle::save`] explicitly.

mod metrics;

pub use metrics::PersistMetrics;

// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialStatus, DEFAULT_REFRESH_MARGIN, TokenSecret, UserInfo},
	id::Namespace,
	obs::{self, OpSpan, Operation, Outcome},
	store::CredentialStore,
};

/// Tunables for a [`TokenLifecycle`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LifecycleConfig {
	/// Store key the credential record lives under.
	pub namespace: Namespace,
	/// How long before expiry [`TokenLifecycle::needs_refresh`] starts returning `true`.
	pub refresh_margin: Duration,
}
impl LifecycleConfig {
	/// Creates a config for the provided namespace with the default refresh margin.
	pub fn new(namespace: Namespace) -> Self {
		Self { namespace, refresh_margin: DEFAULT_REFRESH_MARGIN }
	}

	/// Overrides the early-refresh margin (defaults to 5 minutes; negative values clamp to zero).
	pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
		self.refresh_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}
}
impl Default for LifecycleConfig {
	fn default() -> Self {
		Self::new(Namespace::default())
	}
}

/// Holds and answers freshness queries about one set of OAuth credentials.
pub struct TokenLifecycle {
	config: LifecycleConfig,
	store: Arc<dyn CredentialStore>,
	credential: Credential,
	persist_metrics: Arc<PersistMetrics>,
}
impl TokenLifecycle {
	/// Creates an empty lifecycle over `store` using the default config.
	///
	/// Nothing is read from the store until [`load`](Self::load) runs.
	pub fn new(store: Arc<dyn CredentialStore>) -> Self {
		Self::with_config(store, LifecycleConfig::default())
	}

	/// Creates an empty lifecycle over `store` with an explicit config.
	pub fn with_config(store: Arc<dyn CredentialStore>, config: LifecycleConfig) -> Self {
		Self {
			config,
			store,
			credential: Credential::default(),
			persist_metrics: Default::default(),
		}
	}

	/// Creates a lifecycle and immediately rehydrates it from `store`.
	pub fn open(store: Arc<dyn CredentialStore>, config: LifecycleConfig) -> Result<Self> {
		let mut lifecycle = Self::with_config(store, config);

		lifecycle.load()?;

		Ok(lifecycle)
	}

	/// Replaces the in-memory credential with the persisted record.
	///
	/// A missing record resets to the empty credential. On error the in-memory state is left
	/// untouched.
	pub fn load(&mut self) -> Result<()> {
		const OP: Operation = Operation::LoadCredential;

		let _span = OpSpan::new(OP, "load").entered();

		obs::record_op_outcome(OP, Outcome::Attempt);

		match self.store.load(&self.config.namespace) {
			Ok(record) => {
				self.credential = record.unwrap_or_default();

				obs::record_op_outcome(OP, Outcome::Success);

				Ok(())
			},
			Err(e) => {
				obs::record_op_outcome(OP, Outcome::Failure);

				Err(e.into())
			},
		}
	}

	/// Flushes the current credential to the store, surfacing failures.
	pub fn save(&self) -> Result<()> {
		const OP: Operation = Operation::SaveCredential;

		let _span = OpSpan::new(OP, "save").entered();

		obs::record_op_outcome(OP, Outcome::Attempt);
		self.persist_metrics.record_attempt();

		match self.store.save(&self.config.namespace, &self.credential) {
			Ok(()) => {
				self.persist_metrics.record_success();
				obs::record_op_outcome(OP, Outcome::Success);

				Ok(())
			},
			Err(e) => {
				self.persist_metrics.record_failure();
				obs::record_op_outcome(OP, Outcome::Failure);

				Err(e.into())
			},
		}
	}

	/// Current credential snapshot.
	pub fn credential(&self) -> &Credential {
		&self.credential
	}

	/// Config this lifecycle was built with.
	pub fn config(&self) -> &LifecycleConfig {
		&self.config
	}

	/// Flush counters shared with clones of the returned handle.
	pub fn persist_metrics(&self) -> Arc<PersistMetrics> {
		self.persist_metrics.clone()
	}

	/// Stores a freshly issued token pair, stamping expiry from the current clock.
	pub fn set_tokens(
		&mut self,
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
		expires_in_secs: i64,
	) {
		self.set_tokens_at(access_token, refresh_token, expires_in_secs, OffsetDateTime::now_utc());
	}

	/// Stores a token pair issued at `issued_at`.
	///
	/// Overwrites tokens and expiry unconditionally and marks the credential authenticated; the
	/// attached [`UserInfo`] is kept.
	pub fn set_tokens_at(
		&mut self,
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
		expires_in_secs: i64,
		issued_at: OffsetDateTime,
	) {
		let _span = OpSpan::new(Operation::SetTokens, "set_tokens").entered();

		self.credential.issue(
			TokenSecret::new(access_token),
			Some(TokenSecret::new(refresh_token)),
			expires_in_secs,
			issued_at,
		);
		self.flush(Operation::SetTokens);
	}

	/// Stores a refreshed access token, keeping the current refresh token.
	pub fn set_access_token(&mut self, access_token: impl Into<String>, expires_in_secs: i64) {
		self.set_access_token_at(access_token, expires_in_secs, OffsetDateTime::now_utc());
	}

	/// Stores a refreshed access token issued at `issued_at`, keeping the current refresh token.
	pub fn set_access_token_at(
		&mut self,
		access_token: impl Into<String>,
		expires_in_secs: i64,
		issued_at: OffsetDateTime,
	) {
		let _span = OpSpan::new(Operation::SetAccessToken, "set_access_token").entered();
		let refresh_token = self.credential.refresh_token().cloned();

		self.credential.issue(
			TokenSecret::new(access_token),
			refresh_token,
			expires_in_secs,
			issued_at,
		);
		self.flush(Operation::SetAccessToken);
	}

	/// Replaces the attached profile; allowed whether or not tokens are held.
	pub fn set_user_info(&mut self, info: Option<UserInfo>) {
		let _span = OpSpan::new(Operation::SetUserInfo, "set_user_info").entered();

		self.credential.set_user_info(info);
		self.flush(Operation::SetUserInfo);
	}

	/// Resets every field to absent/false. Idempotent.
	pub fn clear_auth(&mut self) {
		let _span = OpSpan::new(Operation::ClearAuth, "clear_auth").entered();

		self.credential.clear();
		self.flush(Operation::ClearAuth);
	}

	/// Returns `true` when no expiry is recorded or the token has expired.
	pub fn is_token_expired(&self) -> bool {
		self.is_token_expired_at(OffsetDateTime::now_utc())
	}

	/// [`is_token_expired`](Self::is_token_expired) evaluated at `instant`.
	pub fn is_token_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.credential.is_token_expired_at(instant)
	}

	/// Returns `true` when no expiry is recorded or expiry is within the refresh margin.
	pub fn needs_refresh(&self) -> bool {
		self.needs_refresh_at(OffsetDateTime::now_utc())
	}

	/// [`needs_refresh`](Self::needs_refresh) evaluated at `instant`.
	pub fn needs_refresh_at(&self, instant: OffsetDateTime) -> bool {
		self.credential.needs_refresh_at(instant, self.config.refresh_margin)
	}

	/// Freshness summary at the current clock.
	pub fn status(&self) -> CredentialStatus {
		self.status_at(OffsetDateTime::now_utc())
	}

	/// Freshness summary at `instant`.
	pub fn status_at(&self, instant: OffsetDateTime) -> CredentialStatus {
		self.credential.status_at(instant, self.config.refresh_margin)
	}

	/// Returns the access token for collaborators that call the provider API.
	pub fn require_access_token(&self) -> Result<&TokenSecret> {
		if !self.credential.is_authenticated() {
			return Err(Error::NotAuthenticated);
		}

		self.credential.access_token().ok_or(Error::NotAuthenticated)
	}

	fn flush(&self, op: Operation) {
		obs::record_op_outcome(op, Outcome::Attempt);
		self.persist_metrics.record_attempt();

		match self.store.save(&self.config.namespace, &self.credential) {
			Ok(()) => {
				self.persist_metrics.record_success();
				obs::record_op_outcome(op, Outcome::Success);
			},
			Err(e) => {
				self.persist_metrics.record_failure();
				obs::record_op_outcome(op, Outcome::Failure);

				#[cfg(feature = "tracing")]
				tracing::warn!(
					namespace = %self.config.namespace,
					op = op.as_str(),
					error = %e,
					"Failed to persist credential record."
				);
				#[cfg(not(feature = "tracing"))]
				let _ = e;
			},
		}
	}
}
impl Debug for TokenLifecycle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenLifecycle")
			.field("config", &self.config)
			.field("credential", &self.credential)
			.field("persist_metrics", &self.persist_metrics)
			.finish()
	}
}
