//! Optional observability helpers for credential and comment operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to emit structured spans named `resonance.op` with the `op` and
//!   `stage` fields, plus warnings when a credential flush fails.
//! - Enable `metrics` to increment the `resonance_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Full token issuance.
	SetTokens,
	/// Access-token-only refresh.
	SetAccessToken,
	/// Profile update.
	SetUserInfo,
	/// Credential reset.
	ClearAuth,
	/// Credential rehydration from the store.
	LoadCredential,
	/// Explicit credential flush.
	SaveCredential,
	/// Comment tree aggregation.
	Aggregate,
	/// Comment creation input validation.
	CreateComment,
	/// Comment update input validation/application.
	UpdateComment,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::SetTokens => "set_tokens",
			Operation::SetAccessToken => "set_access_token",
			Operation::SetUserInfo => "set_user_info",
			Operation::ClearAuth => "clear_auth",
			Operation::LoadCredential => "load_credential",
			Operation::SaveCredential => "save_credential",
			Operation::Aggregate => "aggregate",
			Operation::CreateComment => "create_comment",
			Operation::UpdateComment => "update_comment",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure, whether propagated or swallowed.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
