//! Strongly typed identifiers for comments, users, content items, and store namespaces.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $rule:expr) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, $rule, view)?;

				Ok(Self(view.to_owned()))
			}

			/// Borrows the identifier as a string slice.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, $rule, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

/// Namespace of the video-platform credential record.
pub const DEFAULT_NAMESPACE: &str = "youtube-auth-storage";

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (comment, user, content, namespace).
		kind: &'static str,
	},
	/// A namespace contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (comment, user, content, namespace).
		kind: &'static str,
	},
	/// The identifier starts or ends with whitespace.
	#[error("{kind} identifier has surrounding whitespace.")]
	Padded {
		/// Kind of identifier (comment, user, content, namespace).
		kind: &'static str,
	},
	/// The identifier contains control characters.
	#[error("{kind} identifier contains control characters.")]
	ContainsControl {
		/// Kind of identifier (comment, user, content, namespace).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed byte length.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (comment, user, content, namespace).
		kind: &'static str,
		/// Maximum permitted length.
		max: usize,
	},
}

def_id! { CommentId, "Unique identifier for a comment row.", "Comment", Rule::Opaque }
def_id! {
	UserId,
	"Identifier of an application user (comment author or reactor).",
	"User",
	Rule::Opaque
}
def_id! {
	ContentId,
	"Identifier of the content item a comment thread hangs off.",
	"Content",
	Rule::Opaque
}
def_id! { Namespace, "Key under which a credential record is persisted.", "Namespace", Rule::Compact }
impl Default for Namespace {
	fn default() -> Self {
		Self(DEFAULT_NAMESPACE.into())
	}
}

// Storage-assigned ids are opaque and may carry interior spaces; store keys may not.
#[derive(Clone, Copy)]
enum Rule {
	Opaque,
	Compact,
}

fn validate_view(kind: &'static str, rule: Rule, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_control) {
		return Err(IdentifierError::ContainsControl { kind });
	}
	if matches!(rule, Rule::Compact) && view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.trim() != view {
		return Err(IdentifierError::Padded { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}
