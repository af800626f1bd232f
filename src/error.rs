//! Crate-level error types shared by the credential lifecycle, stores, and comment inputs.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Comment create/update input was rejected.
	#[error(transparent)]
	Validation(#[from] crate::comment::ValidationError),
	/// Identifier could not be parsed.
	#[error(transparent)]
	Identifier(#[from] crate::id::IdentifierError),

	/// Caller needs credentials but none are held.
	#[error("No authenticated credential is available.")]
	NotAuthenticated,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{comment::ValidationError, store::StoreError};

	#[test]
	fn store_error_converts_with_source() {
		let store_error = StoreError::Backend { message: "disk unplugged".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("disk unplugged"));

		let source =
			StdError::source(&error).expect("Storage errors should expose the store error.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn validation_error_is_transparent() {
		let error: Error = ValidationError::EmptyText.into();

		assert_eq!(error.to_string(), ValidationError::EmptyText.to_string());
	}
}
