//! Durable key-value persistence for credential records.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::Credential, id::Namespace};

/// Storage backend contract for namespaced credential records.
///
/// One record per namespace; `save` replaces whatever was there.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Reads the record stored under `namespace`, if any.
	fn load(&self, namespace: &Namespace) -> Result<Option<Credential>, StoreError>;

	/// Persists or replaces the record stored under `namespace`.
	fn save(&self, namespace: &Namespace, credential: &Credential) -> Result<(), StoreError>;

	/// Deletes the record stored under `namespace`, returning it when present.
	fn remove(&self, namespace: &Namespace) -> Result<Option<Credential>, StoreError>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
