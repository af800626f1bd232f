//! Thread-safe in-memory [`CredentialStore`] for tests and ephemeral sessions.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	id::Namespace,
	store::{CredentialStore, StoreError},
};

type StoreMap = Arc<RwLock<HashMap<Namespace, Credential>>>;

/// Storage backend that keeps records in-process; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of namespaces currently holding a record.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no namespace holds a record.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl CredentialStore for MemoryStore {
	fn load(&self, namespace: &Namespace) -> Result<Option<Credential>, StoreError> {
		Ok(self.0.read().get(namespace).cloned())
	}

	fn save(&self, namespace: &Namespace, credential: &Credential) -> Result<(), StoreError> {
		self.0.write().insert(namespace.clone(), credential.clone());

		Ok(())
	}

	fn remove(&self, namespace: &Namespace) -> Result<Option<Credential>, StoreError> {
		Ok(self.0.write().remove(namespace))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn clones_share_records() {
		let store = MemoryStore::default();
		let twin = store.clone();
		let namespace = Namespace::default();

		store
			.save(&namespace, &Credential::default())
			.expect("Saving into memory store should succeed.");

		assert_eq!(twin.len(), 1);
		assert_eq!(
			twin.load(&namespace).expect("Loading from memory store should succeed."),
			Some(Credential::default())
		);
		assert_eq!(
			twin.remove(&namespace).expect("Removing from memory store should succeed."),
			Some(Credential::default())
		);
		assert!(store.is_empty());
	}
}
