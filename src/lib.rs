//! Client-side core for media apps: an OAuth credential lifecycle backed by durable stores, and
//! threaded comment trees with per-reaction summaries.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod comment;
pub mod error;
pub mod id;
pub mod obs;
pub mod store;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}
