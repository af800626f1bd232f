//! Stored comment rows.

// self
use crate::{
	_prelude::*,
	id::{CommentId, ContentId, UserId},
};

/// Error returned when parsing an unknown enum label.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown {kind} `{value}`.")]
pub struct UnknownLabelError {
	/// Which label set was parsed.
	pub kind: &'static str,
	/// Rejected input.
	pub value: String,
}

/// Kind of catalog item a comment thread belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
	/// Artist page.
	Artist,
	/// Album page.
	Album,
	/// Single track.
	Song,
	/// Compilation release.
	Compilation,
	/// Single release.
	Single,
}
impl ContentType {
	/// Every content type.
	pub const ALL: [Self; 5] =
		[Self::Artist, Self::Album, Self::Song, Self::Compilation, Self::Single];

	/// Returns the stable wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			ContentType::Artist => "artist",
			ContentType::Album => "album",
			ContentType::Song => "song",
			ContentType::Compilation => "compilation",
			ContentType::Single => "single",
		}
	}
}
impl Display for ContentType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for ContentType {
	type Err = UnknownLabelError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|kind| kind.as_str() == s)
			.ok_or_else(|| UnknownLabelError { kind: "content type", value: s.to_owned() })
	}
}

/// A stored comment on a content item.
///
/// Identity (`id`, `content_type`, `content_id`, author, `parent_id`) never changes after
/// creation. `reply_count` is a denormalized counter that writers keep equal to the number of
/// non-deleted direct replies; see [`reply_count_drift`](crate::comment::reply_count_drift).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
	/// Row identifier.
	pub id: CommentId,
	/// Kind of item commented on.
	pub content_type: ContentType,
	/// Item commented on.
	pub content_id: ContentId,
	/// Author's user identifier.
	pub author_user_id: UserId,
	/// Author's display name at write time.
	pub author_username: String,
	/// Body text.
	pub text: String,
	/// Text changed after creation.
	#[serde(default)]
	pub edited: bool,
	/// Pinned to the top of the thread.
	#[serde(default)]
	pub pinned: bool,
	/// Soft-deleted; kept so replies stay threaded.
	#[serde(default)]
	pub deleted: bool,
	/// Flagged by another user.
	#[serde(default)]
	pub reported: bool,
	/// Creation instant.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	/// Last mutation instant.
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
	/// Comment this one replies to.
	#[serde(default)]
	pub parent_id: Option<CommentId>,
	/// Cached count of non-deleted direct replies.
	#[serde(default)]
	pub reply_count: u32,
}
impl Comment {
	/// Returns `true` when this comment replies to another.
	pub fn is_reply(&self) -> bool {
		self.parent_id.is_some()
	}

	/// Returns `true` when this comment sits on the given content item.
	pub fn is_on(&self, content_type: ContentType, content_id: &ContentId) -> bool {
		self.content_type == content_type && &self.content_id == content_id
	}
}
