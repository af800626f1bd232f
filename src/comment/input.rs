//! Create/update request shapes and their validation rules.

// self
use crate::{
	_prelude::*,
	comment::{Comment, ContentType},
	id::{CommentId, ContentId, UserId},
	obs::{self, OpSpan, Operation, Outcome},
};

/// Default cap on comment body length, counted in characters after trimming.
pub const DEFAULT_MAX_TEXT_CHARS: usize = 2_000;

/// Errors raised when a create/update request cannot be accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ValidationError {
	/// Body is empty or whitespace only.
	#[error("Comment text cannot be empty.")]
	EmptyText,
	/// Body is longer than the policy allows.
	#[error("Comment text has {actual} characters; the limit is {max}.")]
	TextTooLong {
		/// Policy limit.
		max: usize,
		/// Submitted length after trimming.
		actual: usize,
	},
	/// Reply target does not exist.
	#[error("Parent comment `{parent_id}` does not exist.")]
	ParentNotFound {
		/// Requested parent.
		parent_id: CommentId,
	},
	/// Reply target was deleted.
	#[error("Parent comment `{parent_id}` has been deleted.")]
	ParentDeleted {
		/// Requested parent.
		parent_id: CommentId,
	},
	/// Reply target belongs to a different content item.
	#[error("Parent comment `{parent_id}` belongs to a different content item.")]
	ParentOnOtherContent {
		/// Requested parent.
		parent_id: CommentId,
	},
	/// Update targets a deleted comment.
	#[error("Comment `{comment_id}` has been deleted.")]
	CommentDeleted {
		/// Targeted comment.
		comment_id: CommentId,
	},
}

/// Limits applied to comment bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommentPolicy {
	/// Maximum body length in characters after trimming.
	pub max_text_chars: usize,
}
impl CommentPolicy {
	/// Overrides the body length cap.
	pub fn with_max_text_chars(mut self, max: usize) -> Self {
		self.max_text_chars = max;

		self
	}

	fn check_text(&self, text: &str) -> Result<(), ValidationError> {
		let trimmed = text.trim();

		if trimmed.is_empty() {
			return Err(ValidationError::EmptyText);
		}

		let actual = trimmed.chars().count();

		if actual > self.max_text_chars {
			return Err(ValidationError::TextTooLong { max: self.max_text_chars, actual });
		}

		Ok(())
	}
}
impl Default for CommentPolicy {
	fn default() -> Self {
		Self { max_text_chars: DEFAULT_MAX_TEXT_CHARS }
	}
}

/// Author stamped onto new comments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentAuthor {
	/// Author's user identifier.
	pub user_id: UserId,
	/// Author's display name.
	pub username: String,
}
impl CommentAuthor {
	/// Creates an author record.
	pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
		Self { user_id, username: username.into() }
	}
}

/// Request to post a comment or a reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCommentInput {
	/// Kind of item commented on.
	pub content_type: ContentType,
	/// Item commented on.
	pub content_id: ContentId,
	/// Body text.
	pub text: String,
	/// Comment being replied to.
	#[serde(default)]
	pub parent_id: Option<CommentId>,
}
impl CreateCommentInput {
	/// Creates a top-level comment request.
	pub fn new(content_type: ContentType, content_id: ContentId, text: impl Into<String>) -> Self {
		Self { content_type, content_id, text: text.into(), parent_id: None }
	}

	/// Turns the request into a reply to `parent_id`.
	pub fn reply_to(mut self, parent_id: CommentId) -> Self {
		self.parent_id = Some(parent_id);

		self
	}

	/// Validates against the default [`CommentPolicy`].
	pub fn validate(&self, thread: &[Comment]) -> Result<(), ValidationError> {
		self.validate_with(thread, &CommentPolicy::default())
	}

	/// Validates the body and, for replies, that the parent is a live comment on the same item.
	///
	/// `thread` is whatever the caller fetched for the content item; only the parent lookup
	/// reads it.
	pub fn validate_with(
		&self,
		thread: &[Comment],
		policy: &CommentPolicy,
	) -> Result<(), ValidationError> {
		const OP: Operation = Operation::CreateComment;

		let _span = OpSpan::new(OP, "validate").entered();

		obs::record_op_outcome(OP, Outcome::Attempt);

		let result = self.check(thread, policy);

		record_validation(OP, &result);

		result
	}

	/// Builds the stored row for a request that already passed validation.
	pub fn into_comment(
		self,
		id: CommentId,
		author: CommentAuthor,
		created_at: OffsetDateTime,
	) -> Comment {
		Comment {
			id,
			content_type: self.content_type,
			content_id: self.content_id,
			author_user_id: author.user_id,
			author_username: author.username,
			text: self.text,
			edited: false,
			pinned: false,
			deleted: false,
			reported: false,
			created_at,
			updated_at: created_at,
			parent_id: self.parent_id,
			reply_count: 0,
		}
	}

	/// Validates, then builds the stored row.
	pub fn create(
		self,
		thread: &[Comment],
		policy: &CommentPolicy,
		id: CommentId,
		author: CommentAuthor,
		created_at: OffsetDateTime,
	) -> Result<Comment, ValidationError> {
		self.validate_with(thread, policy)?;

		Ok(self.into_comment(id, author, created_at))
	}

	fn check(&self, thread: &[Comment], policy: &CommentPolicy) -> Result<(), ValidationError> {
		policy.check_text(&self.text)?;

		let Some(parent_id) = &self.parent_id else {
			return Ok(());
		};
		let parent = thread
			.iter()
			.find(|comment| &comment.id == parent_id)
			.ok_or_else(|| ValidationError::ParentNotFound { parent_id: parent_id.clone() })?;

		if !parent.is_on(self.content_type, &self.content_id) {
			return Err(ValidationError::ParentOnOtherContent { parent_id: parent_id.clone() });
		}
		if parent.deleted {
			return Err(ValidationError::ParentDeleted { parent_id: parent_id.clone() });
		}

		Ok(())
	}
}

/// Partial update of a comment's mutable fields.
///
/// Parent and content identity are not part of the shape and cannot change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCommentInput {
	/// Replacement body text.
	#[serde(default)]
	pub text: Option<String>,
	/// New pinned flag.
	#[serde(default)]
	pub pinned: Option<bool>,
}
impl UpdateCommentInput {
	/// Sets the replacement body text.
	pub fn with_text(mut self, text: impl Into<String>) -> Self {
		self.text = Some(text.into());

		self
	}

	/// Sets the pinned flag.
	pub fn with_pinned(mut self, pinned: bool) -> Self {
		self.pinned = Some(pinned);

		self
	}

	/// Returns `true` when no field is set. Empty updates are still accepted.
	pub fn is_empty(&self) -> bool {
		self.text.is_none() && self.pinned.is_none()
	}

	/// Validates a present body against `policy`.
	pub fn validate_with(&self, policy: &CommentPolicy) -> Result<(), ValidationError> {
		match &self.text {
			Some(text) => policy.check_text(text),
			None => Ok(()),
		}
	}

	/// Validates and applies the update, returning whether anything changed.
	///
	/// A text change marks the comment edited. Any change stamps `updated_at`.
	pub fn apply(
		&self,
		comment: &mut Comment,
		policy: &CommentPolicy,
		now: OffsetDateTime,
	) -> Result<bool, ValidationError> {
		const OP: Operation = Operation::UpdateComment;

		let _span = OpSpan::new(OP, "apply").entered();

		obs::record_op_outcome(OP, Outcome::Attempt);

		let result = self.apply_checked(comment, policy, now);

		record_validation(OP, &result);

		result
	}

	fn apply_checked(
		&self,
		comment: &mut Comment,
		policy: &CommentPolicy,
		now: OffsetDateTime,
	) -> Result<bool, ValidationError> {
		if comment.deleted {
			return Err(ValidationError::CommentDeleted { comment_id: comment.id.clone() });
		}

		self.validate_with(policy)?;

		let mut changed = false;

		if let Some(text) = self.text.as_ref().filter(|text| **text != comment.text) {
			comment.text = text.clone();
			comment.edited = true;
			changed = true;
		}
		if let Some(pinned) = self.pinned.filter(|pinned| *pinned != comment.pinned) {
			comment.pinned = pinned;
			changed = true;
		}
		if changed {
			comment.updated_at = now;
		}

		Ok(changed)
	}
}

fn record_validation<T>(op: Operation, result: &Result<T, ValidationError>) {
	match result {
		Ok(_) => obs::record_op_outcome(op, Outcome::Success),
		Err(_e) => {
			obs::record_op_outcome(op, Outcome::Failure);

			#[cfg(feature = "tracing")]
			tracing::debug!(op = op.as_str(), error = %_e, "Rejected comment input.");
		},
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn song() -> ContentId {
		ContentId::new("song-1").expect("Content fixture should be valid.")
	}

	fn cid(value: &str) -> CommentId {
		CommentId::new(value).expect("Comment fixture should be valid.")
	}

	fn author() -> CommentAuthor {
		CommentAuthor::new(UserId::new("u-1").expect("User fixture should be valid."), "fan")
	}

	fn stored(id: &str) -> Comment {
		CreateCommentInput::new(ContentType::Song, song(), "first!").into_comment(
			cid(id),
			author(),
			macros::datetime!(2025-02-01 12:00 UTC),
		)
	}

	#[test]
	fn whitespace_only_text_is_rejected() {
		let input = CreateCommentInput::new(ContentType::Song, song(), " \n\t ");

		assert_eq!(input.validate(&[]), Err(ValidationError::EmptyText));
	}

	#[test]
	fn long_text_respects_policy() {
		let policy = CommentPolicy::default().with_max_text_chars(5);
		let input = CreateCommentInput::new(ContentType::Song, song(), "  héllo  ");

		assert_eq!(input.validate_with(&[], &policy), Ok(()));

		let input = CreateCommentInput::new(ContentType::Song, song(), "héllo!");

		assert_eq!(
			input.validate_with(&[], &policy),
			Err(ValidationError::TextTooLong { max: 5, actual: 6 })
		);
	}

	#[test]
	fn reply_parent_rules() {
		let parent = stored("c-1");
		let mut deleted = stored("c-2");

		deleted.deleted = true;

		let mut elsewhere = stored("c-3");

		elsewhere.content_type = ContentType::Album;

		let thread = [parent, deleted, elsewhere];
		let reply = |parent: &str| {
			CreateCommentInput::new(ContentType::Song, song(), "agreed").reply_to(cid(parent))
		};

		assert_eq!(reply("c-1").validate(&thread), Ok(()));
		assert_eq!(
			reply("c-2").validate(&thread),
			Err(ValidationError::ParentDeleted { parent_id: cid("c-2") })
		);
		assert_eq!(
			reply("c-3").validate(&thread),
			Err(ValidationError::ParentOnOtherContent { parent_id: cid("c-3") })
		);
		assert_eq!(
			reply("c-404").validate(&thread),
			Err(ValidationError::ParentNotFound { parent_id: cid("c-404") })
		);
	}

	#[test]
	fn create_builds_fresh_row() {
		let now = macros::datetime!(2025-02-01 12:30 UTC);
		let comment = CreateCommentInput::new(ContentType::Song, song(), "nice")
			.create(&[], &CommentPolicy::default(), cid("c-9"), author(), now)
			.expect("Valid input should create a comment.");

		assert_eq!(comment.created_at, now);
		assert_eq!(comment.updated_at, now);
		assert_eq!(comment.reply_count, 0);
		assert!(!comment.edited && !comment.pinned && !comment.deleted && !comment.reported);
	}

	#[test]
	fn update_marks_edited_only_on_text_change() {
		let mut comment = stored("c-1");
		let later = macros::datetime!(2025-02-02 08:00 UTC);
		let policy = CommentPolicy::default();
		let pin = UpdateCommentInput::default().with_pinned(true);

		assert_eq!(pin.apply(&mut comment, &policy, later), Ok(true));
		assert!(comment.pinned);
		assert!(!comment.edited);
		assert_eq!(comment.updated_at, later);

		let same_text = UpdateCommentInput::default().with_text("first!");

		assert_eq!(same_text.apply(&mut comment, &policy, later), Ok(false));
		assert!(!comment.edited);

		let edit = UpdateCommentInput::default().with_text("second!");

		assert_eq!(edit.apply(&mut comment, &policy, later), Ok(true));
		assert!(comment.edited);
		assert_eq!(comment.text, "second!");
	}

	#[test]
	fn empty_update_is_accepted() {
		let mut comment = stored("c-1");
		let before = comment.clone();
		let update = UpdateCommentInput::default();

		assert!(update.is_empty());
		assert_eq!(
			update.apply(&mut comment, &CommentPolicy::default(), OffsetDateTime::now_utc()),
			Ok(false)
		);
		assert_eq!(comment, before);
	}

	#[test]
	fn update_rejects_deleted_and_empty_text() {
		let mut comment = stored("c-1");
		let now = OffsetDateTime::now_utc();
		let policy = CommentPolicy::default();

		assert_eq!(
			UpdateCommentInput::default().with_text("   ").apply(&mut comment, &policy, now),
			Err(ValidationError::EmptyText)
		);

		comment.deleted = true;

		assert_eq!(
			UpdateCommentInput::default().with_pinned(true).apply(&mut comment, &policy, now),
			Err(ValidationError::CommentDeleted { comment_id: cid("c-1") })
		);
	}
}
