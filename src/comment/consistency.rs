//! Checks for the denormalized `reply_count` column.

// self
use crate::{_prelude::*, comment::Comment, id::CommentId};

/// A stored `reply_count` that disagrees with the rows it summarizes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyCountDrift {
	/// Comment carrying the stale counter.
	pub comment_id: CommentId,
	/// Value currently stored.
	pub stored: u32,
	/// Number of non-deleted direct replies in the provided rows.
	pub expected: u32,
}

/// Counts non-deleted direct replies for every comment id in `comments`.
pub fn expected_reply_counts(comments: &[Comment]) -> HashMap<CommentId, u32> {
	let mut counts: HashMap<CommentId, u32> =
		comments.iter().map(|comment| (comment.id.clone(), 0)).collect();

	for comment in comments.iter().filter(|comment| !comment.deleted) {
		if let Some(count) = comment.parent_id.as_ref().and_then(|parent| counts.get_mut(parent)) {
			*count += 1;
		}
	}

	counts
}

/// Lists comments whose stored `reply_count` is stale, in input order.
pub fn reply_count_drift(comments: &[Comment]) -> Vec<ReplyCountDrift> {
	let expected = expected_reply_counts(comments);

	comments
		.iter()
		.filter_map(|comment| {
			let want = expected.get(&comment.id).copied().unwrap_or_default();

			(want != comment.reply_count).then(|| ReplyCountDrift {
				comment_id: comment.id.clone(),
				stored: comment.reply_count,
				expected: want,
			})
		})
		.collect()
}
