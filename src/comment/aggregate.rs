//! Builds the display tree of a content item's comments with reaction summaries.
//!
//! [`aggregate`] is a pure transformation over rows the caller already fetched. It never fails:
//! inconsistent input is repaired rather than rejected.
//!
//! - A `parent_id` that resolves to no row (or to the row itself) makes the comment top-level.
//! - A parent cycle is broken by promoting the member that appears first in the input.
//! - Duplicate ids keep every row; parent and reaction lookups resolve to the first one.
//! - Reactions naming unknown comments are ignored. When one user has several reactions on one
//!   comment, the last in input order counts.
//!
//! Nodes live in an arena indexed by input position with a child index next to it, and the
//! nested output is assembled bottom-up with an explicit stack, so neither malformed links nor
//! deep threads can recurse without bound. Dropping and [`walk`](CommentWithReactions::walk)ing
//! the result are iterative as well; the derived `Clone`, `PartialEq`, `Debug`, and `Serialize`
//! impls recurse once per nesting level.

// self
use crate::{
	_prelude::*,
	comment::{Comment, CommentReaction, ReactionCounts, ReactionType},
	id::{CommentId, UserId},
	obs::{self, OpSpan, Operation, Outcome},
};

/// Read-only view of a comment with its reaction summary and nested replies.
///
/// Deleted comments keep their place (their replies still hang off them) but carry an empty
/// `comment.text`; use [`text`](Self::text) to read the body.
///
/// Dropping a tree of any depth is stack-safe. Cloning, comparing, formatting, or serializing
/// recurses per level, so very deep threads should be consumed through [`walk`](Self::walk).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommentWithReactions {
	/// Stored row, with the body masked when deleted.
	#[serde(flatten)]
	pub comment: Comment,
	/// Count per reaction kind, all kinds present.
	pub reaction_counts: ReactionCounts,
	/// Sum of `reaction_counts`; equals the number of distinct reacting users.
	pub total_reactions: u64,
	/// Requesting user's own reaction.
	pub user_reaction: Option<ReactionType>,
	/// Direct replies, oldest first.
	pub replies: Vec<CommentWithReactions>,
}
impl CommentWithReactions {
	/// Comment identifier.
	pub fn id(&self) -> &CommentId {
		&self.comment.id
	}

	/// Body text; `None` for deleted comments.
	pub fn text(&self) -> Option<&str> {
		if self.comment.deleted { None } else { Some(&self.comment.text) }
	}

	/// Depth-first, pre-order walk over this node and every descendant.
	pub fn walk(&self) -> impl Iterator<Item = &CommentWithReactions> {
		let mut stack = vec![self];

		std::iter::from_fn(move || {
			let node = stack.pop()?;

			stack.extend(node.replies.iter().rev());

			Some(node)
		})
	}
}
impl Drop for CommentWithReactions {
	fn drop(&mut self) {
		let mut pending = std::mem::take(&mut self.replies);

		while let Some(mut node) = pending.pop() {
			pending.append(&mut node.replies);
		}
	}
}

/// Builds the comment tree for one content item.
///
/// Top-level comments come pinned first, then by `created_at` ascending; replies are ordered by
/// `created_at` ascending and ignore pinning. Both sorts are stable, so ties keep input order.
pub fn aggregate(
	comments: &[Comment],
	reactions: &[CommentReaction],
	requesting_user: Option<&UserId>,
) -> Vec<CommentWithReactions> {
	const OP: Operation = Operation::Aggregate;

	let _span = OpSpan::new(OP, "aggregate").entered();

	obs::record_op_outcome(OP, Outcome::Attempt);

	let arena = Arena::new(comments);
	let (counts, own) = arena.summarize(reactions, requesting_user);
	let tree = arena.assemble(counts, own);

	obs::record_op_outcome(OP, Outcome::Success);

	tree
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
	Unvisited,
	OnPath,
	Done,
}

struct Arena<'a> {
	comments: &'a [Comment],
	index: HashMap<&'a str, usize>,
	roots: Vec<usize>,
	children: Vec<Vec<usize>>,
}
impl<'a> Arena<'a> {
	fn new(comments: &'a [Comment]) -> Self {
		let mut index = HashMap::with_capacity(comments.len());

		for (position, comment) in comments.iter().enumerate() {
			index.entry(comment.id.as_str()).or_insert(position);
		}

		let mut parents: Vec<Option<usize>> = comments
			.iter()
			.enumerate()
			.map(|(position, comment)| {
				comment
					.parent_id
					.as_ref()
					.and_then(|parent| index.get(parent.as_str()).copied())
					.filter(|&parent| parent != position)
			})
			.collect();
		let orphans = comments
			.iter()
			.zip(&parents)
			.filter(|(comment, parent)| comment.parent_id.is_some() && parent.is_none())
			.count();
		let promoted = break_cycles(&mut parents);

		#[cfg(feature = "tracing")]
		if orphans + promoted > 0 {
			tracing::debug!(orphans, promoted, "Promoted unresolvable replies to top level.");
		}
		#[cfg(not(feature = "tracing"))]
		let _ = (orphans, promoted);

		let mut roots = Vec::new();
		let mut children = vec![Vec::new(); comments.len()];

		for (position, parent) in parents.into_iter().enumerate() {
			match parent {
				Some(parent) => children[parent].push(position),
				None => roots.push(position),
			}
		}

		roots.sort_by_key(|&position| {
			let comment = &comments[position];

			(!comment.pinned, comment.created_at)
		});

		for replies in &mut children {
			replies.sort_by_key(|&position| comments[position].created_at);
		}

		Self { comments, index, roots, children }
	}

	fn summarize(
		&self,
		reactions: &'a [CommentReaction],
		requesting_user: Option<&UserId>,
	) -> (Vec<ReactionCounts>, Vec<Option<ReactionType>>) {
		let mut latest: HashMap<(usize, &str), ReactionType> = HashMap::new();

		for reaction in reactions {
			if let Some(&position) = self.index.get(reaction.comment_id.as_str()) {
				latest.insert((position, reaction.user_id.as_str()), reaction.reaction_type);
			}
		}

		let mut counts = vec![ReactionCounts::default(); self.comments.len()];
		let mut own = vec![None; self.comments.len()];

		for ((position, user), kind) in latest {
			counts[position].increment(kind);

			if requesting_user.is_some_and(|requesting| requesting.as_str() == user) {
				own[position] = Some(kind);
			}
		}

		(counts, own)
	}

	fn assemble(
		&self,
		counts: Vec<ReactionCounts>,
		own: Vec<Option<ReactionType>>,
	) -> Vec<CommentWithReactions> {
		let mut built: Vec<Option<CommentWithReactions>> =
			(0..self.comments.len()).map(|_| None).collect();
		let mut stack: Vec<(usize, bool)> =
			self.roots.iter().rev().map(|&position| (position, false)).collect();

		while let Some((position, expanded)) = stack.pop() {
			if expanded {
				let replies = self.children[position]
					.iter()
					.filter_map(|&child| built[child].take())
					.collect();

				built[position] = Some(view(
					&self.comments[position],
					counts[position],
					own[position],
					replies,
				));
			} else {
				stack.push((position, true));
				stack.extend(self.children[position].iter().map(|&child| (child, false)));
			}
		}

		self.roots.iter().filter_map(|&position| built[position].take()).collect()
	}
}

fn view(
	comment: &Comment,
	reaction_counts: ReactionCounts,
	user_reaction: Option<ReactionType>,
	replies: Vec<CommentWithReactions>,
) -> CommentWithReactions {
	let mut comment = comment.clone();

	if comment.deleted {
		comment.text.clear();
	}

	CommentWithReactions {
		comment,
		total_reactions: reaction_counts.total(),
		reaction_counts,
		user_reaction,
		replies,
	}
}

// Detaches one member of every parent cycle, returning how many were detached.
fn break_cycles(parents: &mut [Option<usize>]) -> usize {
	let mut marks = vec![Mark::Unvisited; parents.len()];
	let mut path = Vec::new();
	let mut promoted = 0;

	for start in 0..parents.len() {
		let mut cursor = Some(start);

		while let Some(position) = cursor {
			match marks[position] {
				Mark::Unvisited => {
					marks[position] = Mark::OnPath;
					path.push(position);
					cursor = parents[position];
				},
				Mark::OnPath => {
					let cycle_start = path.iter().position(|&p| p == position).unwrap_or(0);

					if let Some(&first) = path[cycle_start..].iter().min() {
						parents[first] = None;
						promoted += 1;
					}

					cursor = None;
				},
				Mark::Done => cursor = None,
			}
		}

		for position in path.drain(..) {
			marks[position] = Mark::Done;
		}
	}

	promoted
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::{comment::ContentType, id::ContentId};

	fn row(id: &str, parent: Option<&str>, minute: u8) -> Comment {
		let at = macros::datetime!(2025-04-01 09:00 UTC) + Duration::minutes(minute.into());

		Comment {
			id: CommentId::new(id).expect("Comment fixture should be valid."),
			content_type: ContentType::Song,
			content_id: ContentId::new("song-1").expect("Content fixture should be valid."),
			author_user_id: UserId::new("author").expect("User fixture should be valid."),
			author_username: "author".into(),
			text: format!("text of {id}"),
			edited: false,
			pinned: false,
			deleted: false,
			reported: false,
			created_at: at,
			updated_at: at,
			parent_id: parent
				.map(|p| CommentId::new(p).expect("Parent fixture should be valid.")),
			reply_count: 0,
		}
	}

	fn ids(nodes: &[CommentWithReactions]) -> Vec<&str> {
		nodes.iter().map(|node| node.id().as_str()).collect()
	}

	#[test]
	fn break_cycles_detaches_lowest_member() {
		let mut parents = vec![Some(2), Some(0), Some(1), Some(0), None];

		assert_eq!(break_cycles(&mut parents), 1);
		assert_eq!(parents, vec![None, Some(0), Some(1), Some(0), None]);
	}

	#[test]
	fn self_parent_is_top_level() {
		let tree = aggregate(&[row("a", Some("a"), 0)], &[], None);

		assert_eq!(ids(&tree), vec!["a"]);
		assert!(tree[0].replies.is_empty());
	}

	#[test]
	fn two_cycle_keeps_both_comments() {
		let comments = [row("a", Some("b"), 1), row("b", Some("a"), 0)];
		let tree = aggregate(&comments, &[], None);

		assert_eq!(ids(&tree), vec!["a"]);
		assert_eq!(ids(&tree[0].replies), vec!["b"]);
	}

	#[test]
	fn deep_chain_builds_without_recursion() {
		let depth = 50_000;
		let comments: Vec<Comment> = (0..depth)
			.map(|i| {
				let id = format!("c{i}");
				let parent = (i > 0).then(|| format!("c{}", i - 1));

				row(&id, parent.as_deref(), 0)
			})
			.collect();
		let tree = aggregate(&comments, &[], None);

		assert_eq!(tree.len(), 1);
		assert_eq!(tree[0].walk().count(), depth);

		drop(tree);
	}

	#[test]
	fn walk_is_pre_order() {
		let comments = [
			row("root", None, 0),
			row("r2", Some("root"), 2),
			row("r1", Some("root"), 1),
			row("r1a", Some("r1"), 3),
		];
		let tree = aggregate(&comments, &[], None);
		let order: Vec<&str> = tree[0].walk().map(|node| node.id().as_str()).collect();

		assert_eq!(order, vec!["root", "r1", "r1a", "r2"]);
	}

	#[test]
	fn duplicate_reactions_collapse_to_last() {
		let user = UserId::new("u1").expect("User fixture should be valid.");
		let comment = CommentId::new("a").expect("Comment fixture should be valid.");
		let reactions = [
			CommentReaction::new(comment.clone(), user.clone(), ReactionType::Like),
			CommentReaction::new(comment, user.clone(), ReactionType::Fire),
		];
		let tree = aggregate(&[row("a", None, 0)], &reactions, Some(&user));

		assert_eq!(tree[0].total_reactions, 1);
		assert_eq!(tree[0].reaction_counts.get(ReactionType::Fire), 1);
		assert_eq!(tree[0].reaction_counts.get(ReactionType::Like), 0);
		assert_eq!(tree[0].user_reaction, Some(ReactionType::Fire));
	}
}
