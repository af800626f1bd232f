//! Reaction kinds, stored reaction rows, and zero-filled per-kind counters.

// crates.io
use serde::{Deserializer, Serializer, ser::SerializeMap};
// self
use crate::{
	_prelude::*,
	comment::UnknownLabelError,
	id::{CommentId, UserId},
};

/// Display glyph for every reaction kind, in [`ReactionType::ALL`] order.
pub const REACTION_EMOJI: [(ReactionType, &str); ReactionType::COUNT] = [
	(ReactionType::Like, "👍"),
	(ReactionType::Love, "❤️"),
	(ReactionType::Fire, "🔥"),
	(ReactionType::Laugh, "😂"),
	(ReactionType::Sad, "😢"),
	(ReactionType::Angry, "😠"),
];

/// Emotional response a user can attach to a comment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionType {
	/// 👍
	Like,
	/// ❤️
	Love,
	/// 🔥
	Fire,
	/// 😂
	Laugh,
	/// 😢
	Sad,
	/// 😠
	Angry,
}
impl ReactionType {
	/// Number of reaction kinds.
	pub const COUNT: usize = 6;
	/// Every reaction kind in display order.
	pub const ALL: [Self; Self::COUNT] =
		[Self::Like, Self::Love, Self::Fire, Self::Laugh, Self::Sad, Self::Angry];

	/// Returns the stable wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			ReactionType::Like => "like",
			ReactionType::Love => "love",
			ReactionType::Fire => "fire",
			ReactionType::Laugh => "laugh",
			ReactionType::Sad => "sad",
			ReactionType::Angry => "angry",
		}
	}

	/// Returns the display glyph from [`REACTION_EMOJI`].
	pub const fn emoji(self) -> &'static str {
		REACTION_EMOJI[self.index()].1
	}

	const fn index(self) -> usize {
		match self {
			ReactionType::Like => 0,
			ReactionType::Love => 1,
			ReactionType::Fire => 2,
			ReactionType::Laugh => 3,
			ReactionType::Sad => 4,
			ReactionType::Angry => 5,
		}
	}
}
impl Display for ReactionType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for ReactionType {
	type Err = UnknownLabelError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|kind| kind.as_str() == s)
			.ok_or_else(|| UnknownLabelError { kind: "reaction type", value: s.to_owned() })
	}
}

/// One user's reaction to one comment. A user holds at most one per comment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentReaction {
	/// Comment reacted to.
	pub comment_id: CommentId,
	/// Reacting user.
	pub user_id: UserId,
	/// Chosen reaction.
	pub reaction_type: ReactionType,
	/// When the reaction was recorded, if the store tracks it.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
}
impl CommentReaction {
	/// Creates a reaction row without a timestamp.
	pub fn new(comment_id: CommentId, user_id: UserId, reaction_type: ReactionType) -> Self {
		Self { comment_id, user_id, reaction_type, created_at: None }
	}
}

/// Per-kind reaction counters; every kind is always present.
///
/// Serializes as a map holding all six labels; missing labels deserialize as zero.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ReactionCounts([u64; ReactionType::COUNT]);
impl ReactionCounts {
	/// Count for one kind.
	pub fn get(&self, kind: ReactionType) -> u64 {
		self.0[kind.index()]
	}

	/// Sum over every kind, saturating at `u64::MAX`.
	pub fn total(&self) -> u64 {
		self.0.iter().fold(0, |sum, count| sum.saturating_add(*count))
	}

	/// `(kind, count)` pairs in display order, zeros included.
	pub fn iter(&self) -> impl Iterator<Item = (ReactionType, u64)> + '_ {
		ReactionType::ALL.into_iter().map(|kind| (kind, self.get(kind)))
	}

	pub(crate) fn increment(&mut self, kind: ReactionType) {
		self.0[kind.index()] += 1;
	}
}
impl Debug for ReactionCounts {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_map().entries(self.iter().map(|(kind, count)| (kind.as_str(), count))).finish()
	}
}
impl FromIterator<ReactionType> for ReactionCounts {
	fn from_iter<I: IntoIterator<Item = ReactionType>>(iter: I) -> Self {
		let mut counts = Self::default();

		for kind in iter {
			counts.increment(kind);
		}

		counts
	}
}
impl Serialize for ReactionCounts {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut map = serializer.serialize_map(Some(ReactionType::COUNT))?;

		for (kind, count) in self.iter() {
			map.serialize_entry(&kind, &count)?;
		}

		map.end()
	}
}
impl<'de> Deserialize<'de> for ReactionCounts {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let entries = <BTreeMap<ReactionType, u64>>::deserialize(deserializer)?;
		let mut counts = Self::default();

		for (kind, count) in entries {
			counts.0[kind.index()] = count;
		}

		Ok(counts)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn emoji_table_is_exhaustive_and_ordered() {
		for (position, kind) in ReactionType::ALL.into_iter().enumerate() {
			assert_eq!(REACTION_EMOJI[position].0, kind);
			assert!(!kind.emoji().is_empty());
		}

		assert_eq!(ReactionType::Fire.emoji(), "🔥");
		assert_eq!(ReactionType::Love.emoji(), "❤️");
	}

	#[test]
	fn labels_parse_and_serialize() {
		assert_eq!("laugh".parse::<ReactionType>(), Ok(ReactionType::Laugh));
		assert!("meh".parse::<ReactionType>().is_err());
		assert_eq!(
			serde_json::to_string(&ReactionType::Angry).expect("Reaction should serialize."),
			"\"angry\""
		);
	}

	#[test]
	fn counts_serialize_all_six_keys() {
		let counts: ReactionCounts =
			[ReactionType::Like, ReactionType::Like, ReactionType::Sad].into_iter().collect();
		let value = serde_json::to_value(counts).expect("Counts should serialize.");
		let object = value.as_object().expect("Counts should serialize as an object.");

		assert_eq!(object.len(), ReactionType::COUNT);
		assert_eq!(value["like"], 2);
		assert_eq!(value["sad"], 1);
		assert_eq!(value["fire"], 0);
		assert_eq!(counts.total(), 3);
	}

	#[test]
	fn counts_deserialize_zero_fills() {
		let counts: ReactionCounts =
			serde_json::from_str(r#"{"love":4}"#).expect("Partial counts should deserialize.");

		assert_eq!(counts.get(ReactionType::Love), 4);
		assert_eq!(counts.get(ReactionType::Like), 0);
		assert_eq!(counts.iter().count(), ReactionType::COUNT);
	}

	#[test]
	fn total_saturates_on_huge_counts() {
		let counts: ReactionCounts = serde_json::from_str(r#"{"like":18446744073709551615,"love":1}"#)
			.expect("Large counts should deserialize.");

		assert_eq!(counts.total(), u64::MAX);
	}
}
