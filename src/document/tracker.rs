//! Ranges that stay attached to the text they cover while the document is edited.

use std::collections::BTreeMap;

use super::EditOrigin;

/// Identifier of a set of tracked ranges that belong together.
///
/// Every snippet session owns one scope.
/// Edits tagged with [`EditOrigin::Session`] of a scope never mark the ranges of that same scope as touched.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ScopeId(pub(crate) u64);

/// Stable identifier of one tracked range.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RangeId(u64);

/// What happens to a tracked range when text is inserted exactly at one of its edges.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Stickiness {
	/// Text inserted at the start or the end becomes part of the range.
	GrowsAtEdges,

	/// Text inserted at the start or the end stays outside of the range.
	///
	/// For an empty range, inserted text ends up before it: the range moves along to the end of the insertion.
	NeverGrowsAtEdges,
}

/// Which way an offset moves when text is inserted right at it.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Bias {
	/// Stay before the inserted text.
	Left,

	/// Move to after the inserted text.
	Right,
}

/// A single replacement expressed in character offsets.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct OffsetEdit {
	/// Offset of the first replaced character.
	pub start: usize,

	/// Offset one past the last replaced character.
	pub old_end: usize,

	/// Number of characters inserted at `start`.
	pub new_len: usize,
}

impl OffsetEdit {
	/// Check if the edit doesn't change anything.
	#[inline]
	pub fn is_noop(&self) -> bool {
		self.start == self.old_end && self.new_len == 0
	}

	/// Map an offset from before the edit to after the edit.
	///
	/// Offsets inside the replaced text, or right at an insertion point, go to one side of the new text depending on the bias.
	pub(crate) fn map_offset(&self, offset: usize, bias: Bias) -> usize {
		if offset < self.start {
			offset
		} else if offset > self.old_end {
			offset - (self.old_end - self.start) + self.new_len
		} else {
			match bias {
				Bias::Left => self.start,
				Bias::Right => self.start + self.new_len,
			}
		}
	}
}

#[derive(Debug)]
struct TrackedRange {
	scope: ScopeId,
	start: usize,
	end: usize,
	stickiness: Stickiness,
	/// The last batch that changed text inside the range.
	touched: Option<u64>,
}

impl TrackedRange {
	fn apply(&mut self, edit: &OffsetEdit, origin: EditOrigin, batch: u64) {
		let (start_bias, end_bias) = match self.stickiness {
			Stickiness::GrowsAtEdges => (Bias::Left, Bias::Right),
			Stickiness::NeverGrowsAtEdges => (Bias::Right, Bias::Left),
		};
		let was_enclosing = self.start <= edit.start && edit.old_end <= self.end;

		self.start = edit.map_offset(self.start, start_bias);
		self.end = edit.map_offset(self.end, end_bias).max(self.start);

		let encloses_new_text = self.start <= edit.start && edit.start + edit.new_len <= self.end;
		if was_enclosing && encloses_new_text && origin != EditOrigin::Session(self.scope) {
			self.touched = Some(batch);
		}
	}
}

/// Registry of ranges that are kept up to date through edits.
///
/// Every range is registered under a [`ScopeId`] and gets a stable [`RangeId`].
/// The owning [`Document`][super::Document] feeds every edit to [`Self::apply()`],
/// which shifts and resizes all registered ranges in one pass per edit:
/// edits before a range shift it, edits inside a range resize it and edits after a range leave it alone.
///
/// The tracker also remembers which ranges had text changed inside them by an edit from another origin than their own scope,
/// and which call to [`Self::apply()`] did so last.
#[derive(Debug, Default)]
pub struct RangeTracker {
	ranges: BTreeMap<RangeId, TrackedRange>,
	next_id: u64,
	batches: u64,
}

impl RangeTracker {
	/// Create an empty tracker.
	pub fn new() -> Self {
		Self::default()
	}

	/// Start tracking a character range.
	pub fn register(&mut self, scope: ScopeId, range: std::ops::Range<usize>, stickiness: Stickiness) -> RangeId {
		let id = RangeId(self.next_id);
		self.next_id += 1;
		self.ranges.insert(id, TrackedRange {
			scope,
			start: range.start,
			end: range.end.max(range.start),
			stickiness,
			touched: None,
		});
		id
	}

	/// Get the current character range of a tracked range.
	///
	/// Returns `None` if the range was removed.
	pub fn resolve(&self, id: RangeId) -> Option<std::ops::Range<usize>> {
		self.ranges.get(&id).map(|range| range.start..range.end)
	}

	/// Change the stickiness of a tracked range.
	///
	/// Returns `false` if the range was removed.
	pub fn set_stickiness(&mut self, id: RangeId, stickiness: Stickiness) -> bool {
		match self.ranges.get_mut(&id) {
			Some(range) => {
				range.stickiness = stickiness;
				true
			},
			None => false,
		}
	}

	/// Move a tracked range to a new character range.
	///
	/// Returns `false` if the range was removed.
	pub fn set_range(&mut self, id: RangeId, new_range: std::ops::Range<usize>) -> bool {
		match self.ranges.get_mut(&id) {
			Some(range) => {
				range.start = new_range.start;
				range.end = new_range.end.max(new_range.start);
				true
			},
			None => false,
		}
	}

	/// Stop tracking a range.
	pub fn remove(&mut self, id: RangeId) -> Option<std::ops::Range<usize>> {
		self.ranges.remove(&id).map(|range| range.start..range.end)
	}

	/// Stop tracking all ranges of a scope.
	///
	/// Returns the number of removed ranges.
	pub fn remove_scope(&mut self, scope: ScopeId) -> usize {
		let before = self.ranges.len();
		self.ranges.retain(|_, range| range.scope != scope);
		before - self.ranges.len()
	}

	/// The number of tracked ranges.
	pub fn len(&self) -> usize {
		self.ranges.len()
	}

	/// Check if no ranges are tracked.
	pub fn is_empty(&self) -> bool {
		self.ranges.is_empty()
	}

	/// Get and clear the ranges of a scope that had their text edited since the last call.
	///
	/// Each range comes with the number of the last call to [`Self::apply()`] that edited it.
	/// Later calls have higher numbers, so the most recently edited range has the highest one.
	/// Edits tagged with the scope itself are not counted.
	pub fn take_touched(&mut self, scope: ScopeId) -> Vec<(RangeId, u64)> {
		self.ranges
			.iter_mut()
			.filter(|(_, range)| range.scope == scope)
			.filter_map(|(&id, range)| Some((id, range.touched.take()?)))
			.collect()
	}

	/// Update all tracked ranges for a batch of edits.
	///
	/// The edits are applied one after the other,
	/// so each edit must be expressed in the offsets that result from the edits before it.
	pub fn apply(&mut self, edits: &[OffsetEdit], origin: EditOrigin) {
		self.batches += 1;
		for edit in edits.iter().filter(|edit| !edit.is_noop()) {
			tracing::trace!(?edit, ?origin, batch = self.batches, ranges = self.ranges.len(), "updating tracked ranges");
			for range in self.ranges.values_mut() {
				range.apply(edit, origin, self.batches);
			}
		}
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use assert2::{assert, check};

	const SCOPE: ScopeId = ScopeId(1);
	const OTHER: ScopeId = ScopeId(2);

	fn insert(at: usize, len: usize) -> OffsetEdit {
		OffsetEdit { start: at, old_end: at, new_len: len }
	}

	fn replace(range: std::ops::Range<usize>, len: usize) -> OffsetEdit {
		OffsetEdit { start: range.start, old_end: range.end, new_len: len }
	}

	#[test]
	fn test_map_offset() {
		let edit = replace(4..6, 3);
		check!(edit.map_offset(2, Bias::Left) == 2);
		check!(edit.map_offset(4, Bias::Left) == 4);
		check!(edit.map_offset(4, Bias::Right) == 7);
		check!(edit.map_offset(5, Bias::Left) == 4);
		check!(edit.map_offset(5, Bias::Right) == 7);
		check!(edit.map_offset(6, Bias::Right) == 7);
		check!(edit.map_offset(10, Bias::Left) == 11);
	}

	#[test]
	fn edits_before_shift_and_after_ignore() {
		let mut tracker = RangeTracker::new();
		let id = tracker.register(SCOPE, 5..8, Stickiness::GrowsAtEdges);

		tracker.apply(&[insert(2, 3)], EditOrigin::User);
		check!(tracker.resolve(id) == Some(8..11));

		tracker.apply(&[replace(0..2, 0)], EditOrigin::User);
		check!(tracker.resolve(id) == Some(6..9));

		tracker.apply(&[insert(20, 4)], EditOrigin::User);
		check!(tracker.resolve(id) == Some(6..9));
		check!(tracker.take_touched(SCOPE).is_empty());
	}

	#[test]
	fn edits_inside_resize() {
		let mut tracker = RangeTracker::new();
		let id = tracker.register(SCOPE, 5..8, Stickiness::NeverGrowsAtEdges);

		tracker.apply(&[insert(6, 2)], EditOrigin::User);
		check!(tracker.resolve(id) == Some(5..10));

		tracker.apply(&[replace(5..9, 0)], EditOrigin::User);
		check!(tracker.resolve(id) == Some(5..6));
		check!(tracker.take_touched(SCOPE) == [(id, 2)]);
		check!(tracker.take_touched(SCOPE).is_empty());
	}

	#[test]
	fn stickiness_at_edges() {
		let mut tracker = RangeTracker::new();
		let grows = tracker.register(SCOPE, 3..3, Stickiness::GrowsAtEdges);
		let never = tracker.register(SCOPE, 3..3, Stickiness::NeverGrowsAtEdges);
		let before = tracker.register(SCOPE, 0..3, Stickiness::NeverGrowsAtEdges);

		tracker.apply(&[insert(3, 3)], EditOrigin::User);
		check!(tracker.resolve(grows) == Some(3..6));
		check!(tracker.resolve(never) == Some(6..6));
		check!(tracker.resolve(before) == Some(0..3));
		check!(tracker.take_touched(SCOPE) == [(grows, 1)]);
	}

	#[test]
	fn own_scope_edits_are_not_touches() {
		let mut tracker = RangeTracker::new();
		let mine = tracker.register(SCOPE, 0..4, Stickiness::GrowsAtEdges);
		let theirs = tracker.register(OTHER, 0..4, Stickiness::GrowsAtEdges);

		tracker.apply(&[insert(2, 1)], EditOrigin::Session(SCOPE));
		check!(tracker.take_touched(SCOPE).is_empty());
		check!(tracker.take_touched(OTHER) == [(theirs, 1)]);
		check!(tracker.resolve(mine) == Some(0..5));
	}

	#[test]
	fn touches_remember_the_last_batch() {
		let mut tracker = RangeTracker::new();
		let first = tracker.register(SCOPE, 0..3, Stickiness::NeverGrowsAtEdges);
		let second = tracker.register(SCOPE, 4..7, Stickiness::NeverGrowsAtEdges);

		tracker.apply(&[replace(5..6, 1)], EditOrigin::User);
		tracker.apply(&[replace(1..2, 1)], EditOrigin::User);
		tracker.apply(&[insert(10, 1)], EditOrigin::User);
		tracker.apply(&[insert(5, 1)], EditOrigin::User);
		check!(tracker.take_touched(SCOPE) == [(first, 2), (second, 4)]);
	}

	#[test]
	fn remove_and_scopes() {
		let mut tracker = RangeTracker::new();
		let a = tracker.register(SCOPE, 0..1, Stickiness::GrowsAtEdges);
		tracker.register(SCOPE, 1..2, Stickiness::GrowsAtEdges);
		let c = tracker.register(OTHER, 2..3, Stickiness::GrowsAtEdges);
		assert!(tracker.len() == 3);

		check!(tracker.remove(a) == Some(0..1));
		check!(tracker.resolve(a) == None);
		check!(!tracker.set_stickiness(a, Stickiness::NeverGrowsAtEdges));
		check!(tracker.remove_scope(SCOPE) == 1);
		check!(tracker.resolve(c) == Some(2..3));
		assert!(tracker.len() == 1);
	}
}
