//! A rope backed text document with tracked ranges and a change feed.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Weak};

use ropey::{Rope, RopeSlice};

use crate::config::{DocumentOptions, LineEnding};
use crate::error::{self, EditError};

mod position;
pub use position::{Position, Range};

mod tracker;
pub use tracker::{OffsetEdit, RangeId, RangeTracker, ScopeId, Stickiness};
pub(crate) use tracker::Bias;

/// Where an edit came from.
///
/// Every edit applied to a [`Document`] carries its origin,
/// so listeners can tell edits made by the user apart from edits they made themselves.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum EditOrigin {
	/// An edit made by the user, such as typing or deleting text.
	User,

	/// An edit made by the owner of a scope, such as a snippet session.
	Session(ScopeId),
}

/// Replace a range of a document with new text.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TextEdit {
	/// The range to replace.
	pub range: Range,

	/// The replacement text.
	pub text: String,
}

impl TextEdit {
	/// Create an edit that replaces a range with text.
	pub fn new(range: Range, text: impl Into<String>) -> Self {
		Self {
			range,
			text: text.into(),
		}
	}

	/// Create an edit that inserts text at a position.
	pub fn insert(position: Position, text: impl Into<String>) -> Self {
		Self::new(Range::caret(position), text)
	}

	/// Create an edit that deletes a range.
	pub fn delete(range: Range) -> Self {
		Self::new(range, String::new())
	}
}

/// One replacement within a [`ChangeEvent`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ContentChange {
	/// The replaced range, in positions from before the edit.
	pub range: Range,

	/// The inserted text.
	pub text: String,

	/// The index of the edit in the batch that was passed to [`Document::apply_edits()`].
	pub edit_index: usize,

	/// The character range of the replaced text, in offsets from before the whole batch was applied.
	pub replaced: std::ops::Range<usize>,

	/// The character range of the inserted text, in offsets from after the whole batch was applied.
	pub inserted: std::ops::Range<usize>,
}

impl ContentChange {
	/// The change as a single offset edit.
	///
	/// Only valid when the changes after this one in the same event have already been applied.
	pub fn offset_edit(&self) -> OffsetEdit {
		OffsetEdit {
			start: self.replaced.start,
			old_end: self.replaced.end,
			new_len: self.inserted.len(),
		}
	}
}

/// Notification of one applied batch of edits.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ChangeEvent {
	/// The document version after the batch.
	pub version: u64,

	/// Where the batch came from.
	pub origin: EditOrigin,

	/// The individual replacements, ordered by position in the document.
	pub changes: Vec<ContentChange>,
}

/// A listener registered on a [`Document`].
///
/// Each subscription has its own scope for tracked ranges and its own position in the change feed,
/// so any number of listeners can follow the same document without depending on each other.
///
/// Dropping a subscription without [`Document::unsubscribe()`] is allowed:
/// the document notices on the next edit and releases the scope then.
#[derive(Debug)]
pub struct Subscription {
	scope: ScopeId,
	_alive: Arc<()>,
}

impl Subscription {
	/// The scope of this subscription.
	#[inline]
	pub fn scope(&self) -> ScopeId {
		self.scope
	}
}

/// A text document.
///
/// The document owns the text, the [`RangeTracker`] that keeps tracked ranges attached to the text,
/// and a feed of [`ChangeEvent`]s for its subscribers.
#[derive(Debug)]
pub struct Document {
	rope: Rope,
	options: DocumentOptions,
	tracker: RangeTracker,
	version: u64,
	log: VecDeque<ChangeEvent>,
	subscribers: BTreeMap<ScopeId, Subscriber>,
	next_scope: u64,
}

/// The document side of a [`Subscription`].
#[derive(Debug)]
struct Subscriber {
	/// The last version the subscriber has seen.
	seen: u64,
	alive: Weak<()>,
}

impl Document {
	/// Create a document with default options.
	///
	/// The line ending is detected from the text, falling back to `\n`.
	pub fn new(text: &str) -> Self {
		let line_ending = LineEnding::detect(text).unwrap_or_default();
		Self::with_options(text, DocumentOptions::default().with_line_ending(line_ending))
	}

	/// Create a document with the given options.
	pub fn with_options(text: &str, options: DocumentOptions) -> Self {
		Self {
			rope: Rope::from_str(text),
			options,
			tracker: RangeTracker::new(),
			version: 0,
			log: VecDeque::new(),
			subscribers: BTreeMap::new(),
			next_scope: 0,
		}
	}

	/// Get the full text of the document.
	pub fn text(&self) -> String {
		self.rope.to_string()
	}

	/// Get the length of the document in characters.
	#[inline]
	pub fn len_chars(&self) -> usize {
		self.rope.len_chars()
	}

	/// Get the number of lines.
	///
	/// A document always has at least one line, and text ending in a line break has an empty last line.
	#[inline]
	pub fn line_count(&self) -> usize {
		self.rope.len_lines()
	}

	/// Get the text of a line, without its line break.
	pub fn line(&self, line: usize) -> Option<String> {
		if line >= self.rope.len_lines() {
			return None;
		}
		let slice = self.rope.line(line);
		let len = slice.len_chars() - line_break_len(slice);
		Some(slice.slice(..len).to_string())
	}

	/// Get the length of a line in characters, without its line break.
	pub fn line_len(&self, line: usize) -> Option<usize> {
		if line >= self.rope.len_lines() {
			return None;
		}
		let slice = self.rope.line(line);
		Some(slice.len_chars() - line_break_len(slice))
	}

	/// The options of the document.
	#[inline]
	pub fn options(&self) -> &DocumentOptions {
		&self.options
	}

	/// Replace the options of the document.
	pub fn set_options(&mut self, options: DocumentOptions) {
		self.options = options;
	}

	/// The line ending used for inserted text.
	#[inline]
	pub fn eol(&self) -> &'static str {
		self.options.line_ending.as_str()
	}

	/// The version of the document, incremented by every applied batch of edits.
	#[inline]
	pub fn version(&self) -> u64 {
		self.version
	}

	/// Convert a position to a character offset.
	pub fn offset_of(&self, position: Position) -> Result<usize, EditError> {
		let line_len = self
			.line_len(position.line)
			.ok_or(error::PositionOutOfBounds { position })?;
		if position.column > line_len {
			return Err(error::PositionOutOfBounds { position }.into());
		}
		Ok(self.rope.line_to_char(position.line) + position.column)
	}

	/// Convert a character offset to a position.
	pub fn position_of(&self, offset: usize) -> Result<Position, EditError> {
		if offset > self.rope.len_chars() {
			return Err(error::OffsetOutOfBounds {
				offset,
				len: self.rope.len_chars(),
			}
			.into());
		}
		let line = self.rope.char_to_line(offset);
		Ok(Position::new(line, offset - self.rope.line_to_char(line)))
	}

	/// Convert a range to character offsets.
	pub fn offset_range(&self, range: Range) -> Result<std::ops::Range<usize>, EditError> {
		Ok(self.offset_of(range.start)?..self.offset_of(range.end)?)
	}

	/// Convert character offsets to a range.
	pub fn range_of(&self, offsets: std::ops::Range<usize>) -> Result<Range, EditError> {
		Ok(Range::new(self.position_of(offsets.start)?, self.position_of(offsets.end)?))
	}

	/// Get the text between two character offsets.
	pub fn slice(&self, offsets: std::ops::Range<usize>) -> Result<String, EditError> {
		let len = self.rope.len_chars();
		if offsets.start > offsets.end || offsets.end > len {
			return Err(error::OffsetOutOfBounds { offset: offsets.end, len }.into());
		}
		Ok(self.rope.slice(offsets).to_string())
	}

	/// The tracked ranges of the document.
	#[inline]
	pub fn tracker(&self) -> &RangeTracker {
		&self.tracker
	}

	/// The tracked ranges of the document, mutably.
	#[inline]
	pub fn tracker_mut(&mut self) -> &mut RangeTracker {
		&mut self.tracker
	}

	/// Apply a batch of edits as one atomic change.
	///
	/// All ranges are interpreted against the document as it is before the batch.
	/// The edits must not overlap, although several insertions at the same position are allowed:
	/// they end up in the order in which they were given.
	///
	/// Edits are applied from the end of the document towards the start,
	/// so no edit invalidates the offsets of another.
	/// Tracked ranges are updated for every edit, and the resulting [`ChangeEvent`] is queued for all subscribers.
	pub fn apply_edits(&mut self, edits: Vec<TextEdit>, origin: EditOrigin) -> Result<ChangeEvent, EditError> {
		let mut resolved = Vec::with_capacity(edits.len());
		for (edit_index, edit) in edits.into_iter().enumerate() {
			let offsets = self.offset_range(edit.range)?;
			resolved.push((edit_index, offsets, edit));
		}
		resolved.sort_by_key(|(edit_index, offsets, _)| (offsets.start, offsets.end, *edit_index));

		for pair in resolved.windows(2) {
			let (_, first_offsets, first) = &pair[0];
			let (_, second_offsets, second) = &pair[1];
			if first_offsets.end > second_offsets.start {
				return Err(error::OverlappingEdits {
					first: first.range,
					second: second.range,
				}
				.into());
			}
		}

		self.release_dropped_subscribers();
		if resolved.is_empty() {
			return Ok(ChangeEvent {
				version: self.version,
				origin,
				changes: Vec::new(),
			});
		}

		let mut changes = Vec::with_capacity(resolved.len());
		let mut delta: isize = 0;
		for (edit_index, offsets, edit) in &resolved {
			let new_len = edit.text.chars().count();
			let inserted_start = offsets.start.saturating_add_signed(delta);
			changes.push(ContentChange {
				range: edit.range,
				text: edit.text.clone(),
				edit_index: *edit_index,
				replaced: offsets.clone(),
				inserted: inserted_start..inserted_start + new_len,
			});
			delta += new_len as isize - (offsets.end - offsets.start) as isize;
		}

		let mut offset_edits = Vec::with_capacity(changes.len());
		for change in changes.iter().rev() {
			self.rope.remove(change.replaced.clone());
			self.rope.insert(change.replaced.start, &change.text);
			offset_edits.push(change.offset_edit());
		}
		self.tracker.apply(&offset_edits, origin);

		self.version += 1;
		let event = ChangeEvent {
			version: self.version,
			origin,
			changes,
		};
		tracing::trace!(
			version = event.version,
			?origin,
			changes = event.changes.len(),
			"applied edits",
		);
		if !self.subscribers.is_empty() {
			self.log.push_back(event.clone());
		}
		Ok(event)
	}

	/// Register a new listener.
	///
	/// The listener receives every change applied after this call through [`Self::poll()`].
	pub fn subscribe(&mut self) -> Subscription {
		let scope = ScopeId(self.next_scope);
		self.next_scope += 1;
		let alive = Arc::new(());
		self.subscribers.insert(scope, Subscriber {
			seen: self.version,
			alive: Arc::downgrade(&alive),
		});
		Subscription { scope, _alive: alive }
	}

	/// Take all changes the listener has not seen yet.
	pub fn poll(&mut self, subscription: &Subscription) -> Vec<ChangeEvent> {
		let Some(subscriber) = self.subscribers.get_mut(&subscription.scope) else {
			return Vec::new();
		};
		let seen = std::mem::replace(&mut subscriber.seen, self.version);
		let events: Vec<ChangeEvent> = self.log.iter().filter(|event| event.version > seen).cloned().collect();
		tracing::trace!(scope = ?subscription.scope, events = events.len(), "polled document changes");
		self.trim_log();
		events
	}

	/// Remove a listener and all ranges tracked in its scope.
	pub fn unsubscribe(&mut self, subscription: Subscription) {
		self.subscribers.remove(&subscription.scope);
		self.tracker.remove_scope(subscription.scope);
		self.trim_log();
	}

	#[cfg(test)]
	pub(crate) fn subscriber_count(&self) -> usize {
		self.subscribers.len()
	}

	/// Remove the listeners whose [`Subscription`] was dropped, together with their tracked ranges.
	fn release_dropped_subscribers(&mut self) {
		let dropped: Vec<ScopeId> = self
			.subscribers
			.iter()
			.filter(|(_, subscriber)| subscriber.alive.strong_count() == 0)
			.map(|(&scope, _)| scope)
			.collect();
		if dropped.is_empty() {
			return;
		}
		for scope in dropped {
			self.subscribers.remove(&scope);
			let ranges = self.tracker.remove_scope(scope);
			tracing::debug!(?scope, ranges, "released dropped subscription");
		}
		self.trim_log();
	}

	/// Drop all changes that every subscriber has seen.
	fn trim_log(&mut self) {
		let oldest = self
			.subscribers
			.values()
			.map(|subscriber| subscriber.seen)
			.min()
			.unwrap_or(self.version);
		while self.log.front().is_some_and(|event| event.version <= oldest) {
			self.log.pop_front();
		}
	}
}

/// The number of characters of the line break at the end of a line.
fn line_break_len(line: RopeSlice<'_>) -> usize {
	let len = line.len_chars();
	if len == 0 {
		return 0;
	}
	match line.char(len - 1) {
		'\n' if len > 1 && line.char(len - 2) == '\r' => 2,
		'\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}' => 1,
		_ => 0,
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use assert2::{assert, check, let_assert};

	#[test]
	fn lines_and_positions() {
		let document = Document::new("function foo() {\n    console.log(a);\n}");
		assert!(document.line_count() == 3);
		check!(document.line(1).as_deref() == Some("    console.log(a);"));
		check!(document.line_len(2) == Some(1));
		check!(document.line(3) == None);
		check!(document.eol() == "\n");

		check!(let Ok(21) = document.offset_of(Position::new(1, 4)));
		check!(let Ok(Position { line: 1, column: 4 }) = document.position_of(21));
		check!(let Err(EditError::PositionOutOfBounds(_)) = document.offset_of(Position::new(1, 20)));
		check!(let Err(EditError::PositionOutOfBounds(_)) = document.offset_of(Position::new(5, 0)));
		check!(let Err(EditError::OffsetOutOfBounds(_)) = document.position_of(100));
	}

	#[test]
	fn crlf_lines() {
		let document = Document::new("a\r\nbc\r\n");
		check!(document.eol() == "\r\n");
		assert!(document.line_count() == 3);
		check!(document.line(0).as_deref() == Some("a"));
		check!(document.line_len(1) == Some(2));
		check!(let Ok(3) = document.offset_of(Position::new(1, 0)));
	}

	#[test]
	fn apply_edits_in_one_batch() {
		let mut document = Document::new("foo_bar_foo");
		let_assert!(Ok(event) = document.apply_edits(
			vec![
				TextEdit::new(Range::from_coords(0, 8, 0, 11), "LONGER"),
				TextEdit::new(Range::from_coords(0, 0, 0, 3), "x"),
			],
			EditOrigin::User,
		));
		assert!(document.text() == "x_bar_LONGER");
		assert!(event.version == 1);
		assert!(event.changes.len() == 2);
		assert!(event.changes[0].edit_index == 1);
		assert!(event.changes[0].inserted == (0..1));
		assert!(event.changes[1].edit_index == 0);
		assert!(event.changes[1].inserted == (6..12));
	}

	#[test]
	fn insertions_at_the_same_position_keep_their_order() {
		let mut document = Document::new("ab");
		let_assert!(Ok(_) = document.apply_edits(
			vec![
				TextEdit::insert(Position::new(0, 1), "1"),
				TextEdit::insert(Position::new(0, 1), "2"),
			],
			EditOrigin::User,
		));
		assert!(document.text() == "a12b");
	}

	#[test]
	fn overlapping_edits_are_rejected() {
		let mut document = Document::new("abcdef");
		let_assert!(Err(EditError::OverlappingEdits(_)) = document.apply_edits(
			vec![
				TextEdit::delete(Range::from_coords(0, 0, 0, 3)),
				TextEdit::delete(Range::from_coords(0, 2, 0, 4)),
			],
			EditOrigin::User,
		));
		assert!(document.text() == "abcdef");
		assert!(document.version() == 0);
	}

	#[test]
	fn edits_update_tracked_ranges() {
		let mut document = Document::new("foobarfoo");
		let subscription = document.subscribe();
		let id = document.tracker_mut().register(subscription.scope(), 3..6, Stickiness::GrowsAtEdges);

		let_assert!(Ok(_) = document.apply_edits(
			vec![
				TextEdit::insert(Position::new(0, 0), "xx"),
				TextEdit::insert(Position::new(0, 6), "yy"),
			],
			EditOrigin::User,
		));
		assert!(document.text() == "xxfoobaryyfoo");
		check!(document.tracker().resolve(id) == Some(5..10));
		check!(document.tracker_mut().take_touched(subscription.scope()) == [(id, 1)]);
	}

	#[test]
	fn subscribers_poll_independently() {
		let mut document = Document::new("");
		let first = document.subscribe();
		let_assert!(Ok(_) = document.apply_edits(vec![TextEdit::insert(Position::new(0, 0), "a")], EditOrigin::User));
		let second = document.subscribe();
		let_assert!(Ok(_) = document.apply_edits(
			vec![TextEdit::insert(Position::new(0, 1), "b")],
			EditOrigin::Session(first.scope()),
		));

		let events = document.poll(&second);
		assert!(events.len() == 1);
		assert!(events[0].origin == EditOrigin::Session(first.scope()));

		let events = document.poll(&first);
		assert!(events.len() == 2);
		assert!(events[0].changes[0].text == "a");
		assert!(document.poll(&first).is_empty());

		document.unsubscribe(first);
		document.unsubscribe(second);
		let_assert!(Ok(_) = document.apply_edits(vec![TextEdit::insert(Position::new(0, 0), "c")], EditOrigin::User));
		assert!(document.text() == "cab");
	}

	#[test]
	fn dropped_subscriptions_are_released() {
		let mut document = Document::new("abc");
		let kept = document.subscribe();
		let dropped = document.subscribe();
		document.tracker_mut().register(dropped.scope(), 0..3, Stickiness::GrowsAtEdges);
		let id = document.tracker_mut().register(kept.scope(), 0..3, Stickiness::GrowsAtEdges);
		drop(dropped);
		assert!(document.subscriber_count() == 2);

		for _ in 0..100 {
			let_assert!(Ok(_) = document.apply_edits(vec![TextEdit::insert(Position::new(0, 0), "x")], EditOrigin::User));
			document.poll(&kept);
		}
		assert!(document.subscriber_count() == 1);
		assert!(document.tracker().len() == 1);
		check!(document.tracker().resolve(id) == Some(0..103));
		assert!(document.log.is_empty());

		drop(kept);
		let_assert!(Ok(_) = document.apply_edits(vec![TextEdit::insert(Position::new(0, 0), "y")], EditOrigin::User));
		assert!(document.subscriber_count() == 0);
		assert!(document.tracker().is_empty());
		assert!(document.log.is_empty());
	}
}
