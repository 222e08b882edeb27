//! Selections on top of a document.

use crate::document::{Bias, ChangeEvent, Document, EditOrigin, Position, Range, TextEdit};
use crate::error::EditError;

/// A document together with the user's selections.
///
/// There is always at least one selection.
/// Selections are kept in the order in which they were set; they are not sorted or merged.
#[derive(Debug)]
pub struct Editor {
	document: Document,
	selections: Vec<Range>,
}

impl Editor {
	/// Create an editor with a single caret at the start of the document.
	pub fn new(document: Document) -> Self {
		Self {
			document,
			selections: vec![Range::default()],
		}
	}

	/// The document being edited.
	#[inline]
	pub fn document(&self) -> &Document {
		&self.document
	}

	/// The document being edited, mutably.
	///
	/// Edits applied directly to the document do not update the selections.
	/// Use [`Self::apply_edits()`] for that.
	#[inline]
	pub fn document_mut(&mut self) -> &mut Document {
		&mut self.document
	}

	/// Consume the editor to get the document back.
	pub fn into_document(self) -> Document {
		self.document
	}

	/// The current selections.
	#[inline]
	pub fn selections(&self) -> &[Range] {
		&self.selections
	}

	/// The first selection.
	#[inline]
	pub fn primary_selection(&self) -> Range {
		self.selections[0]
	}

	/// Replace all selections.
	///
	/// An empty list resets the selections to a single caret at the start of the document.
	pub fn set_selections(&mut self, selections: Vec<Range>) {
		if selections.is_empty() {
			self.selections = vec![Range::default()];
		} else {
			self.selections = selections;
		}
	}

	/// Replace all selections with a single one.
	pub fn set_selection(&mut self, selection: Range) {
		self.selections = vec![selection];
	}

	/// Apply a batch of edits and move the selections along with the text.
	///
	/// A selection boundary inside replaced text moves to the start of the replacement,
	/// except that the end of a non-empty selection moves to the end of it.
	pub fn apply_edits(&mut self, edits: Vec<TextEdit>, origin: EditOrigin) -> Result<ChangeEvent, EditError> {
		let selections = self.selection_offsets()?;
		let event = self.document.apply_edits(edits, origin)?;
		let mapped = selections
			.into_iter()
			.map(|offsets| map_selection(&event, offsets))
			.collect::<Vec<_>>();
		self.selections = mapped
			.into_iter()
			.map(|offsets| self.document.range_of(offsets))
			.collect::<Result<_, _>>()?;
		Ok(event)
	}

	/// Replace every selection with the given text, as the user typing.
	///
	/// Afterwards, every selection is a caret at the end of its inserted text.
	pub fn type_text(&mut self, text: &str) -> Result<ChangeEvent, EditError> {
		let edits = self
			.selections
			.iter()
			.map(|&selection| TextEdit::new(selection, text))
			.collect();
		self.apply_user_edits(edits)
	}

	/// Delete every selection, or the character before every caret, as the user pressing backspace.
	pub fn delete_backward(&mut self) -> Result<ChangeEvent, EditError> {
		let mut edits = Vec::with_capacity(self.selections.len());
		for &selection in &self.selections {
			if !selection.is_empty() {
				edits.push(TextEdit::delete(selection));
				continue;
			}
			let offset = self.document.offset_of(selection.start)?;
			let start = self.document.position_of(offset.saturating_sub(1))?;
			edits.push(TextEdit::delete(Range::new(start, selection.start)));
		}
		self.apply_user_edits(edits)
	}

	/// Apply edits made by the user, one per selection, and put a caret after each inserted text.
	fn apply_user_edits(&mut self, edits: Vec<TextEdit>) -> Result<ChangeEvent, EditError> {
		let event = self.document.apply_edits(edits, EditOrigin::User)?;
		let mut carets = vec![Position::default(); event.changes.len()];
		for change in &event.changes {
			carets[change.edit_index] = self.document.position_of(change.inserted.end)?;
		}
		self.selections = carets.into_iter().map(Range::caret).collect();
		if self.selections.is_empty() {
			self.selections.push(Range::default());
		}
		Ok(event)
	}

	/// The selections as character offsets.
	fn selection_offsets(&self) -> Result<Vec<std::ops::Range<usize>>, EditError> {
		self.selections
			.iter()
			.map(|&selection| self.document.offset_range(selection))
			.collect()
	}
}

/// Map a selection through all changes of an event.
fn map_selection(event: &ChangeEvent, offsets: std::ops::Range<usize>) -> std::ops::Range<usize> {
	let mut start = offsets.start;
	let mut end = offsets.end;
	let empty = start == end;
	// Changes are applied from the end of the document backwards, so earlier offsets stay valid.
	for change in event.changes.iter().rev() {
		let edit = change.offset_edit();
		start = edit.map_offset(start, Bias::Left);
		end = if empty {
			start
		} else {
			edit.map_offset(end, Bias::Right).max(start)
		};
	}
	start..end
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use assert2::{assert, let_assert};

	fn editor_with(text: &str, selections: Vec<Range>) -> Editor {
		let mut editor = Editor::new(Document::new(text));
		editor.set_selections(selections);
		editor
	}

	#[test]
	fn empty_selections_reset_to_a_caret() {
		let mut editor = editor_with("abc", vec![]);
		assert!(editor.selections() == [Range::default()]);
		editor.set_selection(Range::from_coords(0, 1, 0, 2));
		assert!(editor.primary_selection() == Range::from_coords(0, 1, 0, 2));
	}

	#[test]
	fn type_text_at_every_selection() {
		let mut editor = editor_with("foo\nbar", vec![Range::from_coords(0, 0, 0, 3), Range::caret(Position::new(1, 1))]);
		let_assert!(Ok(event) = editor.type_text("xy"));
		assert!(event.origin == EditOrigin::User);
		assert!(editor.document().text() == "xy\nbxyar");
		assert!(editor.selections() == [Range::caret(Position::new(0, 2)), Range::caret(Position::new(1, 3))]);
	}

	#[test]
	fn delete_backward() {
		let mut editor = editor_with("abc\ndef", vec![Range::caret(Position::new(0, 2)), Range::from_coords(1, 0, 1, 2)]);
		let_assert!(Ok(_) = editor.delete_backward());
		assert!(editor.document().text() == "ac\nf");
		assert!(editor.selections() == [Range::caret(Position::new(0, 1)), Range::caret(Position::new(1, 0))]);

		let mut editor = editor_with("abc", vec![Range::caret(Position::new(0, 0))]);
		let_assert!(Ok(_) = editor.delete_backward());
		assert!(editor.document().text() == "abc");
	}

	#[test]
	fn selections_follow_edits() {
		let mut editor = editor_with("hello world", vec![Range::from_coords(0, 6, 0, 11), Range::caret(Position::new(0, 5))]);
		let_assert!(Ok(_) = editor.apply_edits(
			vec![TextEdit::insert(Position::new(0, 0), "> ")],
			EditOrigin::User,
		));
		assert!(editor.selections() == [Range::from_coords(0, 8, 0, 13), Range::caret(Position::new(0, 7))]);

		let_assert!(Ok(_) = editor.apply_edits(
			vec![TextEdit::new(Range::from_coords(0, 8, 0, 13), "there!")],
			EditOrigin::User,
		));
		assert!(editor.document().text() == "> hello there!");
		assert!(editor.selections() == [Range::from_coords(0, 8, 0, 14), Range::caret(Position::new(0, 7))]);
	}

	#[test]
	fn invalid_edits_leave_selections_alone() {
		let mut editor = editor_with("abc", vec![Range::caret(Position::new(0, 1))]);
		let_assert!(Err(EditError::PositionOutOfBounds(_)) = editor.apply_edits(
			vec![TextEdit::insert(Position::new(3, 0), "x")],
			EditOrigin::User,
		));
		assert!(editor.selections() == [Range::caret(Position::new(0, 1))]);
		assert!(editor.into_document().text() == "abc");
	}
}
