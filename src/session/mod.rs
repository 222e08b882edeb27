//! Interactive snippet sessions.

use std::collections::{BTreeMap, BTreeSet};

use crate::document::{Document, EditOrigin, Position, Range, RangeId, RangeTracker, Stickiness, Subscription, TextEdit};
use crate::editor::Editor;
use crate::error::{EditError, Error};
use crate::snippet::{navigation_key, Expansion, Snippet};

mod whitespace;
pub use whitespace::normalize_whitespace;

/// A snippet inserted at every selection of an editor, with its placeholders ready to be filled in.
///
/// Creating a session expands the snippet at each selection in one edit.
/// Every placeholder occurrence is then tracked as a live range of the document,
/// and the session moves the selections from one placeholder group to the next with [`Self::next()`] and [`Self::prev()`].
/// The final placeholder (`$0`) is always visited last.
///
/// Linked placeholders (the same index used more than once) are kept identical per selection:
/// when the user edits one of them, [`Self::sync()`] copies the new text to the others.
/// All methods that take the editor sync first.
///
/// Sessions can be nested: a session created while another one is active gets its own scope of tracked ranges,
/// and the edits of one session are ordinary edits from the point of view of the other.
///
/// [`Self::finish()`] ends a session and releases its tracked ranges and its change subscription right away.
/// A session that is simply dropped is released by the document on its next edit.
#[derive(Debug)]
pub struct SnippetSession {
	subscription: Subscription,
	groups: Vec<PlaceholderGroup>,
	active: usize,
	site_count: usize,
}

/// All occurrences of one placeholder index.
#[derive(Debug)]
pub struct PlaceholderGroup {
	index: u32,
	occurrences: Vec<Occurrence>,
}

impl PlaceholderGroup {
	/// The placeholder index of the group.
	#[inline]
	pub fn index(&self) -> u32 {
		self.index
	}

	/// Check if this is the group of the final placeholder.
	#[inline]
	pub fn is_final(&self) -> bool {
		self.index == 0
	}

	/// The occurrences, ordered by insertion site and then by their order in the template.
	#[inline]
	pub fn occurrences(&self) -> &[Occurrence] {
		&self.occurrences
	}
}

/// One placeholder occurrence at one insertion site.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Occurrence {
	site: usize,
	ordinal: usize,
	parent: Option<usize>,
	range: RangeId,
}

impl Occurrence {
	/// The index of the selection the snippet was inserted at.
	#[inline]
	pub fn site(&self) -> usize {
		self.site
	}

	/// The position of the occurrence among all placeholders of the template.
	#[inline]
	pub fn ordinal(&self) -> usize {
		self.ordinal
	}

	/// The ordinal of the placeholder this one is nested in, if any.
	#[inline]
	pub fn parent(&self) -> Option<usize> {
		self.parent
	}

	/// The tracked range of the occurrence in the document.
	#[inline]
	pub fn range_id(&self) -> RangeId {
		self.range
	}
}

/// A pending copy of linked placeholder text into one sibling occurrence.
struct MirrorTarget {
	id: RangeId,
	offsets: std::ops::Range<usize>,
	text: String,
}

impl SnippetSession {
	/// Parse a snippet template and insert it at all selections of the editor.
	///
	/// Malformed placeholders are inserted as literal text, see [`Snippet::parse()`].
	pub fn insert(editor: &mut Editor, template: &str) -> Result<Self, EditError> {
		Self::new(editor, &Snippet::parse(template))
	}

	/// Parse a snippet template strictly and insert it at all selections of the editor.
	pub fn insert_strict(editor: &mut Editor, template: &str) -> Result<Self, Error> {
		let snippet = Snippet::parse_strict(template)?;
		Ok(Self::new(editor, &snippet)?)
	}

	/// Insert a snippet at all selections of the editor.
	///
	/// Every selection is replaced by its own expansion of the snippet, with whitespace normalized for that position.
	/// Afterwards, the first placeholder group is selected.
	pub fn new(editor: &mut Editor, snippet: &Snippet) -> Result<Self, EditError> {
		let sites = editor.selections().to_vec();
		let expansions: Vec<Expansion> = sites
			.iter()
			.map(|site| {
				let normalized = normalize_whitespace(editor.document(), site.start, snippet.source());
				if normalized == snippet.source() {
					snippet.expand()
				} else {
					Snippet::parse(normalized).expand()
				}
			})
			.collect();

		let subscription = editor.document_mut().subscribe();
		let scope = subscription.scope();
		let edits = sites
			.iter()
			.zip(&expansions)
			.map(|(&site, expansion)| TextEdit::new(site, expansion.text()))
			.collect();
		let event = match editor.apply_edits(edits, EditOrigin::Session(scope)) {
			Ok(event) => event,
			Err(e) => {
				editor.document_mut().unsubscribe(subscription);
				return Err(e);
			},
		};
		// Skip our own expansion in the change feed.
		editor.document_mut().poll(&subscription);

		let mut starts = vec![0; sites.len()];
		for change in &event.changes {
			starts[change.edit_index] = change.inserted.start;
		}

		let tracker = editor.document_mut().tracker_mut();
		let mut groups: BTreeMap<(bool, u32), Vec<Occurrence>> = BTreeMap::new();
		for (site, (expansion, start)) in expansions.iter().zip(&starts).enumerate() {
			// Ordinals of the placeholders enclosing the current one.
			let mut ancestors: Vec<usize> = Vec::new();
			for (ordinal, span) in expansion.placeholders().iter().enumerate() {
				ancestors.truncate(span.depth);
				let parent = ancestors.last().copied();
				ancestors.push(ordinal);
				let range = tracker.register(
					scope,
					start + span.range.start..start + span.range.end,
					Stickiness::NeverGrowsAtEdges,
				);
				groups
					.entry(navigation_key(span.index))
					.or_default()
					.push(Occurrence { site, ordinal, parent, range });
			}
		}

		let mut session = Self {
			subscription,
			groups: groups
				.into_iter()
				.map(|((_, index), occurrences)| PlaceholderGroup { index, occurrences })
				.collect(),
			active: 0,
			site_count: sites.len(),
		};
		tracing::debug!(
			?scope,
			sites = session.site_count,
			groups = session.groups.len(),
			"started snippet session",
		);
		session.activate(editor, 0);
		Ok(session)
	}

	/// Adjust line breaks and indentation of snippet text for insertion at `anchor`.
	///
	/// See [`normalize_whitespace()`].
	#[inline]
	pub fn normalize_whitespace(document: &Document, anchor: Position, text: &str) -> String {
		normalize_whitespace(document, anchor, text)
	}

	/// Select the next placeholder group.
	///
	/// Does nothing if the final placeholder is already selected.
	pub fn next(&mut self, editor: &mut Editor) {
		self.sync(editor);
		if self.active + 1 < self.groups.len() {
			self.activate(editor, self.active + 1);
		}
	}

	/// Select the previous placeholder group.
	///
	/// Does nothing if the first placeholder group is already selected.
	pub fn prev(&mut self, editor: &mut Editor) {
		self.sync(editor);
		if self.active > 0 {
			self.activate(editor, self.active - 1);
		}
	}

	/// Check if the final placeholder is selected.
	#[inline]
	pub fn is_at_final_placeholder(&self) -> bool {
		self.groups[self.active].is_final()
	}

	/// Check if the selections of the editor are exactly the ranges of the active placeholder group.
	///
	/// The selections must match in number, in position and in order.
	pub fn validate_selections(&mut self, editor: &mut Editor) -> bool {
		self.sync(editor);
		editor.selections() == self.active_ranges(editor.document())
	}

	/// The placeholder index of the active group.
	#[inline]
	pub fn active_index(&self) -> u32 {
		self.groups[self.active].index
	}

	/// The current ranges of the active placeholder group.
	pub fn active_ranges(&self, document: &Document) -> Vec<Range> {
		self.groups[self.active]
			.occurrences
			.iter()
			.filter_map(|occurrence| document.tracker().resolve(occurrence.range))
			.filter_map(|offsets| document.range_of(offsets).ok())
			.collect()
	}

	/// All placeholder groups in navigation order.
	#[inline]
	pub fn groups(&self) -> &[PlaceholderGroup] {
		&self.groups
	}

	/// The number of selections the snippet was inserted at.
	#[inline]
	pub fn site_count(&self) -> usize {
		self.site_count
	}

	/// Process the document changes since the last call and update linked placeholders.
	///
	/// For every placeholder that was edited, the new text is copied to the other occurrences
	/// of the same index at the same insertion site, in a single batch of edits.
	/// If several occurrences of one index were edited since the last sync, the most recently edited one wins.
	/// Siblings that can not be updated are left alone.
	pub fn sync(&mut self, editor: &mut Editor) {
		let scope = self.subscription.scope();
		let document = editor.document_mut();
		let events = document.poll(&self.subscription);
		let touched: BTreeMap<RangeId, u64> = document.tracker_mut().take_touched(scope).into_iter().collect();
		if touched.is_empty() {
			return;
		}
		tracing::trace!(?scope, events = events.len(), touched = touched.len(), "syncing snippet session");

		let targets = self.mirror_targets(document, &touched);
		if targets.is_empty() {
			return;
		}
		for target in &targets {
			document.tracker_mut().set_stickiness(target.id, Stickiness::GrowsAtEdges);
		}
		let edits = mirror_edits(document, &targets);

		if !edits.is_empty() {
			let count = edits.len();
			match editor.apply_edits(edits, EditOrigin::Session(scope)) {
				Ok(_) => tracing::debug!(?scope, edits = count, "mirrored linked placeholders"),
				Err(e) => tracing::warn!(?scope, error = %e, "failed to mirror linked placeholders"),
			}
			editor.document_mut().poll(&self.subscription);
		}
		self.update_stickiness(editor.document_mut().tracker_mut());
	}

	/// End the session, releasing all tracked ranges and the change subscription.
	///
	/// The inserted text and the selections of the editor are left as they are.
	pub fn finish(self, editor: &mut Editor) {
		tracing::debug!(scope = ?self.subscription.scope(), "finished snippet session");
		editor.document_mut().unsubscribe(self.subscription);
	}

	/// Make a group the active one and select its ranges.
	fn activate(&mut self, editor: &mut Editor, active: usize) {
		self.active = active;
		let tracker = editor.document_mut().tracker_mut();
		self.update_stickiness(tracker);

		let group = &self.groups[active];
		if group.is_final() {
			for occurrence in &group.occurrences {
				if let Some(range) = tracker.resolve(occurrence.range) {
					tracker.set_range(occurrence.range, range.start..range.start);
				}
			}
		}

		let selections = self.active_ranges(editor.document());
		tracing::debug!(
			scope = ?self.subscription.scope(),
			index = group.index,
			selections = selections.len(),
			"selected placeholder group",
		);
		editor.set_selections(selections);
	}

	/// Let the active group and the placeholders that contain it grow at their edges, and nothing else.
	///
	/// The final placeholder never grows, even when it is active.
	fn update_stickiness(&self, tracker: &mut RangeTracker) {
		let growing = self.growing_ranges();
		for occurrence in self.groups.iter().flat_map(|group| &group.occurrences) {
			let stickiness = if growing.contains(&occurrence.range) {
				Stickiness::GrowsAtEdges
			} else {
				Stickiness::NeverGrowsAtEdges
			};
			tracker.set_stickiness(occurrence.range, stickiness);
		}
	}

	/// The ranges of the active group, together with the ranges of all placeholders they are nested in.
	fn growing_ranges(&self) -> BTreeSet<RangeId> {
		let mut growing = BTreeSet::new();
		let active = &self.groups[self.active];
		if active.is_final() {
			return growing;
		}

		let by_ordinal: BTreeMap<(usize, usize), &Occurrence> = self
			.groups
			.iter()
			.filter(|group| !group.is_final())
			.flat_map(|group| &group.occurrences)
			.map(|occurrence| ((occurrence.site, occurrence.ordinal), occurrence))
			.collect();
		for occurrence in &active.occurrences {
			let mut current = Some(occurrence);
			while let Some(occurrence) = current {
				growing.insert(occurrence.range);
				current = occurrence
					.parent
					.and_then(|parent| by_ordinal.get(&(occurrence.site, parent)).copied());
			}
		}
		growing
	}

	/// Find the sibling occurrences that need the text of an edited occurrence.
	fn mirror_targets(&self, document: &Document, touched: &BTreeMap<RangeId, u64>) -> Vec<MirrorTarget> {
		let tracker = document.tracker();
		let mut targets = Vec::new();
		for group in &self.groups {
			for siblings in group.occurrences.chunk_by(|a, b| a.site == b.site) {
				if siblings.len() < 2 {
					continue;
				}
				// The most recent edit wins, the first occurrence wins within one batch.
				let source = siblings
					.iter()
					.filter_map(|occurrence| Some((*touched.get(&occurrence.range)?, occurrence)))
					.min_by_key(|(batch, _)| std::cmp::Reverse(*batch));
				let Some((_, source)) = source else {
					continue;
				};
				let Some(source_offsets) = tracker.resolve(source.range) else {
					tracing::warn!(index = group.index, site = source.site, "edited placeholder is no longer tracked");
					continue;
				};
				let text = match document.slice(source_offsets.clone()) {
					Ok(text) => text,
					Err(e) => {
						tracing::warn!(index = group.index, site = source.site, error = %e, "failed to read edited placeholder");
						continue;
					},
				};

				for sibling in siblings.iter().filter(|sibling| sibling.range != source.range) {
					let Some(offsets) = tracker.resolve(sibling.range) else {
						tracing::warn!(index = group.index, site = sibling.site, "linked placeholder is no longer tracked");
						continue;
					};
					if offsets.start < source_offsets.end && source_offsets.start < offsets.end {
						tracing::debug!(index = group.index, site = sibling.site, "not mirroring into overlapping placeholder");
						continue;
					}
					if document.slice(offsets.clone()).is_ok_and(|current| current == text) {
						continue;
					}
					targets.push(MirrorTarget {
						id: sibling.range,
						offsets,
						text: text.clone(),
					});
				}
			}
		}
		targets
	}
}

/// Turn mirror targets into the smallest edits that give each target its new text.
///
/// Targets nested in another target are skipped: the outer one already carries their text.
fn mirror_edits(document: &Document, targets: &[MirrorTarget]) -> Vec<TextEdit> {
	let mut targets: Vec<&MirrorTarget> = targets.iter().collect();
	targets.sort_by_key(|target| (target.offsets.start, std::cmp::Reverse(target.offsets.end)));

	let mut edits = Vec::with_capacity(targets.len());
	let mut outer: Option<std::ops::Range<usize>> = None;
	for target in targets {
		if let Some(outer) = &outer {
			if target.offsets.start < outer.end || target.offsets.end <= outer.end {
				continue;
			}
		}
		outer = Some(target.offsets.clone());

		let current = match document.slice(target.offsets.clone()) {
			Ok(current) => current,
			Err(e) => {
				tracing::warn!(error = %e, "failed to read linked placeholder");
				continue;
			},
		};
		let (prefix, suffix) = common_affixes(&current, &target.text);
		let current_len = current.chars().count();
		let replaced = target.offsets.start + prefix..target.offsets.start + current_len - suffix;
		let range = match document.range_of(replaced) {
			Ok(range) => range,
			Err(e) => {
				tracing::warn!(error = %e, "failed to locate linked placeholder");
				continue;
			},
		};
		let new_len = target.text.chars().count();
		let text: String = target.text.chars().skip(prefix).take(new_len - prefix - suffix).collect();
		edits.push(TextEdit::new(range, text));
	}
	edits
}

/// Count the characters at the start and at the end that two strings have in common.
///
/// The prefix and suffix never overlap in either string.
fn common_affixes(a: &str, b: &str) -> (usize, usize) {
	let prefix = a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count();
	let max_suffix = a.chars().count().min(b.chars().count()) - prefix;
	let suffix = a
		.chars()
		.rev()
		.zip(b.chars().rev())
		.take(max_suffix)
		.take_while(|(x, y)| x == y)
		.count();
	(prefix, suffix)
}
