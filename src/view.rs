//! Multi-cursor view over a [`crate::text::Text`].
//!
//! Grounded on the teacher's cursor/selection fields in `linebuf.rs` and
//! original_source/vis.c's `View`/`Cursor` capability set from SPEC_FULL.md
//! §6. Kept deliberately thin: viewport math is just enough to support the
//! window-scoped motions (`H`/`M`/`L`), not a real screen layout engine.

use crate::register::Register;
use crate::text::{Pos, Range};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorId(pub usize);

#[derive(Debug, Clone)]
pub struct Cursor {
	pub pos: Pos,
	pub selection: Option<Range>,
	/// Per-cursor register, used only when the view has more than one cursor
	/// (SPEC_FULL.md §4.7).
	pub register: Register,
	/// `$`-sticky: vertical motions remember the column they were asked to
	/// reach even after passing through a shorter line.
	pub want_col: Option<usize>,
}

impl Cursor {
	fn new(pos: Pos) -> Self {
		Self { pos, selection: None, register: Register::new(), want_col: None }
	}
}

pub struct View {
	cursors: Vec<Cursor>,
	primary: usize,
	pub top_line: usize,
	pub height: usize,
	/// Fixed point visual mode was entered from; motions extend the selection
	/// from here to the current cursor rather than from the cursor's previous
	/// position, which would only ever cover the last single motion.
	anchor: Option<Pos>,
}

impl View {
	pub fn new() -> Self {
		Self { cursors: vec![Cursor::new(0)], primary: 0, top_line: 1, height: 24, anchor: None }
	}

	pub fn set_anchor(&mut self, pos: Pos) {
		self.anchor = Some(pos);
	}
	pub fn anchor(&self) -> Option<Pos> {
		self.anchor
	}
	pub fn clear_anchor(&mut self) {
		self.anchor = None;
	}

	pub fn cursor(&self) -> &Cursor {
		&self.cursors[self.primary]
	}
	pub fn cursor_mut(&mut self) -> &mut Cursor {
		&mut self.cursors[self.primary]
	}

	pub fn cursors(&self) -> &[Cursor] {
		&self.cursors
	}

	pub fn cursors_pos(&self) -> Vec<Pos> {
		self.cursors.iter().map(|c| c.pos).collect()
	}

	pub fn cursor_to(&mut self, pos: Pos) {
		self.cursor_mut().pos = pos;
		self.cursor_mut().want_col = None;
	}

	pub fn cursors_count(&self) -> usize {
		self.cursors.len()
	}

	/// Spawn a new cursor at `pos`, returning its id. Cursors are kept sorted
	/// by position so iteration order matches the text layout.
	pub fn cursors_new(&mut self, pos: Pos) -> CursorId {
		self.cursors.push(Cursor::new(pos));
		self.cursors.sort_by_key(|c| c.pos);
		self.primary = self.cursors.iter().position(|c| c.pos == pos).unwrap_or(0);
		CursorId(self.primary)
	}

	/// Dispose every cursor except the one at `keep_pos`, collapsing back to
	/// a single cursor (used when an operator finishes a multi-cursor pass,
	/// or when leaving visual mode).
	pub fn collapse_to(&mut self, keep_pos: Pos) {
		self.cursors = vec![Cursor::new(keep_pos)];
		self.primary = 0;
	}

	/// Dispose the cursor currently at `pos`, if more than one remains.
	pub fn dispose_at(&mut self, pos: Pos) {
		if self.cursors.len() <= 1 {
			return;
		}
		if let Some(i) = self.cursors.iter().position(|c| c.pos == pos) {
			self.cursors.remove(i);
			if self.primary >= self.cursors.len() {
				self.primary = self.cursors.len() - 1;
			}
		}
	}

	pub fn selection_set(&mut self, range: Range) {
		self.cursor_mut().selection = Some(range);
	}
	pub fn selection_get(&self) -> Option<Range> {
		self.cursor().selection
	}
	pub fn selection_clear(&mut self) {
		self.cursor_mut().selection = None;
	}

	pub fn scroll_to(&mut self, pos: Pos, lineno: usize) {
		self.cursor_to(pos);
		if lineno < self.top_line {
			self.top_line = lineno;
		} else if lineno >= self.top_line + self.height {
			self.top_line = lineno.saturating_sub(self.height) + 1;
		}
	}
}

impl Default for View {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_cursors_stay_sorted_by_position() {
		let mut v = View::new();
		v.cursor_to(10);
		v.cursors_new(2);
		v.cursors_new(5);
		let positions: Vec<_> = v.cursors().iter().map(|c| c.pos).collect();
		assert_eq!(positions, vec![2, 5, 10]);
	}

	#[test]
	fn dispose_keeps_at_least_one_cursor() {
		let mut v = View::new();
		v.dispose_at(0);
		assert_eq!(v.cursors_count(), 1);
	}
}
