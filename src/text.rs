//! The minimal text buffer behind the narrow interface described in
//! SPEC_FULL.md §4.10/§6. A single growable `String`, not a piece table or
//! rope — the storage algorithm is explicitly out of scope; what matters
//! here is giving the motion/text-object/operator tables something real to
//! scan and mutate.
//!
//! Word/sentence/paragraph/bracket scanning is grounded on the teacher's
//! equivalent helpers in `examples/km-clay-vicut/src/linebuf.rs`, reworked
//! to walk a standalone `String` through `char_indices` instead of the
//! teacher's in-place editor fields.

use std::collections::HashMap;

use regex::Regex;
use unicode_width::UnicodeWidthChar;

use crate::types::{Direction, Word};

/// Sentinel meaning "no such position", mirroring vis.c's `EPOS`.
pub const EPOS: usize = usize::MAX;

pub type Pos = usize;

/// An opaque handle into a [`Text`]'s mark table. Stays valid across edits
/// that don't delete the marked byte; resolves to `None` once it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mark(pub u32);

/// A half-open `[start, end)` range, optionally tagged linewise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
	pub start: Pos,
	pub end: Pos,
	pub linewise: bool,
}

impl Range {
	pub fn new(start: Pos, end: Pos) -> Self {
		let (start, end) = if start <= end { (start, end) } else { (end, start) };
		Self { start, end, linewise: false }
	}
	pub fn linewise(start: Pos, end: Pos) -> Self {
		let mut r = Self::new(start, end);
		r.linewise = true;
		r
	}
	pub fn is_valid(&self) -> bool {
		self.start != EPOS && self.end != EPOS && self.start <= self.end
	}
	pub fn size(&self) -> usize {
		self.end.saturating_sub(self.start)
	}
	pub fn union(&self, other: &Range) -> Range {
		Range {
			start: self.start.min(other.start),
			end: self.end.max(other.end),
			linewise: self.linewise || other.linewise,
		}
	}
}

pub struct Text {
	buf: String,
	marks: HashMap<u32, Pos>,
	next_mark_id: u32,
	/// Linear undo log: one entry per `snapshot()` call.
	history: Vec<String>,
	/// Positions of recent edits, walked by the changelist (`g;`/`g,`).
	change_positions: Vec<Pos>,
}

impl Text {
	pub fn new() -> Self {
		Self::from_str("")
	}

	pub fn from_str(s: &str) -> Self {
		Self {
			buf: s.to_string(),
			marks: HashMap::new(),
			next_mark_id: 0,
			history: Vec::new(),
			change_positions: Vec::new(),
		}
	}

	pub fn as_str(&self) -> &str {
		&self.buf
	}

	pub fn len(&self) -> usize {
		self.buf.len()
	}

	pub fn is_empty(&self) -> bool {
		self.buf.is_empty()
	}

	pub fn byte(&self, pos: Pos) -> Option<u8> {
		self.buf.as_bytes().get(pos).copied()
	}

	pub fn char_at(&self, pos: Pos) -> Option<char> {
		self.buf[pos..].chars().next()
	}

	pub fn char_before(&self, pos: Pos) -> Option<char> {
		self.buf[..pos].chars().next_back()
	}

	/// Byte position immediately after the character starting at `pos`.
	pub fn char_next(&self, pos: Pos) -> Pos {
		match self.char_at(pos) {
			Some(c) => pos + c.len_utf8(),
			None => pos,
		}
	}

	/// Byte position of the character immediately before `pos`.
	pub fn char_prev(&self, pos: Pos) -> Pos {
		match self.char_before(pos) {
			Some(c) => pos - c.len_utf8(),
			None => pos,
		}
	}

	// --- mutation -----------------------------------------------------

	pub fn insert(&mut self, pos: Pos, s: &str) {
		self.buf.insert_str(pos, s);
		self.shift_marks_insert(pos, s.len());
		self.record_change(pos);
	}

	pub fn delete(&mut self, pos: Pos, len: usize) {
		self.delete_range(Range::new(pos, pos + len));
	}

	pub fn delete_range(&mut self, range: Range) {
		if !range.is_valid() || range.start >= self.buf.len() {
			return;
		}
		let end = range.end.min(self.buf.len());
		self.buf.replace_range(range.start..end, "");
		self.shift_marks_delete(range.start, end);
		self.record_change(range.start);
	}

	pub fn bytes_get(&self, range: Range) -> &str {
		let end = range.end.min(self.buf.len());
		if range.start >= end {
			return "";
		}
		&self.buf[range.start..end]
	}

	// --- lines ----------------------------------------------------------

	/// Start of the line containing `pos`.
	pub fn line_begin(&self, pos: Pos) -> Pos {
		self.buf[..pos.min(self.buf.len())].rfind('\n').map(|i| i + 1).unwrap_or(0)
	}

	/// First non-blank byte of the line containing `pos`.
	pub fn line_start(&self, pos: Pos) -> Pos {
		let begin = self.line_begin(pos);
		let end = self.line_end(pos);
		self.buf[begin..end].find(|c: char| !c.is_whitespace()).map(|i| begin + i).unwrap_or(end)
	}

	/// One past the last byte on the line containing `pos` (the newline, or
	/// buffer end if there is none).
	pub fn line_end(&self, pos: Pos) -> Pos {
		self.buf[pos.min(self.buf.len())..].find('\n').map(|i| pos + i).unwrap_or(self.buf.len())
	}

	/// Position of the last non-newline character on the line, suitable for
	/// `$` in normal mode (stops before the newline, never past it).
	pub fn line_finish(&self, pos: Pos) -> Pos {
		let end = self.line_end(pos);
		if end == self.line_begin(pos) {
			return end;
		}
		self.char_prev(end)
	}

	pub fn line_lastchar(&self, pos: Pos) -> Pos {
		self.line_finish(pos)
	}

	pub fn line_prev(&self, pos: Pos) -> Option<Pos> {
		let begin = self.line_begin(pos);
		if begin == 0 {
			return None;
		}
		Some(self.line_begin(begin - 1))
	}

	pub fn line_next(&self, pos: Pos) -> Option<Pos> {
		let end = self.line_end(pos);
		if end >= self.buf.len() {
			return None;
		}
		Some(end + 1)
	}

	pub fn pos_by_lineno(&self, lineno: usize) -> Pos {
		let mut pos = 0;
		for _ in 1..lineno {
			match self.line_next(pos) {
				Some(p) => pos = p,
				None => return pos,
			}
		}
		pos
	}

	pub fn lineno_by_pos(&self, pos: Pos) -> usize {
		1 + self.buf[..pos.min(self.buf.len())].matches('\n').count()
	}

	/// 0-based column (byte offset within its line) of `pos`.
	pub fn line_offset(&self, pos: Pos) -> usize {
		pos - self.line_begin(pos)
	}

	pub fn line_count(&self) -> usize {
		self.lineno_by_pos(self.buf.len())
	}

	// --- word / sentence / paragraph scanning ----------------------------

	fn is_word_char(c: char, kind: Word) -> bool {
		match kind {
			Word::Big => !c.is_whitespace(),
			Word::Normal => c.is_alphanumeric() || c == '_',
		}
	}

	fn class(c: char, kind: Word) -> u8 {
		if c.is_whitespace() {
			0
		} else if Self::is_word_char(c, kind) {
			1
		} else {
			2
		}
	}

	pub fn start_of_word_forward(&self, pos: Pos, kind: Word) -> Pos {
		let mut chars: Vec<(Pos, char)> = self.buf[pos..].char_indices().map(|(i, c)| (pos + i, c)).collect();
		chars.push((self.buf.len(), '\0'));
		if chars.len() <= 1 {
			return self.buf.len();
		}
		let start_class = Self::class(chars[0].1, kind);
		let mut i = 0;
		// skip the rest of the current word/run
		while i + 1 < chars.len() && Self::class(chars[i].1, kind) == start_class && start_class != 0 {
			i += 1;
		}
		// skip whitespace
		while i + 1 < chars.len() && chars[i].1.is_whitespace() {
			i += 1;
		}
		if i == 0 && start_class == 0 {
			while i + 1 < chars.len() && chars[i].1.is_whitespace() {
				i += 1;
			}
		}
		chars[i].0
	}

	pub fn start_of_word_backward(&self, pos: Pos, kind: Word) -> Pos {
		if pos == 0 {
			return 0;
		}
		let prefix: Vec<(Pos, char)> = self.buf[..pos].char_indices().collect();
		let mut i = prefix.len();
		// step back over whitespace
		while i > 0 && prefix[i - 1].1.is_whitespace() {
			i -= 1;
		}
		if i == 0 {
			return 0;
		}
		let class = Self::class(prefix[i - 1].1, kind);
		while i > 0 && Self::class(prefix[i - 1].1, kind) == class {
			i -= 1;
		}
		if i < prefix.len() { prefix[i].0 } else { pos }
	}

	pub fn end_of_word_forward(&self, pos: Pos, kind: Word) -> Pos {
		let rest: Vec<(Pos, char)> = self.buf[pos..].char_indices().map(|(i, c)| (pos + i, c)).collect();
		if rest.is_empty() {
			return pos;
		}
		let mut i = 0;
		// advance at least one char before re-measuring the end, so repeated
		// calls make progress from an existing word-end.
		i += 1;
		while i < rest.len() && rest[i].1.is_whitespace() {
			i += 1;
		}
		if i >= rest.len() {
			return rest.last().map(|(p, _)| *p).unwrap_or(pos);
		}
		let class = Self::class(rest[i].1, kind);
		while i + 1 < rest.len() && Self::class(rest[i + 1].1, kind) == class {
			i += 1;
		}
		rest[i].0
	}

	pub fn end_of_word_backward(&self, pos: Pos, kind: Word) -> Pos {
		let prefix: Vec<(Pos, char)> = self.buf[..pos].char_indices().collect();
		if prefix.is_empty() {
			return 0;
		}
		let mut i = prefix.len();
		i -= 1;
		while i > 0 && prefix[i].1.is_whitespace() {
			i -= 1;
		}
		prefix.get(i).map(|(p, _)| *p).unwrap_or(0)
	}

	/// `)`/`(` sentence motion: sentences end at `. `, `! `, `? ` (a
	/// terminator followed by whitespace) or a blank line.
	pub fn sentence(&self, pos: Pos, dir: Direction) -> Pos {
		let terms = ['.', '!', '?'];
		match dir {
			Direction::Forward => {
				let bytes: Vec<(Pos, char)> = self.buf[pos..].char_indices().map(|(i, c)| (pos + i, c)).collect();
				for w in bytes.windows(2) {
					if terms.contains(&w[0].1) && w[1].1.is_whitespace() {
						return w[1].0 + w[1].1.len_utf8();
					}
				}
				self.buf.len()
			}
			Direction::Backward => {
				let bytes: Vec<(Pos, char)> = self.buf[..pos].char_indices().collect();
				for w in bytes.windows(2).rev() {
					if terms.contains(&w[0].1) && w[1].1.is_whitespace() {
						return w[1].0 + w[1].1.len_utf8();
					}
				}
				0
			}
		}
	}

	/// `}`/`{` paragraph motion: paragraphs are separated by blank lines.
	pub fn paragraph(&self, pos: Pos, dir: Direction) -> Pos {
		match dir {
			Direction::Forward => {
				let mut cur = self.line_end(pos);
				loop {
					match self.line_next(cur) {
						None => return self.buf.len(),
						Some(next) => {
							if self.line_begin(next) == self.line_end(next) {
								return next;
							}
							cur = self.line_end(next);
						}
					}
				}
			}
			Direction::Backward => {
				let mut cur = pos;
				loop {
					match self.line_prev(cur) {
						None => return 0,
						Some(prev) => {
							if self.line_begin(prev) == self.line_end(prev) {
								return prev;
							}
							cur = prev;
						}
					}
				}
			}
		}
	}

	/// `|`: the byte position of display column `target` (1-based) on the
	/// line containing `pos`, expanding tabs to `tabwidth`. Clamps to the
	/// last character on the line if the line is too short.
	pub fn column(&self, pos: Pos, target: usize, tabwidth: usize) -> Pos {
		let begin = self.line_begin(pos);
		let end = self.line_end(pos);
		let tabwidth = tabwidth.max(1);
		let mut col = 0usize;
		for (i, c) in self.buf[begin..end].char_indices() {
			let w = if c == '\t' { tabwidth - (col % tabwidth) } else { c.width().unwrap_or(1) };
			if col + w >= target {
				return begin + i;
			}
			col += w;
		}
		self.line_finish(pos)
	}

	/// `[[`/`]]`/`[]`/`][`: nearest line at/after (`Forward`) or at/before
	/// (`Backward`) `pos` whose first character is `brace`, the classic
	/// "brace in column one" convention for function/section boundaries —
	/// language-aware parsing is out of scope.
	pub fn function_boundary(&self, pos: Pos, dir: Direction, brace: char) -> Pos {
		match dir {
			Direction::Forward => {
				let mut cur = self.line_end(pos);
				loop {
					match self.line_next(cur) {
						None => return self.buf.len(),
						Some(next) => {
							if self.char_at(next) == Some(brace) {
								return next;
							}
							cur = self.line_end(next);
						}
					}
				}
			}
			Direction::Backward => {
				let mut cur = self.line_begin(pos);
				loop {
					match self.line_prev(cur) {
						None => return 0,
						Some(prev) => {
							if self.char_at(prev) == Some(brace) {
								return prev;
							}
							cur = prev;
						}
					}
				}
			}
		}
	}

	/// The innermost enclosing function body around `pos`: the nearest line
	/// at or before `pos` opening with `{` in column one, paired with the
	/// nearest `}` in column one at or after it. `None` if `pos` isn't
	/// nested inside such a pair.
	pub fn enclosing_function(&self, pos: Pos) -> Option<(Pos, Pos)> {
		let mut line = self.line_begin(pos);
		loop {
			if self.char_at(line) == Some('{') {
				break;
			}
			line = self.line_prev(line)?;
		}
		let open = line;
		let mut cur = self.line_next(open)?;
		loop {
			if self.char_at(cur) == Some('}') {
				return Some((open, cur));
			}
			cur = self.line_next(cur)?;
		}
	}

	/// Find the position of the delimiter matching the one at `pos`, scanning
	/// forward or backward for balance. Returns `None` if `pos` isn't on a
	/// recognized delimiter or no match is found.
	pub fn find_match(&self, pos: Pos) -> Option<Pos> {
		const PAIRS: [(char, char); 4] = [('(', ')'), ('[', ']'), ('{', '}'), ('<', '>')];
		let c = self.char_at(pos)?;
		for (open, close) in PAIRS {
			if c == open {
				return self.scan_balanced(pos, open, close, Direction::Forward);
			}
			if c == close {
				return self.scan_balanced(pos, open, close, Direction::Backward);
			}
		}
		None
	}

	fn scan_balanced(&self, pos: Pos, open: char, close: char, dir: Direction) -> Option<Pos> {
		let mut depth = 0i32;
		match dir {
			Direction::Forward => {
				for (i, c) in self.buf[pos..].char_indices() {
					if c == open {
						depth += 1;
					} else if c == close {
						depth -= 1;
						if depth == 0 {
							return Some(pos + i);
						}
					}
				}
			}
			Direction::Backward => {
				for (i, c) in self.buf[..=pos.min(self.buf.len().saturating_sub(1))].char_indices().rev() {
					if c == close {
						depth += 1;
					} else if c == open {
						depth -= 1;
						if depth == 0 {
							return Some(i);
						}
					}
				}
			}
		}
		None
	}

	/// Scan outward from `pos` for the nearest unmatched `open`/`close` pair
	/// enclosing it — used by bracket text objects (`i(`, `a{`, ...).
	pub fn find_unmatched_delim(&self, pos: Pos, open: char, close: char) -> Option<(Pos, Pos)> {
		let mut depth = 0i32;
		let mut open_pos = None;
		for (i, c) in self.buf[..pos.min(self.buf.len())].char_indices().rev() {
			if c == close {
				depth += 1;
			} else if c == open {
				if depth == 0 {
					open_pos = Some(i);
					break;
				}
				depth -= 1;
			}
		}
		let open_pos = open_pos?;
		let close_pos = self.scan_balanced(open_pos, open, close, Direction::Forward)?;
		Some((open_pos, close_pos))
	}

	/// Find the nearest enclosing quote pair of `quote` around `pos`, scanning
	/// the current line only (quotes don't span lines).
	pub fn find_quote_pair(&self, pos: Pos, quote: char) -> Option<(Pos, Pos)> {
		let line_begin = self.line_begin(pos);
		let line_end = self.line_end(pos);
		let positions: Vec<Pos> = self.buf[line_begin..line_end]
			.char_indices()
			.filter(|(_, c)| *c == quote)
			.map(|(i, _)| line_begin + i)
			.collect();
		for pair in positions.chunks(2) {
			if pair.len() == 2 && pair[0] <= pos && pos <= pair[1] {
				return Some((pair[0], pair[1]));
			}
		}
		None
	}

	/// Find `ch` on the same line as `from`, scanning forward. Returns
	/// `(index_within_line, absolute_pos)`; used by `f`/`t` motions, which
	/// never cross a line boundary.
	pub fn buf_find_on_line_forward(&self, from: Pos, ch: char) -> Option<(usize, Pos)> {
		let end = self.line_end(from);
		if from > end {
			return None;
		}
		self.buf[from..end].char_indices().find(|(_, c)| *c == ch).map(|(i, _)| (i, from + i))
	}

	/// Find `ch` on the same line as `before`, scanning backward from (but not
	/// including) `before`.
	pub fn buf_find_on_line_backward(&self, before: Pos, ch: char) -> Option<Pos> {
		let begin = self.line_begin(before);
		if before < begin {
			return None;
		}
		self.buf[begin..before].char_indices().rev().find(|(_, c)| *c == ch).map(|(i, _)| begin + i)
	}

	// --- marks ------------------------------------------------------------

	pub fn mark_set(&mut self, pos: Pos) -> Mark {
		let id = self.next_mark_id;
		self.next_mark_id += 1;
		self.marks.insert(id, pos);
		Mark(id)
	}

	pub fn mark_get(&self, mark: Mark) -> Option<Pos> {
		self.marks.get(&mark.0).copied().filter(|p| *p != EPOS)
	}

	fn shift_marks_insert(&mut self, at: Pos, len: usize) {
		for p in self.marks.values_mut() {
			if *p >= at {
				*p += len;
			}
		}
	}

	fn shift_marks_delete(&mut self, start: Pos, end: Pos) {
		let len = end - start;
		for p in self.marks.values_mut() {
			if *p == EPOS {
				continue;
			}
			if *p >= end {
				*p -= len;
			} else if *p >= start {
				*p = EPOS;
			}
		}
	}

	// --- undo / changelist --------------------------------------------

	pub fn snapshot(&mut self) {
		self.history.push(self.buf.clone());
	}

	pub fn history_len(&self) -> usize {
		self.history.len()
	}

	pub fn history_get(&self, i: usize) -> Option<&str> {
		self.history.get(i).map(|s| s.as_str())
	}

	pub fn restore_snapshot(&mut self, i: usize) {
		if let Some(s) = self.history.get(i).cloned() {
			self.buf = s;
		}
	}

	fn record_change(&mut self, pos: Pos) {
		self.change_positions.push(pos);
	}

	pub fn change_positions(&self) -> &[Pos] {
		&self.change_positions
	}

	// --- search -------------------------------------------------------

	pub fn search_forward(&self, re: &Regex, from: Pos) -> Option<(Pos, Pos)> {
		let hay = &self.buf[from.min(self.buf.len())..];
		re.find(hay).map(|m| (from + m.start(), from + m.end()))
	}

	pub fn search_backward(&self, re: &Regex, before: Pos) -> Option<(Pos, Pos)> {
		let hay = &self.buf[..before.min(self.buf.len())];
		re.find_iter(hay).last().map(|m| (m.start(), m.end()))
	}
}

impl Default for Text {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn line_boundaries() {
		let t = Text::from_str("abc\ndef\nghi");
		assert_eq!(t.line_begin(5), 4);
		assert_eq!(t.line_end(5), 7);
		assert_eq!(t.line_finish(1), 2);
	}

	#[test]
	fn word_forward_skips_punct_run_then_whitespace() {
		let t = Text::from_str("foo, bar");
		assert_eq!(t.start_of_word_forward(0, Word::Normal), 3);
	}

	#[test]
	fn bracket_match_forward_and_backward() {
		let t = Text::from_str("f(a(b)c)");
		assert_eq!(t.find_match(1), Some(7));
		assert_eq!(t.find_match(7), Some(1));
	}

	#[test]
	fn mark_survives_insert_before_and_dies_on_overlap_delete() {
		let mut t = Text::from_str("hello world");
		let m = t.mark_set(6);
		t.insert(0, "XX");
		assert_eq!(t.mark_get(m), Some(8));
		t.delete(5, 4);
		assert_eq!(t.mark_get(m), None);
	}

	#[test]
	fn paragraph_forward_stops_at_blank_line() {
		let t = Text::from_str("a\nb\n\nc\n");
		assert_eq!(t.paragraph(0, Direction::Forward), 4);
	}

	#[test]
	fn column_expands_tabs_to_tabwidth() {
		let t = Text::from_str("\tabc");
		assert_eq!(t.column(0, 1, 8), 0);
		assert_eq!(t.column(0, 9, 8), 1);
	}

	#[test]
	fn function_boundary_finds_brace_in_column_one() {
		let t = Text::from_str("fn f()\n{\n  x;\n}\nfn g()\n{\n  y;\n}\n");
		assert_eq!(t.function_boundary(10, Direction::Forward, '{'), 23);
		assert_eq!(t.function_boundary(10, Direction::Backward, '{'), 7);
	}

	#[test]
	fn enclosing_function_pairs_opening_and_closing_brace() {
		let t = Text::from_str("fn f()\n{\n  x;\n}\n");
		assert_eq!(t.enclosing_function(10), Some((7, 14)));
	}
}
