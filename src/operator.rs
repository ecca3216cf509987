//! The operator table.
//!
//! Grounded on original_source/vis.c's operator functions (`op_delete`,
//! `op_change`, `op_yank`, `op_put`, `op_shift`, `op_case`, `op_join`,
//! `op_insert`/`op_replace`, `op_cursor`) and the teacher's `exec_verb`
//! dispatch in `examples/km-clay-vicut/src/linebuf.rs`, reworked over the
//! standalone [`crate::text::Text`].
//!
//! Every operator shares the uniform `(text, ctx) -> Option<new_pos>`
//! signature from SPEC_FULL.md §4.5; `None` plays the role of vis.c's
//! `EPOS` sentinel (dispose the cursor / suppress the caller's cursor move).
//! Case and put variants are multiplexed onto one slot each via an enum
//! payload rather than a C-style `arg.i` tag, since Rust enums make that
//! free.

use crate::register::{Register, RegisterContent};
use crate::text::{Pos, Range, Text};
use crate::types::Anchor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMode {
	Swap,
	Upper,
	Lower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnAt {
	LineStart,
	LineEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
	Delete,
	Change,
	Yank,
	Put(Anchor),
	ShiftRight,
	ShiftLeft,
	Case(CaseMode),
	Join,
	/// Marks the start of an insert/replace sequence; the mode transition to
	/// INSERT/REPLACE happens in the executor, not here.
	InsertAt,
	ReplaceAt,
	CursorSpawn(SpawnAt),
}

pub struct OperatorCtx<'a> {
	pub range: Range,
	pub register: &'a mut Register,
	pub count: usize,
	pub tabwidth: usize,
	pub expandtab: bool,
	/// Set when the register name was given in uppercase (`"A`): yank/delete
	/// append to the existing register contents instead of overwriting them.
	pub append: bool,
}

impl Operator {
	pub fn is_linewise_by_default(&self) -> bool {
		matches!(self, Self::ShiftRight | Self::ShiftLeft | Self::CursorSpawn(_))
	}

	/// Apply the operator to `text` given `ctx`. Returns the new cursor
	/// position, or `None` (EPOS) if the caller should dispose the cursor.
	pub fn apply(&self, text: &mut Text, ctx: &mut OperatorCtx) -> Option<Pos> {
		match self {
			Operator::Delete => delete(text, ctx),
			Operator::Change => delete(text, ctx),
			Operator::Yank => yank(text, ctx),
			Operator::Put(anchor) => put(text, ctx, *anchor),
			Operator::ShiftRight => shift_right(text, ctx),
			Operator::ShiftLeft => shift_left(text, ctx),
			Operator::Case(mode) => case(text, ctx, *mode),
			Operator::Join => join(text, ctx),
			Operator::InsertAt => Some(ctx.range.start),
			Operator::ReplaceAt => Some(ctx.range.start),
			Operator::CursorSpawn(_) => None,
		}
	}

	/// For `CursorSpawn`, the points at which new cursors should be created —
	/// one per line touched by `range`, at either line-start or line-end.
	pub fn spawn_points(&self, text: &Text, range: Range) -> Vec<Pos> {
		let Operator::CursorSpawn(at) = self else {
			return Vec::new();
		};
		let at = *at;
		let mut points = Vec::new();
		let mut line = text.line_begin(range.start);
		loop {
			points.push(match at {
				SpawnAt::LineStart => text.line_start(line),
				SpawnAt::LineEnd => text.line_finish(line),
			});
			match text.line_next(line) {
				Some(next) if next < range.end => line = next,
				_ => break,
			}
		}
		points
	}
}

fn delete(text: &mut Text, ctx: &mut OperatorCtx) -> Option<Pos> {
	let content = text.bytes_get(ctx.range).to_string();
	let content = if ctx.range.linewise { RegisterContent::Line(content) } else { RegisterContent::Span(content) };
	if ctx.append {
		ctx.register.append(content);
	} else {
		ctx.register.write(content);
	}
	text.delete_range(ctx.range);
	if ctx.range.linewise {
		let pos = ctx.range.start.min(text.len());
		Some(text.line_start(text.line_begin(pos)))
	} else {
		Some(ctx.range.start.min(text.len()))
	}
}

fn yank(text: &mut Text, ctx: &mut OperatorCtx) -> Option<Pos> {
	let content = text.bytes_get(ctx.range).to_string();
	let content = if ctx.range.linewise { RegisterContent::Line(content) } else { RegisterContent::Span(content) };
	if ctx.append {
		ctx.register.append(content);
	} else {
		ctx.register.write(content);
	}
	Some(ctx.range.start)
}

fn put(text: &mut Text, ctx: &mut OperatorCtx, anchor: Anchor) -> Option<Pos> {
	let content = ctx.register.content().clone();
	if content.is_empty() {
		return Some(ctx.range.start);
	}
	let pos = ctx.range.start;
	if content.is_linewise() {
		let insert_at = match anchor {
			Anchor::After => text.line_next(pos).unwrap_or(text.len()),
			Anchor::Before => text.line_begin(pos),
		};
		let mut at = insert_at;
		for _ in 0..ctx.count {
			text.insert(at, content.as_str());
			at += content.len();
		}
		Some(insert_at)
	} else {
		let insert_at = match anchor {
			Anchor::After => text.char_next(pos),
			Anchor::Before => pos,
		};
		let mut at = insert_at;
		for _ in 0..ctx.count {
			text.insert(at, content.as_str());
			at += content.len();
		}
		Some(text.char_prev(at))
	}
}

fn shift_right(text: &mut Text, ctx: &mut OperatorCtx) -> Option<Pos> {
	let unit = if ctx.expandtab { " ".repeat(ctx.tabwidth) } else { "\t".to_string() };
	for_each_line_start(text, ctx.range, |text, line_start| {
		text.insert(line_start, &unit);
	});
	Some(text.line_start(ctx.range.start))
}

/// Remove exactly one leading tab if present; only fall back to stripping up
/// to `tabwidth` leading spaces when there is no leading tab. Decided in
/// DESIGN.md's open-question #2: never treats a tab as equivalent to N
/// spaces for the purpose of un-shifting.
fn shift_left(text: &mut Text, ctx: &mut OperatorCtx) -> Option<Pos> {
	for_each_line_start(text, ctx.range, |text, line_start| {
		if text.byte(line_start) == Some(b'\t') {
			text.delete(line_start, 1);
			return;
		}
		let line_end = text.line_end(line_start);
		let leading = text.bytes_get(Range::new(line_start, line_end));
		let strip = leading.bytes().take(ctx.tabwidth_for_shift()).take_while(|b| *b == b' ').count();
		if strip > 0 {
			text.delete(line_start, strip);
		}
	});
	Some(text.line_start(ctx.range.start))
}

impl OperatorCtx<'_> {
	fn tabwidth_for_shift(&self) -> usize {
		self.tabwidth
	}
}

/// Run `f` once per line-start position touched by `range`, processing lines
/// bottom-to-top so edits on a later line never invalidate the start
/// position of an earlier one still queued.
fn for_each_line_start(text: &mut Text, range: Range, mut f: impl FnMut(&mut Text, Pos)) {
	let mut starts = Vec::new();
	let mut line = text.line_begin(range.start);
	let end = range.end.max(range.start);
	loop {
		starts.push(line);
		match text.line_next(line) {
			Some(next) if next < end => line = next,
			_ => break,
		}
	}
	for start in starts.into_iter().rev() {
		f(text, start);
	}
}

fn case(text: &mut Text, ctx: &mut OperatorCtx, mode: CaseMode) -> Option<Pos> {
	let original = text.bytes_get(ctx.range).to_string();
	let transformed: String = original
		.chars()
		.map(|c| {
			if !c.is_ascii_alphabetic() {
				return c;
			}
			match mode {
				CaseMode::Upper => c.to_ascii_uppercase(),
				CaseMode::Lower => c.to_ascii_lowercase(),
				CaseMode::Swap => {
					if c.is_ascii_uppercase() {
						c.to_ascii_lowercase()
					} else {
						c.to_ascii_uppercase()
					}
				}
			}
		})
		.collect();
	text.delete_range(ctx.range);
	text.insert(ctx.range.start, &transformed);
	Some(ctx.range.start)
}

fn join(text: &mut Text, ctx: &mut OperatorCtx) -> Option<Pos> {
	let mut start = text.line_begin(ctx.range.start);
	let last_line = if ctx.range.linewise { ctx.range.end.saturating_sub(1) } else { ctx.range.end };
	loop {
		let line_end = text.line_end(start);
		if line_end >= text.len() || line_end >= last_line {
			break;
		}
		let next_line_start = line_end + 1;
		let next_content_start = text
			.bytes_get(Range::new(next_line_start, text.line_end(next_line_start)))
			.find(|c: char| !c.is_whitespace())
			.map(|i| next_line_start + i)
			.unwrap_or(text.line_end(next_line_start));
		text.delete_range(Range::new(line_end, next_content_start));
		if line_end > 0 && !matches!(text.char_before(line_end), Some(c) if c.is_whitespace()) {
			text.insert(line_end, " ");
		}
	}
	if start > 0 {
		start = text.line_begin(start);
	}
	Some(text.line_finish(start))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::register::Register;

	fn ctx<'a>(range: Range, reg: &'a mut Register) -> OperatorCtx<'a> {
		OperatorCtx { range, register: reg, count: 1, tabwidth: 8, expandtab: false, append: false }
	}

	#[test]
	fn delete_yanks_into_register_and_removes_range() {
		let mut text = Text::from_str("hello world");
		let mut reg = Register::new();
		let mut c = ctx(Range::new(0, 6), &mut reg);
		Operator::Delete.apply(&mut text, &mut c);
		assert_eq!(text.as_str(), "world");
		assert_eq!(reg.content().as_str(), "hello ");
	}

	#[test]
	fn shift_left_removes_one_tab_not_equivalent_spaces() {
		let mut text = Text::from_str("\t  code");
		let mut reg = Register::new();
		let mut c = ctx(Range::new(0, text.len()), &mut reg);
		shift_left(&mut text, &mut c);
		assert_eq!(text.as_str(), "  code");
	}

	#[test]
	fn shift_left_falls_back_to_spaces_without_tab() {
		let mut text = Text::from_str("        code");
		let mut reg = Register::new();
		let mut c = ctx(Range::new(0, text.len()), &mut reg);
		shift_left(&mut text, &mut c);
		assert_eq!(text.as_str(), "code");
	}

	#[test]
	fn case_swap_is_ascii_only() {
		let mut text = Text::from_str("aBcé");
		let mut reg = Register::new();
		let mut c = ctx(Range::new(0, text.len()), &mut reg);
		case(&mut text, &mut c, CaseMode::Swap);
		assert_eq!(text.as_str(), "AbCé");
	}
}
