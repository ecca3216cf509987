//! The motion table.
//!
//! Grounded on the teacher's `Motion` enum (`examples/km-clay-vicut/src/vicmd.rs`)
//! and its scanning helpers in `linebuf.rs`, reshaped around
//! original_source/vis.c's six-variant motion signature (SPEC_FULL.md §4.6,
//! §9 "Motion polymorphism"): every motion is tagged with which scope of
//! state it needs (`MotionScope`), and `Motion::eval` takes the union of all
//! of it through one `MotionCtx` rather than six distinct function-pointer
//! types, since Rust already gives us a single dispatch point in the `match`.

use bitflags::bitflags;
use regex::Regex;
use std::collections::HashMap;

use crate::text::{Pos, Text, EPOS};
use crate::types::{Dest, Direction};
use crate::view::View;

bitflags! {
	#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
	pub struct MotionType: u8 {
		/// Operates on characters rather than whole lines.
		const CHARWISE  = 1 << 0;
		/// Rounds its range to whole lines.
		const LINEWISE  = 1 << 1;
		/// Extends the consumed range by one character so the target byte is included.
		const INCLUSIVE = 1 << 2;
		/// `count` iteration stops after the first call (screen-relative motions).
		const IDEMPOTENT = 1 << 3;
		/// Pushes the origin onto the jumplist before moving.
		const JUMP = 1 << 4;
	}
}

/// Which inputs a motion needs to evaluate, named after original_source/vis.c's
/// six motion function-pointer kinds. Informational only — `eval` always
/// receives the full [`MotionCtx`], but grouping by scope documents which
/// slice of it an individual motion variant actually reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionScope {
	/// `(text, pos) -> pos`: pure function of the buffer contents.
	Text,
	/// `(cursor) -> pos`: needs only the firing cursor's own state (want_col).
	Cursor,
	/// `(marks, pos) -> pos`: needs the owning file's mark table.
	File,
	/// `(search_state, text, pos) -> pos`: needs editor-wide search/find state.
	Editor,
	/// `(view) -> pos`: needs the viewport (window top/height).
	View,
	/// `(window_height, text, pos) -> pos`: needs both window geometry and text.
	Window,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Motion {
	CharForward,
	CharBackward,
	CharForwardForced,
	CharBackwardForced,

	WordStartForward(crate::types::Word),
	WordStartBackward(crate::types::Word),
	WordEndForward(crate::types::Word),
	WordEndBackward(crate::types::Word),

	LineBegin,
	LineStart,
	LineFinish,
	LineUp,
	LineDown,

	FileBegin,
	FileEnd,
	GotoLine(usize),

	Sentence(Direction),
	Paragraph(Direction),

	CharSearch(Direction, Dest, char),
	RepeatCharSearch,
	RepeatCharSearchRev,

	Mark(char),

	SearchForward(String),
	SearchBackward(String),
	SearchNext,
	SearchPrev,

	BracketMatch,

	WindowTop,
	WindowMiddle,
	WindowBottom,

	/// `|`: seek display column `n` (1-based) on the current line.
	Column(usize),
	/// `[[`/`]]`: nearest enclosing/following function opening brace.
	FunctionStart(Direction),
	/// `[]`/`][`: nearest enclosing/following function closing brace.
	FunctionEnd(Direction),

	Nop,
}

impl Motion {
	pub fn scope(&self) -> MotionScope {
		use Motion::*;
		match self {
			CharForward | CharBackward | CharForwardForced | CharBackwardForced
			| WordStartForward(_) | WordStartBackward(_) | WordEndForward(_) | WordEndBackward(_)
			| LineBegin | LineStart | LineFinish | FileBegin | FileEnd | GotoLine(_)
			| Sentence(_) | Paragraph(_) | BracketMatch | CharSearch(..) | Column(_) | FunctionStart(_)
			| FunctionEnd(_) => MotionScope::Text,
			LineUp | LineDown => MotionScope::Cursor,
			Mark(_) => MotionScope::File,
			RepeatCharSearch | RepeatCharSearchRev | SearchForward(_) | SearchBackward(_) | SearchNext
			| SearchPrev => MotionScope::Editor,
			WindowTop | WindowMiddle | WindowBottom => MotionScope::Window,
			Nop => MotionScope::View,
		}
	}

	pub fn motion_type(&self) -> MotionType {
		use Motion::*;
		match self {
			LineUp | LineDown => MotionType::LINEWISE | MotionType::JUMP,
			LineBegin | LineStart => MotionType::empty(),
			WordEndForward(_) | WordEndBackward(_) => MotionType::CHARWISE | MotionType::INCLUSIVE,
			CharSearch(Direction::Forward, Dest::On, _) => MotionType::CHARWISE | MotionType::INCLUSIVE,
			CharSearch(Direction::Backward, _, _) => MotionType::CHARWISE,
			CharSearch(Direction::Forward, Dest::Before, _) => MotionType::CHARWISE | MotionType::INCLUSIVE,
			BracketMatch => MotionType::CHARWISE | MotionType::INCLUSIVE | MotionType::JUMP,
			Sentence(_) | Paragraph(_) => MotionType::CHARWISE,
			FileBegin | FileEnd | GotoLine(_) | Mark(_) | SearchForward(_) | SearchBackward(_) | SearchNext
			| SearchPrev => MotionType::JUMP,
			WindowTop | WindowMiddle | WindowBottom => MotionType::LINEWISE | MotionType::IDEMPOTENT,
			Column(_) => MotionType::CHARWISE | MotionType::IDEMPOTENT,
			FunctionStart(_) | FunctionEnd(_) => MotionType::LINEWISE | MotionType::JUMP,
			Nop => MotionType::CHARWISE | MotionType::IDEMPOTENT,
			_ => MotionType::CHARWISE,
		}
	}

	pub fn is_exclusive(&self) -> bool {
		!self.motion_type().contains(MotionType::INCLUSIVE)
	}
}

/// Bundles every piece of state a motion might need to read, per `scope()`.
pub struct MotionCtx<'a> {
	pub text: &'a Text,
	pub view: &'a View,
	pub marks: &'a HashMap<char, Pos>,
	pub search_regex: Option<&'a Regex>,
	pub last_char_search: Option<(Direction, Dest, char)>,
	pub tabwidth: usize,
}

/// Evaluate `motion` once from `pos`. Returns `EPOS` when the motion has
/// nowhere to go (e.g. an unset mark, a failed search) — callers stop
/// `count` iteration on `EPOS` per SPEC_FULL.md §4.4 step 3.
pub fn eval(motion: &Motion, ctx: &MotionCtx, pos: Pos) -> Pos {
	use Motion::*;
	let text = ctx.text;
	match motion {
		CharForward => {
			let end = text.line_end(pos);
			if pos < end { text.char_next(pos) } else { pos }
		}
		CharBackward => {
			let begin = text.line_begin(pos);
			if pos > begin { text.char_prev(pos) } else { pos }
		}
		CharForwardForced => (pos + 1).min(text.len()),
		CharBackwardForced => pos.saturating_sub(1),

		WordStartForward(w) => text.start_of_word_forward(pos, *w),
		WordStartBackward(w) => text.start_of_word_backward(pos, *w),
		WordEndForward(w) => text.end_of_word_forward(pos, *w),
		WordEndBackward(w) => text.end_of_word_backward(pos, *w),

		LineBegin => text.line_begin(pos),
		LineStart => text.line_start(pos),
		LineFinish => text.line_finish(pos),

		LineUp => {
			let want = ctx.view.cursor().want_col.unwrap_or_else(|| text.line_offset(pos));
			match text.line_prev(pos) {
				Some(prev) => (prev + want).min(text.line_finish(prev).max(prev)),
				None => pos,
			}
		}
		LineDown => {
			let want = ctx.view.cursor().want_col.unwrap_or_else(|| text.line_offset(pos));
			match text.line_next(pos) {
				Some(next) => (next + want).min(text.line_finish(next).max(next)),
				None => pos,
			}
		}

		FileBegin => 0,
		FileEnd => text.len(),
		GotoLine(n) => text.pos_by_lineno(*n),

		Sentence(dir) => text.sentence(pos, *dir),
		Paragraph(dir) => text.paragraph(pos, *dir),

		CharSearch(dir, dest, ch) => char_search(text, pos, *dir, *dest, *ch).unwrap_or(EPOS),
		RepeatCharSearch => match ctx.last_char_search {
			Some((dir, dest, ch)) => char_search(text, pos, dir, dest, ch).unwrap_or(EPOS),
			None => EPOS,
		},
		RepeatCharSearchRev => match ctx.last_char_search {
			Some((dir, dest, ch)) => char_search(text, pos, dir.reverse(), dest, ch).unwrap_or(EPOS),
			None => EPOS,
		},

		Mark(name) => ctx.marks.get(name).copied().unwrap_or(EPOS),

		SearchForward(_) | SearchBackward(_) | SearchNext | SearchPrev => match ctx.search_regex {
			Some(re) => {
				let fwd = matches!(motion, SearchForward(_) | SearchNext);
				if fwd {
					text.search_forward(re, text.char_next(pos)).map(|(s, _)| s).unwrap_or(EPOS)
				} else {
					text.search_backward(re, pos).map(|(s, _)| s).unwrap_or(EPOS)
				}
			}
			None => EPOS,
		},

		BracketMatch => text.find_match(pos).unwrap_or(EPOS),

		WindowTop => text.pos_by_lineno(ctx.view.top_line),
		WindowMiddle => text.pos_by_lineno(ctx.view.top_line + ctx.view.height / 2),
		WindowBottom => text.pos_by_lineno(ctx.view.top_line + ctx.view.height.saturating_sub(1)),

		Column(n) => text.column(pos, *n, ctx.tabwidth),
		FunctionStart(dir) => text.function_boundary(pos, *dir, '{'),
		FunctionEnd(dir) => text.function_boundary(pos, *dir, '}'),

		Nop => pos,
	}
}

fn char_search(text: &Text, pos: Pos, dir: Direction, dest: Dest, ch: char) -> Option<Pos> {
	match dir {
		Direction::Forward => {
			let start = text.char_next(pos);
			let (_, found) = text.buf_find_on_line_forward(start, ch)?;
			Some(match dest {
				Dest::On => found,
				Dest::Before => text.char_prev(found),
			})
		}
		Direction::Backward => {
			let found = text.buf_find_on_line_backward(pos, ch)?;
			Some(match dest {
				Dest::On => found,
				Dest::Before => text.char_next(found),
			})
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::text::Text;

	#[test]
	fn line_down_preserves_want_col_across_shorter_line() {
		let text = Text::from_str("abcdef\nxy\nabcdef");
		let mut view = View::new();
		view.cursor_mut().want_col = Some(5);
		let marks = HashMap::new();
		let c =
			MotionCtx { text: &text, view: &view, marks: &marks, search_regex: None, last_char_search: None, tabwidth: 8 };
		let pos = eval(&Motion::LineDown, &c, 5);
		assert_eq!(text.lineno_by_pos(pos), 2);
	}

	#[test]
	fn char_search_forward_on_lands_on_target() {
		let text = Text::from_str("foo bar baz");
		let view = View::new();
		let marks = HashMap::new();
		let c =
			MotionCtx { text: &text, view: &view, marks: &marks, search_regex: None, last_char_search: None, tabwidth: 8 };
		let pos = eval(&Motion::CharSearch(Direction::Forward, Dest::On, 'b'), &c, 0);
		assert_eq!(pos, 4);
	}

	#[test]
	fn column_motion_seeks_display_column() {
		let text = Text::from_str("\tabc");
		let view = View::new();
		let marks = HashMap::new();
		let c =
			MotionCtx { text: &text, view: &view, marks: &marks, search_regex: None, last_char_search: None, tabwidth: 8 };
		assert_eq!(eval(&Motion::Column(9), &c, 0), 1);
	}

	#[test]
	fn function_start_forward_lands_on_brace_in_column_one() {
		let text = Text::from_str("fn f()\n{\n  x;\n}\n");
		let view = View::new();
		let marks = HashMap::new();
		let c =
			MotionCtx { text: &text, view: &view, marks: &marks, search_regex: None, last_char_search: None, tabwidth: 8 };
		assert_eq!(eval(&Motion::FunctionStart(Direction::Forward), &c, 0), 7);
	}
}
