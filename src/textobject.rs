//! The text-object table.
//!
//! Grounded on original_source/vis.c's `textobjs[]` table and the teacher's
//! `TextObj` enum (`examples/km-clay-vicut/src/vicmd.rs`); the teacher's
//! `Tag`/`Custom` variants are dropped — neither spec.md nor vis.c define
//! them.

use crate::text::{Pos, Range, Text};
use crate::types::{Bound, Direction, Word};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextObj {
	Word(Word, Bound),
	Sentence(Bound),
	Paragraph(Bound),
	DoubleQuote(Bound),
	SingleQuote(Bound),
	BacktickQuote(Bound),
	Paren(Bound),
	Bracket(Bound),
	Brace(Bound),
	Angle(Bound),
	EntireBuffer(Bound),
	Line(Bound),
	Function(Bound),
}

/// Evaluate a text object once at `pos`. Returns `None` when no such object
/// encloses `pos` (e.g. `di)` outside any parens).
pub fn eval(obj: TextObj, text: &Text, pos: Pos) -> Option<Range> {
	match obj {
		TextObj::Word(w, b) => word_object(text, pos, w, b),
		TextObj::Sentence(b) => sentence_object(text, pos, b),
		TextObj::Paragraph(b) => paragraph_object(text, pos, b),
		TextObj::DoubleQuote(b) => quote_object(text, pos, '"', b),
		TextObj::SingleQuote(b) => quote_object(text, pos, '\'', b),
		TextObj::BacktickQuote(b) => quote_object(text, pos, '`', b),
		TextObj::Paren(b) => delim_object(text, pos, '(', ')', b),
		TextObj::Bracket(b) => delim_object(text, pos, '[', ']', b),
		TextObj::Brace(b) => delim_object(text, pos, '{', '}', b),
		TextObj::Angle(b) => delim_object(text, pos, '<', '>', b),
		TextObj::EntireBuffer(_) => Some(Range::new(0, text.len())),
		TextObj::Line(b) => line_object(text, pos, b),
		TextObj::Function(b) => function_object(text, pos, b),
	}
}

fn word_object(text: &Text, pos: Pos, w: Word, b: Bound) -> Option<Range> {
	let start = text.start_of_word_backward(text.char_next(pos), w).min(pos);
	let start = if text.char_at(start).is_some() { start } else { pos };
	let mut start = start;
	// walk back to the beginning of the run containing pos
	while start > 0 {
		let prev = text.char_prev(start);
		if same_class(text, prev, pos, w) {
			start = prev;
		} else {
			break;
		}
	}
	let mut end = text.char_next(pos);
	while end < text.len() && same_class(text, pos, end, w) {
		end = text.char_next(end);
	}
	if matches!(b, Bound::Around) {
		let mut trailing_end = end;
		while trailing_end < text.len() && text.char_at(trailing_end).is_some_and(|c| c.is_whitespace() && c != '\n') {
			trailing_end = text.char_next(trailing_end);
		}
		if trailing_end > end {
			end = trailing_end;
		}
	}
	Some(Range::new(start, end))
}

fn same_class(text: &Text, a: Pos, b: Pos, w: Word) -> bool {
	let ca = text.char_at(a);
	let cb = text.char_at(b);
	match (ca, cb) {
		(Some(ca), Some(cb)) => class(ca, w) == class(cb, w) && class(ca, w) != 0,
		_ => false,
	}
}

fn class(c: char, w: Word) -> u8 {
	if c.is_whitespace() {
		0
	} else {
		match w {
			Word::Big => 1,
			Word::Normal if c.is_alphanumeric() || c == '_' => 1,
			Word::Normal => 2,
		}
	}
}

fn sentence_object(text: &Text, pos: Pos, b: Bound) -> Option<Range> {
	let start = text.sentence(pos, Direction::Backward);
	let mut end = text.sentence(pos, Direction::Forward);
	if matches!(b, Bound::Inside) {
		while end > start && text.char_before(end).is_some_and(|c| c.is_whitespace()) {
			end = text.char_prev(end);
		}
	}
	Some(Range::new(start, end))
}

fn paragraph_object(text: &Text, pos: Pos, _b: Bound) -> Option<Range> {
	let start = text.paragraph(pos, Direction::Backward);
	let end = text.paragraph(pos, Direction::Forward);
	Some(Range::linewise(start, end))
}

fn quote_object(text: &Text, pos: Pos, quote: char, b: Bound) -> Option<Range> {
	let (open, close) = text.find_quote_pair(pos, quote)?;
	match b {
		Bound::Around => Some(Range::new(open, text.char_next(close))),
		Bound::Inside => Some(Range::new(text.char_next(open), close)),
	}
}

fn delim_object(text: &Text, pos: Pos, open: char, close: char, b: Bound) -> Option<Range> {
	let (o, c) = text.find_unmatched_delim(pos, open, close)?;
	match b {
		Bound::Around => Some(Range::new(o, text.char_next(c))),
		Bound::Inside => Some(Range::new(text.char_next(o), c)),
	}
}

fn line_object(text: &Text, pos: Pos, b: Bound) -> Option<Range> {
	let start = text.line_begin(pos);
	let end = match b {
		Bound::Inside => text.line_end(pos),
		Bound::Around => text.line_next(pos).unwrap_or_else(|| text.line_end(pos)),
	};
	Some(Range::linewise(start, end))
}

/// `if`/`af`: the function body enclosing `pos`, delimited by a `{`/`}` pair
/// each in column one. `Around` includes both brace lines; `Inside` covers
/// only the lines between them.
fn function_object(text: &Text, pos: Pos, b: Bound) -> Option<Range> {
	let (open, close) = text.enclosing_function(pos)?;
	match b {
		Bound::Around => Some(Range::linewise(open, text.line_next(close).unwrap_or_else(|| text.line_end(close)))),
		Bound::Inside => {
			let start = text.line_next(open).unwrap_or(open);
			Some(Range::linewise(start, close))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn inner_paren_excludes_delimiters() {
		let text = Text::from_str("foo(bar)baz");
		let r = eval(TextObj::Paren(Bound::Inside), &text, 5).unwrap();
		assert_eq!(text.bytes_get(r), "bar");
	}

	#[test]
	fn around_paren_includes_delimiters() {
		let text = Text::from_str("foo(bar)baz");
		let r = eval(TextObj::Paren(Bound::Around), &text, 5).unwrap();
		assert_eq!(text.bytes_get(r), "(bar)");
	}

	#[test]
	fn inner_word_stops_at_whitespace() {
		let text = Text::from_str("hello world");
		let r = eval(TextObj::Word(Word::Normal, Bound::Inside), &text, 2).unwrap();
		assert_eq!(text.bytes_get(r), "hello");
	}

	#[test]
	fn double_quote_object_requires_pair_on_same_line() {
		let text = Text::from_str("say \"hi there\" now");
		let r = eval(TextObj::DoubleQuote(Bound::Inside), &text, 7).unwrap();
		assert_eq!(text.bytes_get(r), "hi there");
	}

	#[test]
	fn inner_function_excludes_brace_lines() {
		let text = Text::from_str("fn f()\n{\n  x;\n}\n");
		let r = eval(TextObj::Function(Bound::Inside), &text, 10).unwrap();
		assert_eq!(text.bytes_get(r), "  x;\n");
	}

	#[test]
	fn around_function_includes_brace_lines() {
		let text = Text::from_str("fn f()\n{\n  x;\n}\n");
		let r = eval(TextObj::Function(Bound::Around), &text, 10).unwrap();
		assert_eq!(text.bytes_get(r), "{\n  x;\n}\n");
	}
}
