//! Named byte-buffer registers.
//!
//! Content/append semantics are carried over from the teacher's register
//! module almost verbatim. The teacher keeps this state behind a
//! `thread_local!` global; here it is a plain field owned by
//! [`crate::window::Vis`] (see DESIGN.md), since the editor root already
//! threads `&mut self` through every call that could touch a register.

use std::fmt::Display;

#[derive(Default, Clone, Debug)]
pub enum RegisterContent {
	Span(String),
	Line(String),
	#[default]
	Empty,
}

impl RegisterContent {
	pub fn clear(&mut self) {
		match self {
			Self::Span(s) | Self::Line(s) => s.clear(),
			Self::Empty => {}
		}
	}
	pub fn len(&self) -> usize {
		match self {
			Self::Span(s) | Self::Line(s) => s.len(),
			Self::Empty => 0,
		}
	}
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
	pub fn is_linewise(&self) -> bool {
		matches!(self, Self::Line(_))
	}
	pub fn as_str(&self) -> &str {
		match self {
			Self::Span(s) | Self::Line(s) => s,
			Self::Empty => "",
		}
	}
}

impl Display for RegisterContent {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

#[derive(Clone, Default, Debug)]
pub struct Register {
	content: RegisterContent,
}

impl Register {
	pub const fn new() -> Self {
		Self { content: RegisterContent::Empty }
	}
	pub fn content(&self) -> &RegisterContent {
		&self.content
	}
	pub fn write(&mut self, buf: RegisterContent) {
		self.content = buf;
	}
	pub fn append(&mut self, buf: RegisterContent) {
		match buf {
			RegisterContent::Empty => {}
			RegisterContent::Span(ref s) | RegisterContent::Line(ref s) => match &mut self.content {
				RegisterContent::Empty => self.content = buf,
				RegisterContent::Span(existing) => existing.push_str(s),
				RegisterContent::Line(existing) => existing.push_str(s),
			},
		}
	}
	pub fn clear(&mut self) {
		self.content.clear();
	}
	pub fn is_linewise(&self) -> bool {
		self.content.is_linewise()
	}
}

/// The full set of named registers, `a`-`z` plus the unnamed default.
///
/// Register names are case-folded on lookup: an uppercase name selects the
/// same slot as its lowercase counterpart but requests append semantics —
/// that policy lives in the caller (see `action.rs`'s `RegisterSelector`),
/// not here, since a bare `Registers` has no notion of "append mode".
#[derive(Debug)]
pub struct Registers {
	default: Register,
	named: [Register; 26],
}

impl Default for Registers {
	fn default() -> Self {
		Self::new()
	}
}

impl Registers {
	pub fn new() -> Self {
		Self {
			default: Register::new(),
			named: std::array::from_fn(|_| Register::new()),
		}
	}

	fn index_of(ch: char) -> Option<usize> {
		let lower = ch.to_ascii_lowercase();
		if lower.is_ascii_lowercase() {
			Some((lower as u8 - b'a') as usize)
		} else {
			None
		}
	}

	pub fn get(&self, name: Option<char>) -> Option<&Register> {
		match name {
			None => Some(&self.default),
			Some(ch) => Self::index_of(ch).map(|i| &self.named[i]),
		}
	}

	pub fn get_mut(&mut self, name: Option<char>) -> Option<&mut Register> {
		match name {
			None => Some(&mut self.default),
			Some(ch) => Self::index_of(ch).map(move |i| &mut self.named[i]),
		}
	}

	pub fn write(&mut self, name: Option<char>, buf: RegisterContent) {
		if let Some(r) = self.get_mut(name) {
			r.write(buf);
		}
	}

	pub fn append(&mut self, name: Option<char>, buf: RegisterContent) {
		if let Some(r) = self.get_mut(name) {
			r.append(buf);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_register_round_trips() {
		let mut regs = Registers::new();
		regs.write(None, RegisterContent::Span("hello".into()));
		assert_eq!(regs.get(None).unwrap().content().as_str(), "hello");
	}

	#[test]
	fn named_register_is_independent_of_default() {
		let mut regs = Registers::new();
		regs.write(Some('a'), RegisterContent::Line("foo\n".into()));
		regs.write(None, RegisterContent::Span("bar".into()));
		assert_eq!(regs.get(Some('a')).unwrap().content().as_str(), "foo\n");
		assert!(regs.get(Some('a')).unwrap().is_linewise());
		assert_eq!(regs.get(None).unwrap().content().as_str(), "bar");
	}

	#[test]
	fn uppercase_name_maps_to_same_slot_as_lowercase() {
		let mut regs = Registers::new();
		regs.write(Some('a'), RegisterContent::Span("x".into()));
		regs.append(Some('A'), RegisterContent::Span("y".into()));
		assert_eq!(regs.get(Some('a')).unwrap().content().as_str(), "xy");
	}
}
