//! Editor-wide configuration knobs.
//!
//! Consolidates the scattered `tabwidth`/`expandtab` parameters the teacher
//! threads through its shift operators into one struct owned by [`crate::window::Vis`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
	pub tabwidth: usize,
	pub expandtab: bool,
	pub autoindent: bool,
	/// Seconds of idle input before a mode's `idle` hook fires (e.g. INSERT's undo snapshot timer).
	pub idle_timeout_secs: u64,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			tabwidth: 8,
			expandtab: false,
			autoindent: false,
			idle_timeout_secs: 3,
		}
	}
}

impl Options {
	pub fn indent_unit(&self) -> String {
		if self.expandtab {
			" ".repeat(self.tabwidth)
		} else {
			"\t".to_string()
		}
	}
}
