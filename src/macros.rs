//! Macro recording and replay, plus the operator-macro and repeat-macro
//! facilities that back the `.` command.
//!
//! Grounded on original_source/vis.c's `vis_macro_record` /
//! `vis_macro_record_stop` / macro replay, and the operator-macro handling
//! around `action_do`. The teacher has no macro subsystem; this is built
//! fresh in its idiom (plain `Vec<KeyToken>`, no interior mutability needed
//! since `Vis` already owns `&mut self` end to end).

use std::collections::HashMap;

use crate::keys::KeyToken;

#[derive(Debug, Clone, Default)]
pub struct Macro {
	pub tokens: Vec<KeyToken>,
}

pub struct Macros {
	named: HashMap<char, Macro>,
	/// Name of the macro currently recording user keystrokes, if any.
	recording: Option<char>,
	/// Captures keystrokes typed during INSERT/REPLACE/CHANGE so `.` can
	/// replay the full operator + inserted text (SPEC_FULL.md §4.7).
	operator_macro: Option<Macro>,
	operator_recording: bool,
	/// Snapshot taken the first time `.` repeats an operator-macro action, so
	/// later `.` presses stay stable even if the user starts a new recording.
	repeat_macro: Option<Macro>,
}

impl Macros {
	pub fn new() -> Self {
		Self {
			named: HashMap::new(),
			recording: None,
			operator_macro: None,
			operator_recording: false,
			repeat_macro: None,
		}
	}

	pub fn is_recording(&self) -> bool {
		self.recording.is_some()
	}

	/// Begin recording raw keys into macro `name`. Fails (returns `false`) if
	/// a recording is already in progress.
	pub fn start_recording(&mut self, name: char) -> bool {
		if self.recording.is_some() {
			return false;
		}
		self.recording = Some(name);
		self.named.insert(name, Macro::default());
		true
	}

	/// Stop the active recording, if any. The resolver is responsible for not
	/// having appended the stop-trigger key to the recording before calling
	/// this (DESIGN.md open question #3) — `stop` itself performs no
	/// truncation.
	pub fn stop_recording(&mut self) {
		self.recording = None;
	}

	pub fn get(&self, name: char) -> Option<&Macro> {
		self.named.get(&name)
	}

	/// Record a raw key: appended to the active named recording (if any) and
	/// to the operator macro (if one is being captured), mirroring vis.c's
	/// `vis_keys` recording order.
	pub fn record_key(&mut self, token: &KeyToken) {
		if let Some(name) = self.recording {
			self.named.entry(name).or_default().tokens.push(token.clone());
		}
		if self.operator_recording {
			self.operator_macro.get_or_insert_with(Macro::default).tokens.push(token.clone());
		}
	}

	pub fn start_operator_macro(&mut self) {
		self.operator_recording = true;
		self.operator_macro = Some(Macro::default());
	}

	pub fn stop_operator_macro(&mut self) -> Option<Macro> {
		self.operator_recording = false;
		self.operator_macro.take()
	}

	pub fn operator_macro(&self) -> Option<&Macro> {
		self.operator_macro.as_ref()
	}

	/// Snapshot `m` into the repeat-macro slot the first time an operator
	/// action with an attached operator macro is repeated.
	pub fn snapshot_repeat(&mut self, m: Macro) {
		self.repeat_macro = Some(m);
	}

	pub fn repeat_macro(&self) -> Option<&Macro> {
		self.repeat_macro.as_ref()
	}
}

impl Default for Macros {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cannot_start_two_recordings_at_once() {
		let mut m = Macros::new();
		assert!(m.start_recording('a'));
		assert!(!m.start_recording('b'));
	}

	#[test]
	fn record_key_appends_to_active_recording_only() {
		let mut m = Macros::new();
		m.start_recording('q');
		m.record_key(&KeyToken::Char('j'));
		m.stop_recording();
		m.record_key(&KeyToken::Char('k'));
		assert_eq!(m.get('q').unwrap().tokens, vec![KeyToken::Char('j')]);
	}
}
