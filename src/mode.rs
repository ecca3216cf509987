//! The mode tree: a fixed set of modes in a hierarchy that can be
//! dynamically re-parented at runtime.
//!
//! Grounded on `original_source/vis.c`'s static mode table and its
//! `mode_set` re-parenting of `OPERATOR`; the per-mode hook shape (enter /
//! leave / input / idle) is the same shape as the teacher's `ViMode` trait
//! (`examples/km-clay-vicut/src/modes/mod.rs`), generalized from one struct
//! per mode to one data table so `parent` can be mutated at runtime instead
//! of being fixed by the type system.

use std::fmt;

/// Stable identity for a mode. Modes never move once created; only their
/// `parent` field changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModeId(pub u16);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModeKind {
	Basic,
	Move,
	TextObj,
	OperatorOption,
	Operator,
	Normal,
	Visual,
	VisualLine,
	Readline,
	Insert,
	Replace,
	Prompt,
}

impl fmt::Display for ModeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{self:?}")
	}
}

pub struct Mode {
	pub id: ModeId,
	pub kind: ModeKind,
	pub status: &'static str,
	pub help: &'static str,
	/// Shown in the status line / selectable by the user as a target mode.
	pub user_visible: bool,
	pub is_visual: bool,
	pub parent: Option<ModeId>,
	/// The parent this mode resets to when left normally; re-parenting
	/// (OPERATOR's dance with OPERATOR-OPTION/TEXTOBJ) temporarily overrides
	/// `parent` but always restores to `static_parent` on `leave`.
	pub static_parent: Option<ModeId>,
}

impl Mode {
	fn new(id: ModeId, kind: ModeKind, status: &'static str, help: &'static str, parent: Option<ModeId>) -> Self {
		Self {
			id,
			kind,
			status,
			help,
			user_visible: matches!(kind, ModeKind::Normal | ModeKind::Visual | ModeKind::VisualLine | ModeKind::Insert | ModeKind::Replace),
			is_visual: matches!(kind, ModeKind::Visual | ModeKind::VisualLine),
			parent,
			static_parent: parent,
		}
	}
}

/// Ids are stable indices into `ModeTree::modes`, assigned in the order
/// built by [`ModeTree::standard`].
pub mod ids {
	use super::ModeId;
	pub const BASIC: ModeId = ModeId(0);
	pub const MOVE: ModeId = ModeId(1);
	pub const TEXTOBJ: ModeId = ModeId(2);
	pub const OPERATOR_OPTION: ModeId = ModeId(3);
	pub const OPERATOR: ModeId = ModeId(4);
	pub const NORMAL: ModeId = ModeId(5);
	pub const VISUAL: ModeId = ModeId(6);
	pub const VISUAL_LINE: ModeId = ModeId(7);
	pub const READLINE: ModeId = ModeId(8);
	pub const INSERT: ModeId = ModeId(9);
	pub const REPLACE: ModeId = ModeId(10);
	pub const PROMPT: ModeId = ModeId(11);
}

pub struct ModeTree {
	modes: Vec<Mode>,
}

impl ModeTree {
	/// Build the standard topology described in SPEC_FULL.md §4.1:
	/// `BASIC ← MOVE ← TEXTOBJ ← OPERATOR-OPTION`;
	/// `BASIC ← READLINE ← {INSERT ← REPLACE, PROMPT}`;
	/// `MOVE ← OPERATOR ← {NORMAL, VISUAL ← VISUAL-LINE}`.
	pub fn standard() -> Self {
		use ids::*;
		let modes = vec![
			Mode::new(BASIC, ModeKind::Basic, "", "common bindings shared by every mode", None),
			Mode::new(MOVE, ModeKind::Move, "", "motions", Some(BASIC)),
			Mode::new(TEXTOBJ, ModeKind::TextObj, "", "text objects", Some(MOVE)),
			Mode::new(OPERATOR_OPTION, ModeKind::OperatorOption, "", "operator modifiers", Some(TEXTOBJ)),
			Mode::new(OPERATOR, ModeKind::Operator, "", "pending operator", Some(MOVE)),
			Mode::new(NORMAL, ModeKind::Normal, "", "normal mode", Some(OPERATOR)),
			Mode::new(VISUAL, ModeKind::Visual, "VISUAL", "visual mode", Some(OPERATOR)),
			Mode::new(VISUAL_LINE, ModeKind::VisualLine, "VISUAL LINE", "visual line mode", Some(VISUAL)),
			Mode::new(READLINE, ModeKind::Readline, "", "line editing", Some(BASIC)),
			Mode::new(INSERT, ModeKind::Insert, "INSERT", "insert mode", Some(READLINE)),
			Mode::new(REPLACE, ModeKind::Replace, "REPLACE", "replace mode", Some(INSERT)),
			Mode::new(PROMPT, ModeKind::Prompt, "", "ex/search prompt", Some(READLINE)),
		];
		Self { modes }
	}

	pub fn get(&self, id: ModeId) -> &Mode {
		&self.modes[id.0 as usize]
	}
	pub fn get_mut(&mut self, id: ModeId) -> &mut Mode {
		&mut self.modes[id.0 as usize]
	}

	/// Walk from `start` up through parents, calling `f` on each mode until
	/// it returns `Some`, or the root is exhausted.
	pub fn resolve_up<T>(&self, start: ModeId, mut f: impl FnMut(&Mode) -> Option<T>) -> Option<T> {
		let mut cur = Some(start);
		while let Some(id) = cur {
			let mode = self.get(id);
			if let Some(v) = f(mode) {
				return Some(v);
			}
			cur = mode.parent;
		}
		None
	}

	/// Enter OPERATOR: bindings for text objects and operator options become
	/// reachable by re-parenting it onto OPERATOR-OPTION.
	pub fn enter_operator(&mut self) {
		self.get_mut(ids::OPERATOR).parent = Some(ids::OPERATOR_OPTION);
	}

	/// Leave OPERATOR: restore its static parent (MOVE).
	pub fn leave_operator(&mut self) {
		let p = self.get(ids::OPERATOR).static_parent;
		self.get_mut(ids::OPERATOR).parent = p;
	}

	/// Entering any VISUAL mode re-parents OPERATOR onto TEXTOBJ so that a
	/// pending operator in visual mode sees text-object bindings directly
	/// (visual-mode operators act on the selection, not on a motion).
	pub fn enter_visual(&mut self) {
		self.get_mut(ids::OPERATOR).parent = Some(ids::TEXTOBJ);
	}

	pub fn leave_visual(&mut self) {
		let p = self.get(ids::OPERATOR).static_parent;
		self.get_mut(ids::OPERATOR).parent = p;
	}

	pub fn is_ancestor(&self, ancestor: ModeId, of: ModeId) -> bool {
		self.resolve_up(of, |m| (m.id == ancestor).then_some(())).is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn operator_reparents_and_restores() {
		let mut tree = ModeTree::standard();
		assert_eq!(tree.get(ids::OPERATOR).parent, Some(ids::MOVE));
		tree.enter_operator();
		assert_eq!(tree.get(ids::OPERATOR).parent, Some(ids::OPERATOR_OPTION));
		tree.leave_operator();
		assert_eq!(tree.get(ids::OPERATOR).parent, Some(ids::MOVE));
	}

	#[test]
	fn visual_then_operator_then_leave_both_restores_move() {
		let mut tree = ModeTree::standard();
		tree.enter_visual();
		tree.enter_operator();
		tree.leave_operator();
		tree.leave_visual();
		assert_eq!(tree.get(ids::OPERATOR).parent, Some(ids::MOVE));
	}

	#[test]
	fn normal_mode_resolves_up_to_basic() {
		let tree = ModeTree::standard();
		assert!(tree.is_ancestor(ids::BASIC, ids::NORMAL));
		assert!(!tree.is_ancestor(ids::INSERT, ids::NORMAL));
	}
}
