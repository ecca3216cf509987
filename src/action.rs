//! The `Action` accumulator and its executor (`action_do`).
//!
//! Grounded on original_source/vis.c's `vis_count_set` / `vis_operator` /
//! `vis_motion` / `vis_textobject` / `action_do`; the `(count, variant)`
//! tuple idiom is carried over from the teacher's `VerbCmd`/`MotionCmd`
//! (`examples/km-clay-vicut/src/vicmd.rs`).

use std::collections::HashMap;

use regex::Regex;

use crate::jumplist::JumpList;
use crate::macros::Macros;
use crate::motion::{self, Motion, MotionCtx, MotionType};
use crate::operator::{Operator, OperatorCtx};
use crate::register::Registers;
use crate::text::{Pos, Range, Text};
use crate::textobject::{self, TextObj};
use crate::types::{Dest, Direction};
use crate::view::View;

/// Selects a register by name, decoding the uppercase-means-append
/// convention the way `"A` vs `"a` does in Vim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegisterSelector {
	pub name: Option<char>,
	pub append: bool,
}

impl RegisterSelector {
	pub fn new(ch: Option<char>) -> Self {
		match ch {
			None => Self::default(),
			Some(c) => Self { name: Some(c.to_ascii_lowercase()), append: c.is_uppercase() },
		}
	}
}

#[derive(Default, Debug, Clone)]
pub struct Action {
	pub count: usize,
	pub register: RegisterSelector,
	pub operator: Option<Operator>,
	pub motion: Option<(usize, Motion)>,
	pub textobj: Option<(usize, TextObj)>,
	pub type_override: Option<MotionType>,
}

impl Action {
	pub fn new() -> Self {
		Self { count: 0, ..Default::default() }
	}

	pub fn effective_count(&self) -> usize {
		self.count.max(1)
	}

	pub fn push_digit(&mut self, d: u8) {
		// leading zero is the "go to line start" motion, not a count digit
		if d == 0 && self.count == 0 {
			return;
		}
		self.count = self.count.saturating_mul(10).saturating_add(d as usize);
	}

	pub fn set_register(&mut self, ch: char) {
		self.register = RegisterSelector::new(Some(ch));
	}

	/// `vis_operator`: setting the same operator twice (e.g. `dd`) switches to
	/// a linewise action covering `effective_count()` lines starting at the
	/// current one. That's `effective_count() - 1` additional `LineDown`
	/// hops past the current line, not `effective_count()` hops — hopping
	/// once per selected line would land one line past the selection and
	/// pull it into the (inclusive) linewise rounding too. `count` is reset
	/// to 1 so the generic `count * mcount` multiplication in `execute`
	/// doesn't apply the original count a second time on top of `extra`.
	pub fn set_operator(&mut self, op: Operator) -> bool {
		if self.operator == Some(op) {
			let extra = self.effective_count().saturating_sub(1);
			self.type_override = Some(MotionType::LINEWISE);
			self.motion = Some(if extra == 0 { (1, Motion::Nop) } else { (extra, Motion::LineDown) });
			self.count = 1;
			return true; // ready to execute
		}
		self.operator = Some(op);
		false
	}

	pub fn set_motion(&mut self, count: usize, motion: Motion) {
		self.motion = Some((count, motion));
	}

	pub fn set_textobj(&mut self, count: usize, obj: TextObj) {
		self.textobj = Some((count, obj));
	}

	pub fn is_ready(&self) -> bool {
		self.motion.is_some() || self.textobj.is_some()
	}

	pub fn is_repeatable(&self) -> bool {
		matches!(
			self.operator,
			Some(Operator::Delete)
				| Some(Operator::Change)
				| Some(Operator::Put(_))
				| Some(Operator::ShiftRight)
				| Some(Operator::ShiftLeft)
				| Some(Operator::Case(_))
				| Some(Operator::Join)
				| Some(Operator::InsertAt)
				| Some(Operator::ReplaceAt)
		)
	}

	fn effective_motion_type(&self) -> MotionType {
		if let Some(t) = self.type_override {
			return t;
		}
		let base = self.motion.as_ref().map(|(_, m)| m.motion_type()).unwrap_or_default();
		match self.operator {
			// shift/cursor-spawn operators always act on whole lines, regardless
			// of which motion supplied the range (`>j` and `>w` shift the same).
			Some(op) if op.is_linewise_by_default() => base | MotionType::LINEWISE,
			_ => base,
		}
	}
}

/// Bundles every piece of mutable state `Action::execute` may need to touch,
/// borrowed for the duration of one dispatch. Kept separate from a concrete
/// `Vis`/`Win` type so the executor stays testable without constructing a
/// full editor.
pub struct ExecCtx<'a> {
	pub text: &'a mut Text,
	pub view: &'a mut View,
	pub registers: &'a mut Registers,
	pub macros: &'a mut Macros,
	pub jumplist: &'a mut JumpList,
	pub marks: &'a HashMap<char, Pos>,
	pub search_regex: Option<&'a Regex>,
	pub last_char_search: &'a mut Option<(Direction, Dest, char)>,
	pub tabwidth: usize,
	pub expandtab: bool,
}

/// What the executor decided should happen after running an action; the
/// caller (`Vis::dispatch_key`) uses this to drive the mode transition,
/// since the mode field itself lives above this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEffect {
	None,
	EnterInsert,
	EnterReplace,
	ReturnFromOperator,
	ReturnFromVisual,
}

pub struct ExecOutcome {
	pub mode_effect: ModeEffect,
	pub repeatable: bool,
}

impl Action {
	/// `action_do`: compose the pending operator/motion/text-object into a
	/// range and apply it, once per cursor. See SPEC_FULL.md §4.4 for the
	/// numbered steps this follows.
	pub fn execute(&self, ctx: &mut ExecCtx, in_visual: bool, linewise_mode: bool) -> ExecOutcome {
		let count = self.effective_count();
		let cursor_positions = ctx.view.cursors_pos();
		let multi_cursor = cursor_positions.len() > 1;

		for origin in cursor_positions {
			// Step 3-4: resolve the motion, extending by `count`.
			let mctx = MotionCtx {
				text: ctx.text,
				view: ctx.view,
				marks: ctx.marks,
				search_regex: ctx.search_regex,
				last_char_search: *ctx.last_char_search,
				tabwidth: ctx.tabwidth,
			};
			let mut newpos = origin;
			let mut jump_pushed = false;
			if let Some((mcount, motion)) = &self.motion {
				if let Motion::CharSearch(dir, dest, ch) = motion {
					*ctx.last_char_search = Some((*dir, *dest, *ch));
				}
				let total = count * mcount;
				let idempotent = motion.motion_type().contains(MotionType::IDEMPOTENT);
				let iters = if idempotent { 1 } else { total.max(1) };
				for _ in 0..iters {
					let next = motion::eval(motion, &mctx, newpos);
					if next == crate::text::EPOS {
						newpos = origin;
						break;
					}
					newpos = next;
				}
				if motion.motion_type().contains(MotionType::JUMP) {
					ctx.jumplist.push(origin);
					jump_pushed = true;
				}
			}
			if !jump_pushed {
				ctx.jumplist.invalidate_forward();
			}

			let mut range = Range::new(origin.min(newpos), origin.max(newpos));
			if let Some((_, motion)) = &self.motion {
				if motion.motion_type().contains(MotionType::INCLUSIVE) {
					range.end = ctx.text.char_next(range.end);
				}
			}

			// Step 5-6: in visual mode the range always spans the fixed anchor to
			// the current cursor, not just the last motion's endpoints — otherwise
			// a second motion keypress would only ever cover the latest step.
			if in_visual {
				if let Some(anchor) = ctx.view.anchor() {
					range = Range::new(anchor.min(newpos), anchor.max(newpos));
				}
			}

			if let Some((tcount, obj)) = &self.textobj {
				let mut anchor = origin;
				for _ in 0..(*tcount).max(1) {
					if let Some(obj_range) = textobject::eval(*obj, ctx.text, anchor) {
						range = range.union(&obj_range);
						anchor = obj_range.end;
					} else {
						break;
					}
				}
			}

			// Step 2/7: linewise unless the motion is explicitly charwise;
			// always linewise in VISUAL-LINE; never rounded in plain VISUAL.
			let mtype = self.effective_motion_type();
			let linewise = !mtype.contains(MotionType::CHARWISE) || mtype.contains(MotionType::LINEWISE) || linewise_mode;
			let plain_visual = in_visual && !linewise_mode;
			if linewise && !plain_visual {
				let end_anchor = range.end.max(range.start);
				range = Range::linewise(ctx.text.line_begin(range.start), ctx.text.line_next(end_anchor).unwrap_or(ctx.text.len()));
			}

			if in_visual {
				ctx.view.selection_set(range);
			}

			let result_pos = if let Some(op) = self.operator {
				let register_name = self.register.name;
				let count_for_op = if matches!(op, Operator::Put(_)) { count } else { 1 };
				let pos = {
					let reg = ctx.registers.get_mut(register_name).unwrap();
					let mut opctx = OperatorCtx {
						range,
						register: reg,
						count: count_for_op,
						tabwidth: ctx.tabwidth,
						expandtab: ctx.expandtab,
						append: self.register.append,
					};
					op.apply(ctx.text, &mut opctx)
				};
				if matches!(op, Operator::CursorSpawn(_)) {
					for p in op.spawn_points(ctx.text, range) {
						ctx.view.cursors_new(p);
					}
					None
				} else {
					pos
				}
			} else if self.motion.is_some() {
				Some(newpos)
			} else {
				None
			};

			match result_pos {
				Some(p) => ctx.view.cursor_to(p),
				None if multi_cursor => ctx.view.dispose_at(origin),
				None => {}
			}
		}

		// A bare motion never changes mode, even in visual — only completing an
		// operator does (over the selection in visual, or the pending one
		// otherwise). Getting this backwards would drop out of VISUAL on every
		// cursor movement instead of just on delete/change/yank/etc.
		let mode_effect = match self.operator {
			Some(Operator::Change) | Some(Operator::InsertAt) => ModeEffect::EnterInsert,
			Some(Operator::ReplaceAt) => ModeEffect::EnterReplace,
			Some(_) if in_visual => ModeEffect::ReturnFromVisual,
			Some(_) => ModeEffect::ReturnFromOperator,
			None => ModeEffect::None,
		};

		ctx.text.snapshot();
		ExecOutcome { mode_effect, repeatable: self.is_repeatable() }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::Word;

	fn fresh_ctx<'a>(
		text: &'a mut Text,
		view: &'a mut View,
		registers: &'a mut Registers,
		macros: &'a mut Macros,
		jumplist: &'a mut JumpList,
		marks: &'a HashMap<char, Pos>,
		last_char_search: &'a mut Option<(Direction, Dest, char)>,
	) -> ExecCtx<'a> {
		ExecCtx { text, view, registers, macros, jumplist, marks, search_regex: None, last_char_search, tabwidth: 8, expandtab: false }
	}

	#[test]
	fn delete_word_yanks_and_removes() {
		let mut text = Text::from_str("Hello World");
		let mut view = View::new();
		let mut registers = Registers::new();
		let mut macros = Macros::new();
		let mut jumplist = JumpList::new();
		let marks = HashMap::new();
		let mut lcs = None;
		let mut action = Action::new();
		action.operator = Some(Operator::Delete);
		action.set_motion(1, Motion::WordStartForward(Word::Normal));
		let mut ctx = fresh_ctx(&mut text, &mut view, &mut registers, &mut macros, &mut jumplist, &marks, &mut lcs);
		action.execute(&mut ctx, false, false);
		assert_eq!(text.as_str(), "World");
		assert_eq!(registers.get(None).unwrap().content().as_str(), "Hello ");
	}

	#[test]
	fn dd_sets_linewise_and_deletes_current_line() {
		let mut text = Text::from_str("abc\ndef\n");
		let mut view = View::new();
		let mut registers = Registers::new();
		let mut macros = Macros::new();
		let mut jumplist = JumpList::new();
		let marks = HashMap::new();
		let mut lcs = None;
		let mut action = Action::new();
		assert!(!action.set_operator(Operator::Delete));
		assert!(action.set_operator(Operator::Delete));
		let mut ctx = fresh_ctx(&mut text, &mut view, &mut registers, &mut macros, &mut jumplist, &marks, &mut lcs);
		action.execute(&mut ctx, false, false);
		assert_eq!(text.as_str(), "def\n");
		assert!(registers.get(None).unwrap().is_linewise());
	}
}
