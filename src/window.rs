//! The editor root: `File`, `Win`, and `Vis` tie every table in this crate
//! together into one key-driven dispatch loop.
//!
//! Grounded on original_source/vis.c's `File`/`Win`/`Vis` structs and the
//! teacher's top-level orchestrator (`examples/km-clay-vicut/src/exec.rs`,
//! deleted once superseded — see DESIGN.md): a fixed Vim keymap built with
//! [`crate::resolver::Bindings`], a single `feed_key` entry point, and the
//! accumulator/executor split from [`crate::action`] doing the real work.

use std::collections::HashMap;

use regex::Regex;

use crate::action::{Action, ExecCtx, ModeEffect};
use crate::changelist::ChangeList;
use crate::error::VisResult;
use crate::jumplist::JumpList;
use crate::keys::KeyToken;
use crate::macros::Macros;
use crate::mode::{ids, ModeId, ModeKind, ModeTree};
use crate::motion::{Motion, MotionType};
use crate::operator::{CaseMode, Operator, SpawnAt};
use crate::options::Options;
use crate::register::{RegisterContent, Registers};
use crate::text::{Pos, Range, Text};
use crate::textobject::TextObj;
use crate::types::{Anchor, Bound, Dest, Direction, Word};
use crate::ui::{NullUi, Ui};
use crate::view::View;

/// The concrete command vocabulary the Vim keymap resolves to. Kept separate
/// from [`Operator`]/[`Motion`] since a few entries (mode switches, await
/// states) have no equivalent there.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
	Motion(Motion),
	GotoFirstOrCount,
	GotoLastOrCount,
	GotoColumnOrCount,
	TextObj(TextObj),
	Operator(Operator),
	Digit(u8),
	EnterInsert(InsertEntry),
	EnterReplaceMode,
	EnterVisual(VisualKind),
	ToggleVisualLine,
	Escape,
	RegisterPrefix,
	AwaitFind(Direction, Dest),
	AwaitReplaceChar,
	AwaitMarkSet,
	AwaitMarkGoto,
	AwaitTextObj(Bound),
	DeleteCharForward,
	DeleteCharBackward,
	DeleteToEol,
	ChangeToEol,
	YankLine,
	Repeat,
	Undo,
	JumpPrev,
	JumpNext,
	ChangeListPrev,
	ChangeListNext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertEntry {
	Before,
	After,
	LineStart,
	LineEnd,
	NewLineBelow,
	NewLineAbove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualKind {
	Charwise,
	Linewise,
}

/// An argument a pending command is waiting on: the next raw token resolves
/// it directly rather than going back through the binding tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingArg {
	Register,
	FindChar(Direction, Dest),
	ReplaceChar,
	MarkSet,
	MarkGoto,
	TextObjChar(Bound),
	MacroRecordName,
	MacroPlayName,
}

/// An open buffer: the text itself plus the marks that belong to its
/// lifetime (filename/persistence is out of scope).
pub struct File {
	pub text: Text,
	pub name: Option<String>,
	pub marks: HashMap<char, Pos>,
}

impl File {
	pub fn new(text: Text) -> Self {
		Self { text, name: None, marks: HashMap::new() }
	}
}

/// A window onto a file: its own viewport/cursor state, jumplist, and
/// changelist. One window per `Vis` for now — window splitting is out of
/// scope.
pub struct Win {
	pub view: View,
	pub jumplist: JumpList,
	pub changelist: ChangeList,
}

impl Win {
	pub fn new() -> Self {
		Self { view: View::new(), jumplist: JumpList::new(), changelist: ChangeList::new() }
	}
}

impl Default for Win {
	fn default() -> Self {
		Self::new()
	}
}

/// Translate the argument character following `i`/`a` into the text object
/// it selects. `None` for an unrecognized character leaves the pending
/// operator/count in place with nothing to act on, matching vim silently
/// giving up on e.g. `di9`.
fn textobj_from_char(c: char, bound: Bound) -> Option<TextObj> {
	Some(match c {
		'w' => TextObj::Word(Word::Normal, bound),
		'W' => TextObj::Word(Word::Big, bound),
		's' => TextObj::Sentence(bound),
		'p' => TextObj::Paragraph(bound),
		'"' => TextObj::DoubleQuote(bound),
		'\'' => TextObj::SingleQuote(bound),
		'`' => TextObj::BacktickQuote(bound),
		'(' | ')' | 'b' => TextObj::Paren(bound),
		'[' | ']' => TextObj::Bracket(bound),
		'{' | '}' | 'B' => TextObj::Brace(bound),
		'<' | '>' => TextObj::Angle(bound),
		'f' => TextObj::Function(bound),
		_ => return None,
	})
}

fn build_bindings() -> crate::resolver::Bindings<Cmd> {
	use crate::resolver::Bindings;
	use ids::*;
	use KeyToken::Char as C;
	fn named(s: &str) -> KeyToken {
		KeyToken::Named(s.to_string())
	}

	let mut b: Bindings<Cmd> = Bindings::new();

	// --- motions, reachable from every leaf mode via MOVE -------------
	b.bind(MOVE, vec![C('h')], Cmd::Motion(Motion::CharBackward));
	b.bind(MOVE, vec![C('l')], Cmd::Motion(Motion::CharForward));
	b.bind(MOVE, vec![C(' ')], Cmd::Motion(Motion::CharForward));
	b.bind(MOVE, vec![C('j')], Cmd::Motion(Motion::LineDown));
	b.bind(MOVE, vec![C('k')], Cmd::Motion(Motion::LineUp));
	b.bind(MOVE, vec![C('0')], Cmd::Motion(Motion::LineBegin));
	b.bind(MOVE, vec![C('^')], Cmd::Motion(Motion::LineStart));
	b.bind(MOVE, vec![C('$')], Cmd::Motion(Motion::LineFinish));
	b.bind(MOVE, vec![C('w')], Cmd::Motion(Motion::WordStartForward(Word::Normal)));
	b.bind(MOVE, vec![C('W')], Cmd::Motion(Motion::WordStartForward(Word::Big)));
	b.bind(MOVE, vec![C('b')], Cmd::Motion(Motion::WordStartBackward(Word::Normal)));
	b.bind(MOVE, vec![C('B')], Cmd::Motion(Motion::WordStartBackward(Word::Big)));
	b.bind(MOVE, vec![C('e')], Cmd::Motion(Motion::WordEndForward(Word::Normal)));
	b.bind(MOVE, vec![C('E')], Cmd::Motion(Motion::WordEndForward(Word::Big)));
	b.bind(MOVE, vec![C('{')], Cmd::Motion(Motion::Paragraph(Direction::Backward)));
	b.bind(MOVE, vec![C('}')], Cmd::Motion(Motion::Paragraph(Direction::Forward)));
	b.bind(MOVE, vec![C('(')], Cmd::Motion(Motion::Sentence(Direction::Backward)));
	b.bind(MOVE, vec![C(')')], Cmd::Motion(Motion::Sentence(Direction::Forward)));
	b.bind(MOVE, vec![C('%')], Cmd::Motion(Motion::BracketMatch));
	b.bind(MOVE, vec![C('G')], Cmd::GotoLastOrCount);
	b.bind(MOVE, vec![C('g'), C('g')], Cmd::GotoFirstOrCount);
	b.bind(MOVE, vec![C('g'), C(';')], Cmd::ChangeListPrev);
	b.bind(MOVE, vec![C('g'), C(',')], Cmd::ChangeListNext);
	b.bind(MOVE, vec![C('|')], Cmd::GotoColumnOrCount);
	b.bind(MOVE, vec![C('['), C('[')], Cmd::Motion(Motion::FunctionStart(Direction::Backward)));
	b.bind(MOVE, vec![C(']'), C(']')], Cmd::Motion(Motion::FunctionStart(Direction::Forward)));
	b.bind(MOVE, vec![C('['), C(']')], Cmd::Motion(Motion::FunctionEnd(Direction::Backward)));
	b.bind(MOVE, vec![C(']'), C('[')], Cmd::Motion(Motion::FunctionEnd(Direction::Forward)));
	b.bind(MOVE, vec![C('f')], Cmd::AwaitFind(Direction::Forward, Dest::On));
	b.bind(MOVE, vec![C('F')], Cmd::AwaitFind(Direction::Backward, Dest::On));
	b.bind(MOVE, vec![C('t')], Cmd::AwaitFind(Direction::Forward, Dest::Before));
	b.bind(MOVE, vec![C('T')], Cmd::AwaitFind(Direction::Backward, Dest::Before));
	b.bind(MOVE, vec![C(';')], Cmd::Motion(Motion::RepeatCharSearch));
	b.bind(MOVE, vec![C(',')], Cmd::Motion(Motion::RepeatCharSearchRev));
	b.bind(MOVE, vec![C('`')], Cmd::AwaitMarkGoto);
	b.bind(MOVE, vec![C('\'')], Cmd::AwaitMarkGoto);
	b.bind(MOVE, vec![C('H')], Cmd::Motion(Motion::WindowTop));
	b.bind(MOVE, vec![C('M')], Cmd::Motion(Motion::WindowMiddle));
	b.bind(MOVE, vec![C('L')], Cmd::Motion(Motion::WindowBottom));
	b.bind(MOVE, vec![named("C-o")], Cmd::JumpPrev);
	b.bind(MOVE, vec![named("C-i")], Cmd::JumpNext);
	for d in 1..=9u8 {
		b.bind(MOVE, vec![C((b'0' + d) as char)], Cmd::Digit(d));
	}

	// --- text objects; reachable only once an operator is pending or a
	// visual selection is active, via the OPERATOR/TEXTOBJ re-parenting.
	b.bind(TEXTOBJ, vec![C('i')], Cmd::AwaitTextObj(Bound::Inside));
	b.bind(TEXTOBJ, vec![C('a')], Cmd::AwaitTextObj(Bound::Around));

	// --- normal-mode entry points --------------------------------------
	b.bind(NORMAL, vec![C('d')], Cmd::Operator(Operator::Delete));
	b.bind(NORMAL, vec![C('c')], Cmd::Operator(Operator::Change));
	b.bind(NORMAL, vec![C('y')], Cmd::Operator(Operator::Yank));
	b.bind(NORMAL, vec![C('>')], Cmd::Operator(Operator::ShiftRight));
	b.bind(NORMAL, vec![C('<')], Cmd::Operator(Operator::ShiftLeft));
	b.bind(NORMAL, vec![C('J')], Cmd::Operator(Operator::Join));
	b.bind(NORMAL, vec![C('~')], Cmd::Operator(Operator::Case(CaseMode::Swap)));
	b.bind(NORMAL, vec![C('g'), C('u')], Cmd::Operator(Operator::Case(CaseMode::Lower)));
	b.bind(NORMAL, vec![C('g'), C('U')], Cmd::Operator(Operator::Case(CaseMode::Upper)));
	b.bind(NORMAL, vec![C('g'), C('v')], Cmd::Operator(Operator::CursorSpawn(SpawnAt::LineStart)));
	b.bind(NORMAL, vec![C('p')], Cmd::Operator(Operator::Put(Anchor::After)));
	b.bind(NORMAL, vec![C('P')], Cmd::Operator(Operator::Put(Anchor::Before)));
	b.bind(NORMAL, vec![C('x')], Cmd::DeleteCharForward);
	b.bind(NORMAL, vec![C('X')], Cmd::DeleteCharBackward);
	b.bind(NORMAL, vec![C('D')], Cmd::DeleteToEol);
	b.bind(NORMAL, vec![C('C')], Cmd::ChangeToEol);
	b.bind(NORMAL, vec![C('Y')], Cmd::YankLine);
	b.bind(NORMAL, vec![C('r')], Cmd::AwaitReplaceChar);
	b.bind(NORMAL, vec![C('m')], Cmd::AwaitMarkSet);
	b.bind(NORMAL, vec![C('i')], Cmd::EnterInsert(InsertEntry::Before));
	b.bind(NORMAL, vec![C('a')], Cmd::EnterInsert(InsertEntry::After));
	b.bind(NORMAL, vec![C('I')], Cmd::EnterInsert(InsertEntry::LineStart));
	b.bind(NORMAL, vec![C('A')], Cmd::EnterInsert(InsertEntry::LineEnd));
	b.bind(NORMAL, vec![C('o')], Cmd::EnterInsert(InsertEntry::NewLineBelow));
	b.bind(NORMAL, vec![C('O')], Cmd::EnterInsert(InsertEntry::NewLineAbove));
	b.bind(NORMAL, vec![C('R')], Cmd::EnterReplaceMode);
	b.bind(NORMAL, vec![C('v')], Cmd::EnterVisual(VisualKind::Charwise));
	b.bind(NORMAL, vec![C('V')], Cmd::EnterVisual(VisualKind::Linewise));
	b.bind(NORMAL, vec![C('u')], Cmd::Undo);
	b.bind(NORMAL, vec![C('.')], Cmd::Repeat);
	b.bind(NORMAL, vec![named("Esc")], Cmd::Escape);
	b.bind(NORMAL, vec![C('"')], Cmd::RegisterPrefix);

	// --- visual mode: operators fire immediately on the selection ------
	for vmode in [VISUAL, VISUAL_LINE] {
		b.bind(vmode, vec![C('d')], Cmd::Operator(Operator::Delete));
		b.bind(vmode, vec![C('x')], Cmd::Operator(Operator::Delete));
		b.bind(vmode, vec![C('c')], Cmd::Operator(Operator::Change));
		b.bind(vmode, vec![C('y')], Cmd::Operator(Operator::Yank));
		b.bind(vmode, vec![C('>')], Cmd::Operator(Operator::ShiftRight));
		b.bind(vmode, vec![C('<')], Cmd::Operator(Operator::ShiftLeft));
		b.bind(vmode, vec![C('J')], Cmd::Operator(Operator::Join));
		b.bind(vmode, vec![C('~')], Cmd::Operator(Operator::Case(CaseMode::Swap)));
		b.bind(vmode, vec![C('u')], Cmd::Operator(Operator::Case(CaseMode::Lower)));
		b.bind(vmode, vec![C('U')], Cmd::Operator(Operator::Case(CaseMode::Upper)));
		b.bind(vmode, vec![C('"')], Cmd::RegisterPrefix);
		b.bind(vmode, vec![named("Esc")], Cmd::Escape);
	}
	b.bind(VISUAL, vec![C('v')], Cmd::Escape);
	b.bind(VISUAL, vec![C('V')], Cmd::ToggleVisualLine);
	b.bind(VISUAL_LINE, vec![C('V')], Cmd::Escape);
	b.bind(VISUAL_LINE, vec![C('v')], Cmd::ToggleVisualLine);

	b
}

/// The editor root: owns the only file/window this crate supports, the mode
/// tree, the pending action accumulator, and every table it composes
/// (registers, macros, options). A host (terminal driver, test harness)
/// drives it one key at a time through [`Vis::feed_key`].
pub struct Vis {
	pub file: File,
	pub win: Win,
	pub modes: ModeTree,
	pub mode: ModeId,
	pub action: Action,
	action_prev: Option<Action>,
	pub registers: Registers,
	pub macros: Macros,
	pub options: Options,
	pub search_regex: Option<Regex>,
	last_char_search: Option<(Direction, Dest, char)>,
	bindings: crate::resolver::Bindings<Cmd>,
	pending_tokens: Vec<KeyToken>,
	pending_arg: Option<PendingArg>,
	/// Count digits typed between an operator and its motion (`d3w`), kept
	/// apart from `action.count` (digits typed before the operator, `3dw`)
	/// so both can multiply together per SPEC_FULL.md §4.3.
	motion_count: usize,
	pub ui: Box<dyn Ui>,
	pub running: bool,
	pub exit_status: i32,
}

impl Vis {
	pub fn new(text: Text) -> Self {
		Self {
			file: File::new(text),
			win: Win::new(),
			modes: ModeTree::standard(),
			mode: ids::NORMAL,
			action: Action::new(),
			action_prev: None,
			registers: Registers::new(),
			macros: Macros::new(),
			options: Options::default(),
			search_regex: None,
			last_char_search: None,
			bindings: build_bindings(),
			pending_tokens: Vec::new(),
			pending_arg: None,
			motion_count: 0,
			ui: Box::new(NullUi::default()),
			running: true,
			exit_status: 0,
		}
	}

	fn take_pending_count(&mut self) -> usize {
		if self.action.operator.is_some() {
			std::mem::take(&mut self.motion_count)
		} else {
			std::mem::take(&mut self.action.count)
		}
	}

	fn push_digit(&mut self, d: u8) {
		if self.action.operator.is_some() {
			self.motion_count = self.motion_count.saturating_mul(10).saturating_add(d as usize);
		} else {
			self.action.push_digit(d);
		}
	}

	/// Top-level dispatch entry point: one raw key in, any number of buffer
	/// mutations and mode transitions out.
	pub fn feed_key(&mut self, token: KeyToken) -> VisResult<()> {
		let mode_kind = self.modes.get(self.mode).kind;

		// `q`/`@` must be recognized before the key reaches any in-progress
		// recording, since the triggering keystroke is never part of it.
		if mode_kind == ModeKind::Normal && self.pending_arg.is_none() {
			if let KeyToken::Char('q') = token {
				if self.macros.is_recording() {
					self.macros.stop_recording();
					return Ok(());
				}
				self.pending_arg = Some(PendingArg::MacroRecordName);
				return Ok(());
			}
			if let KeyToken::Char('@') = token {
				self.pending_arg = Some(PendingArg::MacroPlayName);
				return Ok(());
			}
		}

		// Likewise the Esc that leaves INSERT/REPLACE stops the operator
		// macro before it would otherwise be recorded into itself.
		if matches!(mode_kind, ModeKind::Insert | ModeKind::Replace) {
			if let KeyToken::Named(n) = &token {
				if n == "Esc" {
					return self.leave_insert();
				}
			}
		}

		self.macros.record_key(&token);

		if let Some(pending) = self.pending_arg.take() {
			return self.resolve_pending(pending, token);
		}

		if matches!(mode_kind, ModeKind::Insert | ModeKind::Replace) {
			return self.dispatch_insert(token);
		}

		// A `0` with a count already pending is the digit zero, not the
		// line-begin motion; the static binding table can't express that.
		if let KeyToken::Char('0') = token {
			let has_count = if self.action.operator.is_some() { self.motion_count > 0 } else { self.action.count > 0 };
			if has_count {
				self.push_digit(0);
				return Ok(());
			}
		}

		self.pending_tokens.push(token);
		match self.bindings.resolve(&self.modes, self.mode, &self.pending_tokens) {
			crate::resolver::Resolution::Matched(cmd) => {
				self.pending_tokens.clear();
				self.apply_cmd(cmd)
			}
			crate::resolver::Resolution::Alias(expansion) => {
				self.pending_tokens.clear();
				for tok in expansion {
					self.feed_key(tok)?;
				}
				Ok(())
			}
			crate::resolver::Resolution::Prefix => Ok(()),
			crate::resolver::Resolution::Unbound => {
				self.pending_tokens.clear();
				Ok(())
			}
		}
	}

	fn resolve_pending(&mut self, pending: PendingArg, token: KeyToken) -> VisResult<()> {
		let KeyToken::Char(c) = token else {
			return Ok(());
		};
		match pending {
			PendingArg::Register => {
				self.action.set_register(c);
				Ok(())
			}
			PendingArg::FindChar(dir, dest) => self.apply_motion(Motion::CharSearch(dir, dest, c)),
			PendingArg::ReplaceChar => self.replace_count_chars(c),
			PendingArg::MarkSet => {
				let pos = self.win.view.cursor().pos;
				self.file.marks.insert(c, pos);
				Ok(())
			}
			PendingArg::MarkGoto => self.apply_motion(Motion::Mark(c)),
			PendingArg::TextObjChar(bound) => match textobj_from_char(c, bound) {
				Some(obj) => self.apply_textobj(obj),
				None => Ok(()),
			},
			PendingArg::MacroRecordName => {
				self.macros.start_recording(c);
				Ok(())
			}
			PendingArg::MacroPlayName => self.play_macro(c),
		}
	}

	fn apply_cmd(&mut self, cmd: Cmd) -> VisResult<()> {
		match cmd {
			Cmd::Motion(m) => self.apply_motion(m),
			Cmd::GotoFirstOrCount => {
				let n = self.take_pending_count();
				self.apply_motion(Motion::GotoLine(if n > 0 { n } else { 1 }))
			}
			Cmd::GotoLastOrCount => {
				let n = self.take_pending_count();
				let target = if n > 0 { n } else { self.file.text.line_count() };
				self.apply_motion(Motion::GotoLine(target))
			}
			Cmd::GotoColumnOrCount => {
				let n = self.take_pending_count();
				self.apply_motion(Motion::Column(if n > 0 { n } else { 1 }))
			}
			Cmd::TextObj(obj) => self.apply_textobj(obj),
			Cmd::Digit(d) => {
				self.push_digit(d);
				Ok(())
			}
			Cmd::Operator(op) => self.start_operator(op),
			Cmd::EnterInsert(entry) => self.enter_insert(entry),
			Cmd::EnterReplaceMode => {
				self.enter_replace();
				Ok(())
			}
			Cmd::EnterVisual(kind) => {
				self.enter_visual(kind);
				Ok(())
			}
			Cmd::ToggleVisualLine => {
				self.mode = if self.mode == ids::VISUAL { ids::VISUAL_LINE } else { ids::VISUAL };
				Ok(())
			}
			Cmd::Escape => self.escape(),
			Cmd::RegisterPrefix => {
				self.pending_arg = Some(PendingArg::Register);
				Ok(())
			}
			Cmd::AwaitFind(dir, dest) => {
				self.pending_arg = Some(PendingArg::FindChar(dir, dest));
				Ok(())
			}
			Cmd::AwaitReplaceChar => {
				self.pending_arg = Some(PendingArg::ReplaceChar);
				Ok(())
			}
			Cmd::AwaitMarkSet => {
				self.pending_arg = Some(PendingArg::MarkSet);
				Ok(())
			}
			Cmd::AwaitMarkGoto => {
				self.pending_arg = Some(PendingArg::MarkGoto);
				Ok(())
			}
			Cmd::AwaitTextObj(bound) => {
				self.pending_arg = Some(PendingArg::TextObjChar(bound));
				Ok(())
			}
			Cmd::DeleteCharForward => self.delete_chars_forward(),
			Cmd::DeleteCharBackward => self.delete_chars_backward(),
			Cmd::DeleteToEol => {
				self.action.operator = Some(Operator::Delete);
				self.action.set_motion(1, Motion::LineFinish);
				self.action.type_override = Some(MotionType::CHARWISE | MotionType::INCLUSIVE);
				self.run_action()
			}
			Cmd::ChangeToEol => {
				self.action.operator = Some(Operator::Change);
				self.action.set_motion(1, Motion::LineFinish);
				self.action.type_override = Some(MotionType::CHARWISE | MotionType::INCLUSIVE);
				self.run_action()
			}
			Cmd::YankLine => {
				self.action.set_operator(Operator::Yank);
				self.action.set_operator(Operator::Yank);
				self.run_action()
			}
			Cmd::Repeat => self.repeat_last(),
			Cmd::Undo => {
				self.undo();
				Ok(())
			}
			Cmd::JumpPrev => {
				let current = self.win.view.cursor().pos;
				if let Some(p) = self.win.jumplist.prev(current) {
					self.win.view.cursor_to(p);
				}
				Ok(())
			}
			Cmd::JumpNext => {
				if let Some(p) = self.win.jumplist.next() {
					self.win.view.cursor_to(p);
				}
				Ok(())
			}
			Cmd::ChangeListPrev => {
				let positions = self.file.text.change_positions().to_vec();
				if let Some(p) = self.win.changelist.prev(&positions) {
					self.win.view.cursor_to(p);
				}
				Ok(())
			}
			Cmd::ChangeListNext => {
				let positions = self.file.text.change_positions().to_vec();
				if let Some(p) = self.win.changelist.next(&positions) {
					self.win.view.cursor_to(p);
				}
				Ok(())
			}
		}
	}

	fn apply_motion(&mut self, motion: Motion) -> VisResult<()> {
		// Vim compatibility: `cw` changes to the end of the word, not past the
		// trailing whitespace a plain `w` would also swallow.
		let motion = match (&self.action.operator, motion) {
			(Some(Operator::Change), Motion::WordStartForward(w)) => Motion::WordEndForward(w),
			(_, m) => m,
		};
		let mc = self.take_pending_count();
		let mc = if mc > 0 { mc } else { 1 };
		self.action.set_motion(mc, motion);
		self.run_action()
	}

	fn apply_textobj(&mut self, obj: TextObj) -> VisResult<()> {
		let count = self.take_pending_count();
		let count = if count > 0 { count } else { 1 };
		self.action.set_textobj(count, obj);
		self.run_action()
	}

	fn start_operator(&mut self, op: Operator) -> VisResult<()> {
		let in_visual = self.modes.get(self.mode).is_visual;
		if in_visual {
			self.action.operator = Some(op);
			return self.run_action();
		}
		if matches!(op, Operator::Put(_)) {
			self.action.operator = Some(op);
			self.action.set_motion(1, Motion::Nop);
			return self.run_action();
		}
		self.modes.enter_operator();
		if self.action.set_operator(op) {
			return self.run_action();
		}
		Ok(())
	}

	fn run_action(&mut self) -> VisResult<()> {
		let in_visual = self.modes.get(self.mode).is_visual;
		if !self.action.is_ready() && !(in_visual && self.action.operator.is_some()) {
			return Ok(());
		}
		let linewise_mode = self.modes.get(self.mode).kind == ModeKind::VisualLine;
		let had_operator = self.action.operator.is_some();

		let outcome = {
			let mut ctx = ExecCtx {
				text: &mut self.file.text,
				view: &mut self.win.view,
				registers: &mut self.registers,
				macros: &mut self.macros,
				jumplist: &mut self.win.jumplist,
				marks: &self.file.marks,
				search_regex: self.search_regex.as_ref(),
				last_char_search: &mut self.last_char_search,
				tabwidth: self.options.tabwidth,
				expandtab: self.options.expandtab,
			};
			self.action.execute(&mut ctx, in_visual, linewise_mode)
		};

		if had_operator {
			self.modes.leave_operator();
		}
		self.ui.cursor_moved(self.win.view.cursor().pos);

		if outcome.repeatable {
			self.action_prev = Some(self.action.clone());
		}
		self.apply_mode_effect(outcome.mode_effect);
		if !matches!(outcome.mode_effect, ModeEffect::EnterInsert | ModeEffect::EnterReplace) {
			self.action = Action::new();
		}
		Ok(())
	}

	fn apply_mode_effect(&mut self, effect: ModeEffect) {
		match effect {
			ModeEffect::EnterInsert => {
				self.macros.start_operator_macro();
				self.mode = ids::INSERT;
			}
			ModeEffect::EnterReplace => {
				self.macros.start_operator_macro();
				self.mode = ids::REPLACE;
			}
			ModeEffect::ReturnFromOperator => {}
			ModeEffect::ReturnFromVisual => {
				self.modes.leave_visual();
				self.win.view.clear_anchor();
				self.win.view.selection_clear();
				self.mode = ids::NORMAL;
			}
			ModeEffect::None => {}
		}
	}

	fn enter_insert(&mut self, entry: InsertEntry) -> VisResult<()> {
		let pos = self.win.view.cursor().pos;
		let target = match entry {
			InsertEntry::Before => pos,
			InsertEntry::After => self.file.text.char_next(pos),
			InsertEntry::LineStart => self.file.text.line_start(pos),
			InsertEntry::LineEnd => self.file.text.line_end(pos),
			InsertEntry::NewLineBelow => {
				let at = self.file.text.line_end(pos);
				self.file.text.insert(at, "\n");
				at + 1
			}
			InsertEntry::NewLineAbove => {
				let at = self.file.text.line_begin(pos);
				self.file.text.insert(at, "\n");
				at
			}
		};
		self.win.view.cursor_to(target);
		self.action = Action::new();
		self.action.operator = Some(Operator::InsertAt);
		self.macros.start_operator_macro();
		self.mode = ids::INSERT;
		Ok(())
	}

	fn enter_replace(&mut self) {
		self.action = Action::new();
		self.action.operator = Some(Operator::ReplaceAt);
		self.macros.start_operator_macro();
		self.mode = ids::REPLACE;
	}

	fn enter_visual(&mut self, kind: VisualKind) {
		let pos = self.win.view.cursor().pos;
		self.win.view.set_anchor(pos);
		self.modes.enter_visual();
		self.mode = match kind {
			VisualKind::Charwise => ids::VISUAL,
			VisualKind::Linewise => ids::VISUAL_LINE,
		};
	}

	fn escape(&mut self) -> VisResult<()> {
		match self.modes.get(self.mode).kind {
			ModeKind::Visual | ModeKind::VisualLine => {
				self.modes.leave_visual();
				self.win.view.clear_anchor();
				self.win.view.selection_clear();
				self.mode = ids::NORMAL;
				self.action = Action::new();
				Ok(())
			}
			ModeKind::Insert | ModeKind::Replace => self.leave_insert(),
			_ => {
				self.action = Action::new();
				Ok(())
			}
		}
	}

	fn dispatch_insert(&mut self, token: KeyToken) -> VisResult<()> {
		match &token {
			KeyToken::Named(n) if n == "BS" => {
				let pos = self.win.view.cursor().pos;
				if pos > 0 {
					let prev = self.file.text.char_prev(pos);
					self.file.text.delete(prev, pos - prev);
					self.win.view.cursor_to(prev);
				}
				Ok(())
			}
			KeyToken::Named(n) if n == "CR" => {
				let pos = self.win.view.cursor().pos;
				self.file.text.insert(pos, "\n");
				self.win.view.cursor_to(pos + 1);
				Ok(())
			}
			KeyToken::Named(n) if n == "Tab" => self.insert_str("\t"),
			KeyToken::Char(c) => {
				if self.modes.get(self.mode).kind == ModeKind::Replace {
					self.replace_char_at_cursor(*c)
				} else {
					let mut buf = [0u8; 4];
					let s = c.encode_utf8(&mut buf).to_string();
					self.insert_str(&s)
				}
			}
			_ => Ok(()),
		}
	}

	fn insert_str(&mut self, s: &str) -> VisResult<()> {
		let pos = self.win.view.cursor().pos;
		self.file.text.insert(pos, s);
		self.win.view.cursor_to(pos + s.len());
		Ok(())
	}

	fn replace_char_at_cursor(&mut self, c: char) -> VisResult<()> {
		let pos = self.win.view.cursor().pos;
		if let Some(existing) = self.file.text.char_at(pos) {
			self.file.text.delete(pos, existing.len_utf8());
		}
		let mut buf = [0u8; 4];
		let s = c.encode_utf8(&mut buf).to_string();
		self.file.text.insert(pos, &s);
		self.win.view.cursor_to(pos + s.len());
		Ok(())
	}

	fn leave_insert(&mut self) -> VisResult<()> {
		let captured = self.macros.stop_operator_macro();
		if self.action.is_repeatable() {
			self.action_prev = Some(self.action.clone());
			if let Some(m) = captured {
				self.macros.snapshot_repeat(m);
			}
		}
		self.action = Action::new();
		self.mode = ids::NORMAL;
		let pos = self.win.view.cursor().pos;
		if pos > self.file.text.line_begin(pos) {
			self.win.view.cursor_to(self.file.text.char_prev(pos));
		}
		self.file.text.snapshot();
		Ok(())
	}

	fn delete_chars_forward(&mut self) -> VisResult<()> {
		let count = self.action.effective_count().max(1);
		self.action = Action::new();
		let pos = self.win.view.cursor().pos;
		let line_begin = self.file.text.line_begin(pos);
		let end = self.file.text.line_end(pos);
		let mut stop = pos;
		for _ in 0..count {
			if stop >= end {
				break;
			}
			stop = self.file.text.char_next(stop);
		}
		if stop == pos {
			return Ok(());
		}
		let content = self.file.text.bytes_get(Range::new(pos, stop)).to_string();
		self.registers.write(None, RegisterContent::Span(content));
		self.file.text.delete_range(Range::new(pos, stop));
		let new_line_end = self.file.text.line_end(pos);
		let final_pos = if pos == new_line_end && pos > line_begin { self.file.text.char_prev(pos) } else { pos };
		self.win.view.cursor_to(final_pos);
		self.file.text.snapshot();
		Ok(())
	}

	fn delete_chars_backward(&mut self) -> VisResult<()> {
		let count = self.action.effective_count().max(1);
		self.action = Action::new();
		let pos = self.win.view.cursor().pos;
		let line_begin = self.file.text.line_begin(pos);
		let mut start = pos;
		for _ in 0..count {
			if start <= line_begin {
				break;
			}
			start = self.file.text.char_prev(start);
		}
		if start == pos {
			return Ok(());
		}
		let content = self.file.text.bytes_get(Range::new(start, pos)).to_string();
		self.registers.write(None, RegisterContent::Span(content));
		self.file.text.delete_range(Range::new(start, pos));
		self.win.view.cursor_to(start);
		self.file.text.snapshot();
		Ok(())
	}

	/// `r<char>`: replace `count` characters under the cursor with `c`,
	/// without crossing the end of the line (vim aborts the whole command if
	/// there aren't enough characters left to replace).
	fn replace_count_chars(&mut self, c: char) -> VisResult<()> {
		let count = self.action.effective_count().max(1);
		self.action = Action::new();
		let pos = self.win.view.cursor().pos;
		let line_end = self.file.text.line_end(pos);
		let mut positions = Vec::new();
		let mut cur = pos;
		for _ in 0..count {
			if cur >= line_end {
				return Ok(());
			}
			positions.push(cur);
			cur = self.file.text.char_next(cur);
		}
		let mut buf = [0u8; 4];
		let s = c.encode_utf8(&mut buf).to_string();
		for &p in positions.iter().rev() {
			if let Some(existing) = self.file.text.char_at(p) {
				self.file.text.delete(p, existing.len_utf8());
			}
			self.file.text.insert(p, &s);
		}
		self.win.view.cursor_to(self.file.text.char_prev(cur));
		self.file.text.snapshot();
		Ok(())
	}

	fn play_macro(&mut self, name: char) -> VisResult<()> {
		let count = self.action.effective_count().max(1);
		self.action = Action::new();
		let Some(m) = self.macros.get(name) else {
			return Ok(());
		};
		let tokens = m.tokens.clone();
		for _ in 0..count {
			for tok in tokens.clone() {
				self.feed_key(tok)?;
			}
		}
		Ok(())
	}

	/// `.`: replay the last repeatable action. For the INSERT/REPLACE/CHANGE
	/// family, a count given to `.` multiplies how many times the captured
	/// operator macro (the inserted text) is replayed, not the motion that
	/// found where to start — the motion itself always runs once.
	fn repeat_last(&mut self) -> VisResult<()> {
		let Some(prev) = self.action_prev.clone() else {
			return Ok(());
		};
		let new_count = std::mem::take(&mut self.action.count);
		self.action = prev;
		let is_insert_like = matches!(self.action.operator, Some(Operator::Change) | Some(Operator::InsertAt) | Some(Operator::ReplaceAt));
		if new_count > 0 && !is_insert_like {
			self.action.count = new_count;
		}
		self.run_action()?;
		if is_insert_like {
			if let Some(m) = self.macros.repeat_macro().cloned() {
				let replays = if new_count > 0 { new_count } else { 1 };
				for _ in 0..replays {
					for tok in m.tokens.clone() {
						self.feed_key(tok)?;
					}
				}
			}
			if matches!(self.modes.get(self.mode).kind, ModeKind::Insert | ModeKind::Replace) {
				self.leave_insert()?;
			}
		}
		Ok(())
	}

	/// Restore the most recent history snapshot whose contents differ from
	/// the current buffer. A single-level "undo to last distinct state"
	/// rather than a full undo tree with redo — every action already
	/// snapshots unconditionally (see `Action::execute`), so most
	/// consecutive snapshots are identical and this walk skips over them.
	fn undo(&mut self) {
		let current = self.file.text.as_str().to_string();
		let len = self.file.text.history_len();
		for i in (0..len).rev() {
			if self.file.text.history_get(i).is_some_and(|s| s != current) {
				self.file.text.restore_snapshot(i);
				return;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn vis(s: &str) -> Vis {
		Vis::new(Text::from_str(s))
	}

	fn feed(v: &mut Vis, s: &str) {
		for tok in crate::keys::tokenize(s) {
			v.feed_key(tok).unwrap();
		}
	}

	#[test]
	fn dw_deletes_word_and_yanks_it() {
		let mut v = vis("foo bar");
		feed(&mut v, "dw");
		assert_eq!(v.file.text.as_str(), "bar");
		assert_eq!(v.registers.get(None).unwrap().content().as_str(), "foo ");
	}

	#[test]
	fn yy_then_p_duplicates_the_line_below() {
		let mut v = vis("one\ntwo\n");
		feed(&mut v, "yyp");
		assert_eq!(v.file.text.as_str(), "one\none\ntwo\n");
	}

	#[test]
	fn cw_then_dot_repeats_the_change_on_the_next_word() {
		let mut v = vis("foo bar");
		feed(&mut v, "cwbaz");
		feed(&mut v, "<Esc>");
		assert_eq!(v.file.text.as_str(), "baz bar");
		assert_eq!(v.win.view.cursor().pos, 2);
		v.win.view.cursor_to(4);
		feed(&mut v, ".");
		assert_eq!(v.file.text.as_str(), "baz baz");
	}

	#[test]
	fn visual_line_select_whole_buffer_and_delete() {
		let mut v = vis("line1\nline2\nline3");
		feed(&mut v, "ggVGd");
		assert_eq!(v.file.text.as_str(), "");
		assert_eq!(v.win.view.cursor().pos, 0);
		assert_eq!(v.modes.get(v.mode).kind, ModeKind::Normal);
	}

	#[test]
	fn count_r_replaces_n_characters() {
		let mut v = vis("abc");
		feed(&mut v, "3rx");
		assert_eq!(v.file.text.as_str(), "xxx");
		assert_eq!(v.win.view.cursor().pos, 2);
	}

	#[test]
	fn macro_record_and_replay() {
		let mut v = vis("a\nb\nc");
		feed(&mut v, "qaj");
		feed(&mut v, "q");
		feed(&mut v, "@a");
		assert_eq!(v.file.text.lineno_by_pos(v.win.view.cursor().pos), 3);
	}

	#[test]
	fn visual_motion_does_not_leave_visual_mode() {
		let mut v = vis("line1\nline2\nline3");
		feed(&mut v, "v");
		assert_eq!(v.mode, ids::VISUAL);
		feed(&mut v, "l");
		assert_eq!(v.mode, ids::VISUAL);
	}

	#[test]
	fn gg_and_capital_g_use_count_or_default() {
		let mut v = vis("a\nb\nc\nd\n");
		feed(&mut v, "G");
		assert_eq!(v.file.text.lineno_by_pos(v.win.view.cursor().pos), 4);
		feed(&mut v, "gg");
		assert_eq!(v.file.text.lineno_by_pos(v.win.view.cursor().pos), 1);
		feed(&mut v, "3G");
		assert_eq!(v.file.text.lineno_by_pos(v.win.view.cursor().pos), 3);
	}
}
