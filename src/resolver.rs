//! Generic key-sequence resolution over the mode tree: binding lookup,
//! prefix detection, and alias expansion.
//!
//! Grounded on original_source/vis.c's `vis_keys` resolution loop
//! (SPEC_FULL.md §4.2): walk the current mode's `parent` chain looking for a
//! binding that matches the pending input exactly; if none matches but some
//! reachable binding has the pending input as a proper prefix, wait for more
//! keys; otherwise the input is unbound. An alias binding is expanded and
//! resolution of the expansion restarts from the front.
//!
//! The action payload is generic (`T`) so the editor root can bind its own
//! command vocabulary without this module depending on it — the teacher has
//! no equivalent (its mode dispatch is per-mode hardcoded parsing), so this
//! is built fresh in the shape the specification describes.

use std::collections::HashMap;

use crate::keys::KeyToken;
use crate::mode::{ModeId, ModeTree};

#[derive(Clone)]
enum Entry<T> {
	Action(T),
	Alias(Vec<KeyToken>),
}

pub struct Bindings<T> {
	tables: HashMap<ModeId, HashMap<Vec<KeyToken>, Entry<T>>>,
}

impl<T: Clone> Bindings<T> {
	pub fn new() -> Self {
		Self { tables: HashMap::new() }
	}

	pub fn bind(&mut self, mode: ModeId, keys: Vec<KeyToken>, action: T) {
		self.tables.entry(mode).or_default().insert(keys, Entry::Action(action));
	}

	/// Register `keys` to expand to `expansion` when resolved: `vis_keys_inject`
	/// at bind time rather than inject time, since this implementation has no
	/// separate config-parsing pass that would need to defer the expansion.
	pub fn alias(&mut self, mode: ModeId, keys: Vec<KeyToken>, expansion: Vec<KeyToken>) {
		self.tables.entry(mode).or_default().insert(keys, Entry::Alias(expansion));
	}

	/// Resolve `input` (the pending, not-yet-dispatched key buffer) against
	/// every mode reachable by walking `parent` pointers from `start`, nearest
	/// mode first. `input` must be non-empty.
	pub fn resolve(&self, modes: &ModeTree, start: ModeId, input: &[KeyToken]) -> Resolution<T> {
		debug_assert!(!input.is_empty());
		let mut prefix_elsewhere = false;
		let mut cur = Some(start);
		while let Some(id) = cur {
			if let Some(table) = self.tables.get(&id) {
				if let Some(entry) = table.get(input) {
					return match entry {
						Entry::Action(a) => Resolution::Matched(a.clone()),
						Entry::Alias(expansion) => Resolution::Alias(expansion.clone()),
					};
				}
				if table.keys().any(|k| k.len() > input.len() && k.starts_with(input)) {
					prefix_elsewhere = true;
				}
			}
			cur = modes.get(id).parent;
		}
		if prefix_elsewhere { Resolution::Prefix } else { Resolution::Unbound }
	}
}

impl<T: Clone> Default for Bindings<T> {
	fn default() -> Self {
		Self::new()
	}
}

#[derive(Debug, Clone)]
pub enum Resolution<T> {
	Matched(T),
	Alias(Vec<KeyToken>),
	/// The pending input is a real prefix of some reachable binding; wait for
	/// more keys before deciding.
	Prefix,
	Unbound,
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mode::ids;

	#[test]
	fn exact_match_wins_over_prefix_of_longer_binding() {
		let mut b: Bindings<&'static str> = Bindings::new();
		b.bind(ids::NORMAL, vec![KeyToken::Char('g')], "g-alone");
		b.bind(ids::NORMAL, vec![KeyToken::Char('g'), KeyToken::Char('g')], "gg");
		let modes = ModeTree::standard();
		let input = vec![KeyToken::Char('g')];
		assert!(matches!(b.resolve(&modes, ids::NORMAL, &input), Resolution::Matched("g-alone")));
	}

	#[test]
	fn unambiguous_prefix_waits_for_more_input() {
		let mut b: Bindings<&'static str> = Bindings::new();
		b.bind(ids::NORMAL, vec![KeyToken::Char('Z'), KeyToken::Char('Z')], "save-quit");
		let modes = ModeTree::standard();
		let input = vec![KeyToken::Char('Z')];
		assert!(matches!(b.resolve(&modes, ids::NORMAL, &input), Resolution::Prefix));
	}

	#[test]
	fn binding_reachable_through_parent_chain() {
		let mut b: Bindings<&'static str> = Bindings::new();
		b.bind(ids::MOVE, vec![KeyToken::Char('w')], "word-forward");
		let modes = ModeTree::standard();
		let input = vec![KeyToken::Char('w')];
		assert!(matches!(b.resolve(&modes, ids::NORMAL, &input), Resolution::Matched("word-forward")));
	}

	#[test]
	fn alias_returns_expansion_for_caller_to_replay() {
		let mut b: Bindings<&'static str> = Bindings::new();
		b.alias(ids::NORMAL, vec![KeyToken::Char('Y')], vec![KeyToken::Char('y'), KeyToken::Char('y')]);
		let modes = ModeTree::standard();
		let input = vec![KeyToken::Char('Y')];
		match b.resolve(&modes, ids::NORMAL, &input) {
			Resolution::Alias(exp) => assert_eq!(exp, vec![KeyToken::Char('y'), KeyToken::Char('y')]),
			_ => panic!("expected alias"),
		}
	}
}
