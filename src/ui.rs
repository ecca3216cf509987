//! The UI capability set the editor root drives, plus a headless test double.
//!
//! Grounded on SPEC_FULL.md §6's UI capability set and original_source/vis.c's
//! `Ui` vtable; the teacher has no terminal layer at all (it's a library), so
//! this trait is built fresh, shaped like the spec's capability list rather
//! than any one example repo's terminal driver.

use crate::text::Pos;

/// Everything the composition engine asks of a host display. A real terminal
/// driver is out of scope; `NullUi` is the only implementation in-tree.
pub trait Ui {
	fn init(&mut self) {}
	fn free(&mut self) {}
	fn draw(&mut self) {}
	fn update(&mut self) {}
	fn resize(&mut self, _cols: usize, _rows: usize) {}
	fn suspend(&mut self) {}
	fn die(&mut self, msg: &str) {
		log::error!("{msg}");
	}
	fn info(&mut self, _msg: &str) {}
	fn info_hide(&mut self) {}
	fn prompt(&mut self, _title: &str, _text: &str) {}
	fn prompt_hide(&mut self) {}
	fn prompt_input(&mut self) -> Option<String> {
		None
	}
	fn window_new(&mut self) -> usize {
		0
	}
	fn window_free(&mut self, _handle: usize) {}
	fn window_focus(&mut self, _handle: usize) {}
	fn reload(&mut self, _handle: usize) {}
	fn draw_status(&mut self, _status: &str) {}
	/// Called after every cursor move so a real UI can keep the viewport in
	/// sync; `NullUi` just records the last position for tests to inspect.
	fn cursor_moved(&mut self, _pos: Pos) {}
}

/// No-op `Ui` so the editor root can run headless, in tests or as an
/// embedded library.
#[derive(Default)]
pub struct NullUi {
	pub last_status: String,
	pub last_cursor: Pos,
	pub died: Option<String>,
}

impl Ui for NullUi {
	fn die(&mut self, msg: &str) {
		self.died = Some(msg.to_string());
	}
	fn draw_status(&mut self, status: &str) {
		self.last_status = status.to_string();
	}
	fn cursor_moved(&mut self, pos: Pos) {
		self.last_cursor = pos;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn null_ui_records_status_and_cursor() {
		let mut ui = NullUi::default();
		ui.draw_status("-- INSERT --");
		ui.cursor_moved(42);
		assert_eq!(ui.last_status, "-- INSERT --");
		assert_eq!(ui.last_cursor, 42);
	}
}
