//! Command-line argument parsing into an `Args` struct.
//!
//! Grounded on SPEC_FULL.md §6's argv surface and original_source/vis.c's
//! `main()` option loop; the teacher parses its own ViCut-specific flags in
//! `main.rs` (deleted — superseded), so the shape here (a small hand-rolled
//! loop over `&[String]`, not a derive-based parser) follows the teacher's
//! style rather than its content, since pulling in a declarative-argument
//! crate for half a dozen flags would be disproportionate to what's left of
//! the teacher's own CLI surface once the scripting language is gone.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupCommand {
	Ex(String),
	SearchForward(String),
	SearchBackward(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
	pub print_version: bool,
	pub files: Vec<String>,
	pub read_stdin: bool,
	pub startup_commands: Vec<StartupCommand>,
}

/// Parse `argv` (excluding the program name) per SPEC_FULL.md §6: `-v` prints
/// version and exits; `--` ends option parsing; `+CMD`/`+/pat`/`+?pat` queue a
/// startup command run against the next opened file; a bare `-` requests
/// slurping stdin into an empty buffer; everything else is a filename. If no
/// files were named (and stdin wasn't requested), the host should open one
/// empty buffer.
pub fn parse(argv: &[String]) -> Args {
	let mut args = Args::default();
	let mut options_ended = false;

	for arg in argv {
		if !options_ended && arg == "--" {
			options_ended = true;
			continue;
		}
		if !options_ended && arg == "-v" {
			args.print_version = true;
			continue;
		}
		if !options_ended && arg == "-" {
			args.read_stdin = true;
			continue;
		}
		if !options_ended && arg.starts_with('+') {
			let rest = &arg[1..];
			let cmd = if let Some(pat) = rest.strip_prefix('/') {
				StartupCommand::SearchForward(pat.to_string())
			} else if let Some(pat) = rest.strip_prefix('?') {
				StartupCommand::SearchBackward(pat.to_string())
			} else {
				StartupCommand::Ex(rest.to_string())
			};
			args.startup_commands.push(cmd);
			continue;
		}
		args.files.push(arg.clone());
	}

	args
}

#[cfg(test)]
mod tests {
	use super::*;

	fn v(items: &[&str]) -> Vec<String> {
		items.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn plain_filenames_are_collected() {
		let args = parse(&v(&["a.txt", "b.txt"]));
		assert_eq!(args.files, vec!["a.txt", "b.txt"]);
	}

	#[test]
	fn dash_requests_stdin_without_becoming_a_filename() {
		let args = parse(&v(&["-"]));
		assert!(args.read_stdin);
		assert!(args.files.is_empty());
	}

	#[test]
	fn plus_forms_queue_startup_commands() {
		let args = parse(&v(&["+/needle", "+42", "file.txt"]));
		assert_eq!(args.startup_commands, vec![StartupCommand::SearchForward("needle".into()), StartupCommand::Ex("42".into())]);
		assert_eq!(args.files, vec!["file.txt"]);
	}

	#[test]
	fn double_dash_stops_option_parsing() {
		let args = parse(&v(&["--", "-v", "+weird"]));
		assert!(!args.print_version);
		assert_eq!(args.files, vec!["-v", "+weird"]);
	}
}
