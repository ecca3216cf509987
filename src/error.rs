//! Error taxonomy for the editor core.
//!
//! Variants mirror the propagation policy: fatal errors bubble out of the
//! main loop, user-visible errors are meant to be shown in the status line,
//! recoverable conditions are modeled as `Option::None` wherever possible and
//! only appear here when a caller needs to distinguish "no match" from "the
//! pattern didn't even compile", and internal errors mark a logic bug the
//! resolver recovers from by dropping the pending input queue.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisError {
	#[error("fatal: {0}")]
	Fatal(String),

	#[error("{0}")]
	UserVisible(String),

	#[error("recoverable: {0}")]
	Recoverable(String),

	#[error("internal error: {0}")]
	Internal(String),
}

impl VisError {
	pub fn fatal(msg: impl Into<String>) -> Self {
		Self::Fatal(msg.into())
	}
	pub fn user(msg: impl Into<String>) -> Self {
		Self::UserVisible(msg.into())
	}
	pub fn recoverable(msg: impl Into<String>) -> Self {
		Self::Recoverable(msg.into())
	}
	pub fn internal(msg: impl Into<String>) -> Self {
		Self::Internal(msg.into())
	}

	pub fn is_fatal(&self) -> bool {
		matches!(self, Self::Fatal(_))
	}
}

pub type VisResult<T> = Result<T, VisError>;
