//! Chat about the content of a webpage.
//!
//! [`SessionBuilder`] wires the conversation controller to the HTTP
//! question-answering service, a history file and a page reader that
//! downloads pages and extracts their visible text.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod extract;
mod session;

pub use session::{Session, SessionBuilder};
