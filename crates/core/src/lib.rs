//! Core logic of a chat about a webpage: the conversation controller,
//! transcript persistence and page content access.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod controller;
pub mod notice;
pub mod page;
mod service_client;
pub mod store;

pub use controller::{
    ContextSource, Controller, ControllerBuilder, ControllerEvent, GREETING,
    OUT_OF_SCOPE_MESSAGE, RejectReason, Snapshot, SubmitOutcome,
};
pub use notice::{Notice, NoticeLevel};
pub use page_chat_actor::ActorDeadError;
