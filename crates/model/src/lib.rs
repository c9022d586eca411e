//! Shared types and protocols for chatting about a webpage.
//!
//! This crate establishes the vocabulary spoken between the conversation
//! controller, the remote question-answering service and whatever host
//! is able to read page content. The controller only depends on the
//! traits defined here, so services and page providers can be swapped
//! freely (a real HTTP backend, a scripted fake in tests, etc.).
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod message;
mod page;
mod request;
mod response;
mod service;

pub use error::*;
pub use message::*;
pub use page::*;
pub use request::*;
pub use response::*;
pub use service::*;
