//! Core types and the message lifecycle service for the ZTRACK contact inbox.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::InboxStore`], mail transports implement
//! [`notify::Notifier`], and [`lifecycle::Lifecycle`] ties the two together.

pub mod error;
pub mod history;
pub mod lifecycle;
pub mod message;
pub mod notify;
pub mod store;
pub mod template;
pub mod validate;

pub use error::{Error, Result};
