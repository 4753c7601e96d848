#![allow(clippy::useless_conversion)]

mod common;
pub mod event_outbox;
pub mod note;
pub mod notification;
pub mod project;
pub mod reference;
pub mod stats;
pub mod tag;
pub mod task;

pub use common::TagRef;
