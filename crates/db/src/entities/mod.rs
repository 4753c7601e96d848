pub mod event_outbox;
pub mod note;
pub mod notification;
pub mod project;
pub mod tag;
pub mod task;
