pub mod client_info;
pub mod config;
pub mod editor;
pub mod events;
pub mod geolocation;
pub mod listing;
pub mod notification;
pub mod notification_center;
pub mod storage;
pub mod time_label;
