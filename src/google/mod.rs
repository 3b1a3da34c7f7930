//! Thin clients for the Google Workspace REST APIs used by the CLI
pub mod client;
pub mod gcal;
pub mod groups;

pub use client::GoogleClient;
pub use gcal::CalendarApi;
pub use groups::GroupsApi;
