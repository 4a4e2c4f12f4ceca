pub mod assistant;
pub mod client;
pub mod messages;
pub mod mime;
pub mod models;
pub mod service;

pub use assistant::AssistantClient;
pub use client::GmailClient;
pub use service::{AssistantService, MailService, SessionService};
