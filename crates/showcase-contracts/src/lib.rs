pub mod api;
pub mod chat;
pub mod events;
pub mod form;
pub mod prompts;
pub mod workflow;
