pub mod client;
pub mod context;
mod extract;
pub mod prompts;
pub mod types;

pub use client::{AiGateway, ReqwestTransport};
pub use context::ConversationContext;
pub use types::ConversationTurn;
