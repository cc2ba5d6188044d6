pub mod drafts;
pub mod events;
pub mod handlers;
pub mod server;

pub use server::{routes, ServerHandle, WebServer};

pub use drafts::{DraftId, DraftManager, DraftSnapshot, DraftStoreError};
pub use events::{DraftEvent, EventBus};
pub use server::{AppContext, ServerConfig, ServerError};
