pub mod api;
pub mod event;
pub mod model;
pub mod store;

pub use api::{ConversationApi, PushChannel, PushStream};
pub use event::FeedEvent;
pub use model::{
    ConversationState, DEFAULT_MAX_MESSAGES, DEFAULT_ROUND_CAPACITY, LifecyclePayload, Message,
    StartResponse, StatusSnapshot,
};
pub use store::{StateStore, StoreChange};
