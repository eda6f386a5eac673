//! Network side of the client: the reqwest backend, the server-sent events
//! push channel, retry policy and the Transport Adapter built on top of them.

pub mod error;
pub mod http_backend;
pub mod push;
pub mod retry;
pub mod transport;

pub use http_backend::HttpBackend;
pub use push::SsePushChannel;
pub use retry::RetryPolicy;
pub use transport::{
    ConnectivityState, FeedResource, TransportAdapter, TransportEvent, TransportHandle,
};
