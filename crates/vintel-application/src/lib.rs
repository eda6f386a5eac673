//! Application layer for Visitor Intel.
//!
//! Wires the domain (`vintel-core`) to the network (`vintel-interaction`):
//! the feed session and page bootstrap, the countdown clock, the content
//! dashboard and the renderers.

pub mod countdown_clock;
pub mod dashboard;
pub mod feed_actions;
pub mod page;
pub mod renderer;
pub mod session;

pub use countdown_clock::{CountdownClock, CountdownHandle};
pub use dashboard::{AssumeYes, Confirmer, Dashboard, ModuleEntry};
pub use feed_actions::FeedActions;
pub use page::FeedPage;
pub use session::{FeedSession, FeedSnapshot, SessionCommand};
