//! Renderer: maps page state to HTML fragments or terminal text.

pub mod html;
pub mod text;
pub mod view;

pub use html::HtmlRenderer;
pub use view::{DashboardView, FeedView, InvestigationView, MoodView, RenderOptions};
