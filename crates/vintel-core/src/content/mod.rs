pub mod api;
pub mod machine;
pub mod model;

pub use api::ContentApi;
pub use machine::{ContentAction, Transition};
pub use model::{
    ContentDocument, ContentDownload, ContentModuleStatus, ContentModuleType, ContentStatus,
};
