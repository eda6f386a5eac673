use async_trait::async_trait;

use super::model::{ContentDocument, ContentDownload, ContentModuleStatus, ContentModuleType};
use crate::error::Result;

/// Backend calls behind the content dashboard.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// `GET /content/{module}/status`
    async fn content_status(&self, module: ContentModuleType) -> Result<ContentModuleStatus>;

    /// `POST /content/{module}/generate`
    async fn generate(&self, module: ContentModuleType) -> Result<ContentModuleStatus>;

    /// `GET /content/{module}`
    async fn fetch(&self, module: ContentModuleType) -> Result<ContentDocument>;

    /// `GET /content/{module}/download`
    async fn download(&self, module: ContentModuleType) -> Result<ContentDownload>;

    /// `DELETE /content/{module}`
    async fn delete(&self, module: ContentModuleType) -> Result<()>;
}
