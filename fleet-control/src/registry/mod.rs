//! Coordinator-side registration data.
//!
//! Registration lookups are advisory: no control decision is ever taken on
//! them, so the seam has no error channel. A registry that cannot answer
//! reports [`RegistryView::Unavailable`] and callers degrade their output.

mod http;

pub use http::CoordinatorClient;

use async_trait::async_trait;

use crate::models::RegisteredExecutor;

#[derive(Debug, Clone)]
pub enum RegistryView {
    Available(Vec<RegisteredExecutor>),
    Unavailable { reason: String },
}

#[async_trait]
pub trait RunnerRegistry: Send + Sync {
    /// Lists executors registered under `prefix`. Transport failures, auth
    /// rejections and missing credentials all come back as `Unavailable`.
    async fn list_registered(&self, prefix: &str) -> RegistryView;
}
