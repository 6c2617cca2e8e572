//! Storage trait definition

use std::sync::Arc;

use async_trait::async_trait;

use crate::Metric;

/// Trait for metric persistence backends
///
/// `save` does not return an error. Implementations catch and log their own
/// failures; a failed write must not affect other backends or later metrics.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` as the engine holds them as trait
/// objects inside async code.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Persist one metric
    async fn save(&self, metric: &Metric);
}

/// Lets a caller keep a handle to a backend it registered with the engine
#[async_trait]
impl<T: Storage + ?Sized> Storage for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn save(&self, metric: &Metric) {
        (**self).save(metric).await
    }
}
