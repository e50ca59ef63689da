//! Invalidation Module
//!
//! Mutation handlers name the cached views they change. There is no
//! dependency tracking: a handler that forgets a target serves stale data
//! until the TTL runs out.

use std::future::Future;

use tracing::debug;

use super::{CacheManager, Namespace};

/// A cached view to drop after a source-of-truth mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// One logical key, for narrow mutations
    Key { key: String, namespace: Namespace },
    /// Everything in a namespace, for bulk or ambiguous mutations
    Namespace(Namespace),
}

impl Invalidation {
    pub fn key(key: impl Into<String>, namespace: Namespace) -> Self {
        Invalidation::Key {
            key: key.into(),
            namespace,
        }
    }

    pub fn namespace(namespace: Namespace) -> Self {
        Invalidation::Namespace(namespace)
    }
}

impl CacheManager {
    /// Applies one invalidation target, returning how many keys were removed.
    pub async fn invalidate(&self, target: &Invalidation) -> u64 {
        match target {
            Invalidation::Key { key, namespace } => u64::from(self.delete(key, namespace).await),
            Invalidation::Namespace(namespace) => self.invalidate_namespace(namespace).await,
        }
    }

    /// Runs `mutation` and, once it succeeds, drops every target before returning.
    ///
    /// A failed mutation invalidates nothing and its error is returned as is.
    pub async fn with_invalidation<T, E, Fut>(
        &self,
        targets: &[Invalidation],
        mutation: Fut,
    ) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        let output = mutation.await?;
        for target in targets {
            let removed = self.invalidate(target).await;
            debug!(?target, removed, "invalidated after mutation");
        }
        Ok(output)
    }
}
