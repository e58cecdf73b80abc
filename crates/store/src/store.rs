use crate::error::StoreError;
use async_trait::async_trait;

/// Collection names used by the game.
pub mod collections {
    /// Append-only fact log; the source of truth for reconciliation.
    pub const EVENTS: &str = "events";
    /// Game projections. Reserved; games are rebuilt from [`EVENTS`].
    pub const GAMES: &str = "games";
    /// Player projections. Reserved; players are rebuilt from [`EVENTS`].
    pub const PLAYERS: &str = "players";
    /// Kill dictionary entries.
    pub const KILLWORDS: &str = "killwords";
}

/// Keyed document collections. Documents are opaque bytes.
///
/// Implementations reconnect on their own after losing their backend and
/// bound every call, surfacing a stalled backend as [`StoreError::Timeout`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document. Fails with [`StoreError::DuplicateKey`] if the
    /// key is taken.
    async fn append(&self, collection: &str, key: &str, document: &[u8])
        -> Result<(), StoreError>;

    /// Every document in the collection, in append order.
    async fn read_all(&self, collection: &str) -> Result<Vec<Vec<u8>>, StoreError>;

    /// Replaces an existing document.
    async fn update(&self, collection: &str, key: &str, document: &[u8])
        -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<S> {
    async fn append(
        &self,
        collection: &str,
        key: &str,
        document: &[u8],
    ) -> Result<(), StoreError> {
        (**self).append(collection, key, document).await
    }

    async fn read_all(&self, collection: &str) -> Result<Vec<Vec<u8>>, StoreError> {
        (**self).read_all(collection).await
    }

    async fn update(
        &self,
        collection: &str,
        key: &str,
        document: &[u8],
    ) -> Result<(), StoreError> {
        (**self).update(collection, key, document).await
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        (**self).delete(collection, key).await
    }
}
