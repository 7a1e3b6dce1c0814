use async_trait::async_trait;

/// The collaborator a [`crate::CachedLoader`] renders cache-aware.
///
/// Concrete implementations talk to whatever backing store the caller
/// chooses (relational, document, remote service); this crate only fixes
/// the shape of the contract, never the storage technology behind it.
#[async_trait]
pub trait Loader: Send + Sync {
    type Id: Send + Sync;
    type Item: Clone + Send + Sync;
    type Params: Send + Sync;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Item>, Self::Error>;

    async fn save(&self, item: Self::Item, params: &Self::Params) -> Result<Self::Item, Self::Error>;

    async fn save_batch(
        &self,
        items: Vec<Self::Item>,
        params: &Self::Params,
    ) -> Result<Vec<Self::Item>, Self::Error>;

    /// Default no-op; override to run migrations, create indices, etc.
    async fn initialize_storage(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Default no-op; override to probe the backing store's liveness.
    async fn health_check(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Free-form diagnostic text, surfaced by `CachedLoader::get_debug_info`.
    fn debug_info(&self) -> String {
        String::new()
    }
}
