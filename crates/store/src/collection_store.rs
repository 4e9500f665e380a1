use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::collection::JsonCollection;
use crate::errors::StoreError;

/// Trait abstraction for whole-collection storage.
/// Implementations can be file-backed or in-memory; callers depend on this seam.
#[async_trait]
pub trait CollectionStore<T: Send + Sync + 'static>: Send + Sync {
    async fn get(&self) -> Result<Vec<T>, StoreError>;
    async fn set(&self, data: Vec<T>) -> Result<Vec<T>, StoreError>;
    async fn add(&self, element: T) -> Result<Vec<T>, StoreError>;
    async fn replace(&self, element: T, predicate: &(dyn for<'r> Fn(&'r T, usize) -> bool + Send + Sync)) -> Result<Vec<T>, StoreError>;
    async fn delete(&self, predicate: &(dyn for<'r> Fn(&'r T, usize) -> bool + Send + Sync)) -> Result<Vec<T>, StoreError>;
}

#[async_trait]
impl<T> CollectionStore<T> for JsonCollection<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn get(&self) -> Result<Vec<T>, StoreError> { Ok(self.get().await?) }
    async fn set(&self, data: Vec<T>) -> Result<Vec<T>, StoreError> { Ok(self.set(data).await?) }
    async fn add(&self, element: T) -> Result<Vec<T>, StoreError> { self.add(element).await }
    async fn replace(&self, element: T, predicate: &(dyn for<'r> Fn(&'r T, usize) -> bool + Send + Sync)) -> Result<Vec<T>, StoreError> {
        self.replace(element, |record, i| predicate(record, i)).await
    }
    async fn delete(&self, predicate: &(dyn for<'r> Fn(&'r T, usize) -> bool + Send + Sync)) -> Result<Vec<T>, StoreError> {
        self.delete(|record, i| predicate(record, i)).await
    }
}
