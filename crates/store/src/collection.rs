use std::{
    fmt,
    io,
    marker::PhantomData,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;
use tracing::debug;

use crate::errors::{ConstructionError, ReadError, StoreError, WriteError};
use crate::logger::{NoopLogger, StoreLogger};

/// Options recognized when opening a collection file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DbJsonOptions {
    /// Create an empty file when the resolved path does not exist.
    pub force_create: bool,
    /// Report the resolved absolute path through the logger on open.
    pub log_full_path: bool,
}

impl DbJsonOptions {
    pub fn force_create(mut self, yes: bool) -> Self {
        self.force_create = yes;
        self
    }

    pub fn log_full_path(mut self, yes: bool) -> Self {
        self.log_full_path = yes;
        self
    }
}

/// JSON file-backed collection of homogeneous records.
///
/// The file holds either nothing or a JSON array. Every operation reads and/or
/// rewrites the whole file; no descriptor is kept open between calls.
///
/// Calls are not serialized: two overlapping read-modify-write operations on
/// the same file can lose one of the updates. Callers that share a file must
/// await each operation before issuing the next.
pub struct JsonCollection<T> {
    file_path: PathBuf,
    options: DbJsonOptions,
    logger: Arc<dyn StoreLogger>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonCollection<T> {
    fn clone(&self) -> Self {
        Self {
            file_path: self.file_path.clone(),
            options: self.options,
            logger: Arc::clone(&self.logger),
            _record: PhantomData,
        }
    }
}

impl<T> fmt::Debug for JsonCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonCollection")
            .field("file_path", &self.file_path)
            .field("options", &self.options)
            .finish()
    }
}

impl<T> JsonCollection<T> {
    /// Open a collection without operator diagnostics.
    pub async fn new<P: AsRef<Path>>(path: P, options: DbJsonOptions) -> Result<Self, ConstructionError> {
        Self::with_logger(path, options, Arc::new(NoopLogger)).await
    }

    /// Open a collection, reporting diagnostics through `logger`.
    ///
    /// With `force_create` the empty file is created before this returns, so
    /// the handle is immediately readable.
    pub async fn with_logger<P: AsRef<Path>>(
        path: P,
        options: DbJsonOptions,
        logger: Arc<dyn StoreLogger>,
    ) -> Result<Self, ConstructionError> {
        let given = path.as_ref();
        let file_path = resolve(given).map_err(|source| ConstructionError::Resolve {
            path: given.to_path_buf(),
            source,
        })?;

        if options.log_full_path {
            logger.log(&file_path.display().to_string());
        }

        let exists = fs::try_exists(&file_path)
            .await
            .map_err(|source| ConstructionError::Resolve { path: file_path.clone(), source })?;
        if !exists {
            if !options.force_create {
                return Err(ConstructionError::Missing(file_path));
            }
            fs::write(&file_path, b"")
                .await
                .map_err(|source| ConstructionError::Create { path: file_path.clone(), source })?;
            logger.log("collection file created");
            debug!(path = %file_path.display(), "created empty collection file");
        }

        Ok(Self { file_path, options, logger, _record: PhantomData })
    }

    /// Resolved absolute path of the backing file.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn options(&self) -> &DbJsonOptions {
        &self.options
    }
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// Read the whole collection. An empty file is an empty collection.
    pub async fn get(&self) -> Result<Vec<T>, ReadError> {
        let content = fs::read_to_string(&self.file_path)
            .await
            .map_err(|source| ReadError::Io { path: self.file_path.clone(), source })?;
        let records = decode(&content)
            .map_err(|source| ReadError::Parse { path: self.file_path.clone(), source })?;
        debug!(path = %self.file_path.display(), count = records.len(), "collection read");
        Ok(records)
    }

    /// Overwrite the whole collection and hand the records back.
    pub async fn set(&self, data: Vec<T>) -> Result<Vec<T>, WriteError> {
        let body = serde_json::to_string_pretty(&data).map_err(WriteError::Serialize)?;
        fs::write(&self.file_path, body)
            .await
            .map_err(|source| WriteError::Io { path: self.file_path.clone(), source })?;
        debug!(path = %self.file_path.display(), count = data.len(), "collection written");
        Ok(data)
    }

    /// Append one record and persist.
    pub async fn add(&self, element: T) -> Result<Vec<T>, StoreError> {
        let mut records = self.get().await?;
        records.push(element);
        Ok(self.set(records).await?)
    }

    /// Swap every record matching `predicate(record, index)` for `element`.
    pub async fn replace<F>(&self, element: T, predicate: F) -> Result<Vec<T>, StoreError>
    where
        T: Clone,
        F: FnMut(&T, usize) -> bool,
    {
        let records = self.get().await?;
        Ok(self.set(replace_matching(records, &element, predicate)).await?)
    }

    /// Drop every record matching `predicate(record, index)`.
    pub async fn delete<F>(&self, predicate: F) -> Result<Vec<T>, StoreError>
    where
        F: FnMut(&T, usize) -> bool,
    {
        let records = self.get().await?;
        Ok(self.set(remove_matching(records, predicate)).await?)
    }
}

/// Map each record to `element` where the predicate holds. Indices refer to
/// positions in `records`.
pub fn replace_matching<T, F>(records: Vec<T>, element: &T, mut predicate: F) -> Vec<T>
where
    T: Clone,
    F: FnMut(&T, usize) -> bool,
{
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| if predicate(&record, i) { element.clone() } else { record })
        .collect()
}

/// Keep the records where the predicate is false, in their original order.
pub fn remove_matching<T, F>(records: Vec<T>, mut predicate: F) -> Vec<T>
where
    F: FnMut(&T, usize) -> bool,
{
    records
        .into_iter()
        .enumerate()
        .filter(|(i, record)| !predicate(record, *i))
        .map(|(_, record)| record)
        .collect()
}

fn decode<T: DeserializeOwned>(content: &str) -> Result<Vec<T>, serde_json::Error> {
    if content.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(content)
}

// Absolute and lexically normalized; the target does not have to exist.
fn resolve(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other.as_os_str()),
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLogger;
    use serde::{Deserialize, Serializer};
    use serde_json::{json, Value};
    use uuid::Uuid;

    // Reads like a plain number but refuses to be written back.
    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Unwritable(u32);

    impl Serialize for Unwritable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("unwritable record"))
        }
    }

    fn tmp_path(prefix: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{prefix}_{}.json", Uuid::new_v4()))
    }

    fn sample() -> Vec<Value> {
        vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})]
    }

    #[test]
    fn replace_matching_keeps_length_and_order() {
        let out = replace_matching(sample(), &json!({"id": 9}), |_, i| i == 0);
        assert_eq!(out, vec![json!({"id": 9}), json!({"id": 2}), json!({"id": 3})]);

        let out = replace_matching(sample(), &json!(0), |e, _| e["id"].as_i64().unwrap_or(0) > 1);
        assert_eq!(out, vec![json!({"id": 1}), json!(0), json!(0)]);
    }

    #[test]
    fn remove_matching_keeps_survivor_order() {
        let out = remove_matching(sample(), |e, _| e["id"] == 2);
        assert_eq!(out, vec![json!({"id": 1}), json!({"id": 3})]);

        let out = remove_matching(sample(), |_, i| i % 2 == 0);
        assert_eq!(out, vec![json!({"id": 2})]);
    }

    #[test]
    fn predicates_see_every_index_once() {
        let mut seen = Vec::new();
        let _ = remove_matching(sample(), |_, i| {
            seen.push(i);
            false
        });
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn decode_treats_only_the_empty_string_as_empty() {
        assert!(decode::<Value>("").unwrap().is_empty());
        assert!(decode::<Value>("[]").unwrap().is_empty());
        assert!(decode::<Value>("  ").is_err());
        assert!(decode::<Value>("{\"id\":1}").is_err());
    }

    #[test]
    fn resolve_normalizes_relative_segments() {
        let cwd = std::env::current_dir().unwrap();
        let resolved = resolve(Path::new("./a/../b.json")).unwrap();
        assert_eq!(resolved, cwd.join("b.json"));
        assert!(resolved.is_absolute());
    }

    #[tokio::test]
    async fn missing_file_without_force_create_fails() -> Result<(), anyhow::Error> {
        let tmp = tmp_path("dbjson_missing");
        let err = JsonCollection::<Value>::new(&tmp, DbJsonOptions::default())
            .await
            .expect_err("must fail");
        assert!(matches!(err, ConstructionError::Missing(ref p) if p == &tmp));
        assert!(!tmp.exists());
        Ok(())
    }

    #[tokio::test]
    async fn force_create_makes_empty_readable_file() -> Result<(), anyhow::Error> {
        let tmp = tmp_path("dbjson_force");
        let logger = MemoryLogger::new();
        let options = DbJsonOptions::default().force_create(true).log_full_path(true);
        let store = JsonCollection::<Value>::with_logger(&tmp, options, Arc::new(logger.clone())).await?;

        assert_eq!(std::fs::read_to_string(&tmp)?, "");
        assert!(store.get().await?.is_empty());
        assert_eq!(
            logger.lines(),
            vec![tmp.display().to_string(), "collection file created".to_string()]
        );

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn existing_file_is_left_untouched() -> Result<(), anyhow::Error> {
        let tmp = tmp_path("dbjson_existing");
        tokio::fs::write(&tmp, "[1,2]").await?;
        let logger = MemoryLogger::new();
        let store = JsonCollection::<i32>::with_logger(
            &tmp,
            DbJsonOptions::default().force_create(true),
            Arc::new(logger.clone()),
        )
        .await?;

        assert_eq!(store.get().await?, vec![1, 2]);
        assert!(logger.lines().is_empty());

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn set_writes_two_space_pretty_json() -> Result<(), anyhow::Error> {
        let tmp = tmp_path("dbjson_pretty");
        let store = JsonCollection::<Value>::new(&tmp, DbJsonOptions::default().force_create(true)).await?;

        let written = store.set(vec![json!({"id": 1})]).await?;
        assert_eq!(written, vec![json!({"id": 1})]);
        assert_eq!(std::fs::read_to_string(&tmp)?, "[\n  {\n    \"id\": 1\n  }\n]");

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn non_array_content_is_a_parse_error() -> Result<(), anyhow::Error> {
        let tmp = tmp_path("dbjson_object");
        tokio::fs::write(&tmp, "{\"id\": 1}").await?;
        let store = JsonCollection::<Value>::new(&tmp, DbJsonOptions::default()).await?;

        assert!(matches!(store.get().await, Err(ReadError::Parse { .. })));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn derived_ops_do_not_write_after_a_failed_read() -> Result<(), anyhow::Error> {
        let tmp = tmp_path("dbjson_corrupt");
        tokio::fs::write(&tmp, "[1, 2").await?;
        let store = JsonCollection::<i32>::new(&tmp, DbJsonOptions::default()).await?;

        assert!(store.add(3).await.unwrap_err().is_read());
        assert!(store.replace(0, |_, _| true).await.unwrap_err().is_read());
        assert!(store.delete(|_, _| true).await.unwrap_err().is_read());
        assert_eq!(std::fs::read_to_string(&tmp)?, "[1, 2");

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn file_removed_after_open_surfaces_io_read_error() -> Result<(), anyhow::Error> {
        let tmp = tmp_path("dbjson_removed");
        let store = JsonCollection::<Value>::new(&tmp, DbJsonOptions::default().force_create(true)).await?;
        tokio::fs::remove_file(&tmp).await?;

        assert!(matches!(store.get().await, Err(ReadError::Io { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn write_into_missing_directory_is_a_write_error() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("dbjson_dir_{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await?;
        let tmp = dir.join("records.json");
        let store = JsonCollection::<i32>::new(&tmp, DbJsonOptions::default().force_create(true)).await?;
        tokio::fs::remove_dir_all(&dir).await?;

        assert!(matches!(store.set(vec![1]).await, Err(WriteError::Io { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn serialize_failure_leaves_file_untouched() -> Result<(), anyhow::Error> {
        let tmp = tmp_path("dbjson_unwritable");
        tokio::fs::write(&tmp, "[1]").await?;
        let store = JsonCollection::<Unwritable>::new(&tmp, DbJsonOptions::default()).await?;

        assert_eq!(store.get().await?, vec![Unwritable(1)]);
        assert!(matches!(store.set(vec![Unwritable(2)]).await, Err(WriteError::Serialize(_))));
        assert_eq!(std::fs::read_to_string(&tmp)?, "[1]");

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn derived_ops_surface_write_errors_after_a_good_read() -> Result<(), anyhow::Error> {
        let tmp = tmp_path("dbjson_derived_write");
        tokio::fs::write(&tmp, "[1]").await?;
        let store = JsonCollection::<Unwritable>::new(&tmp, DbJsonOptions::default()).await?;

        assert!(store.add(Unwritable(2)).await.unwrap_err().is_write());
        assert!(store.replace(Unwritable(9), |_, _| true).await.unwrap_err().is_write());
        assert!(store.delete(|_, _| false).await.unwrap_err().is_write());
        assert_eq!(std::fs::read_to_string(&tmp)?, "[1]");

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn directory_removed_between_read_and_write_is_a_write_error() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("dbjson_gone_{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await?;
        let tmp = dir.join("records.json");
        tokio::fs::write(&tmp, "[1, 2]").await?;
        let store = JsonCollection::<i32>::new(&tmp, DbJsonOptions::default()).await?;

        // predicates run after the read and before the write
        let err = store
            .delete(|_, i| {
                if i == 0 {
                    let _ = std::fs::remove_dir_all(&dir);
                }
                false
            })
            .await
            .unwrap_err();
        assert!(err.is_write());
        assert!(!err.is_read());
        assert!(matches!(err, StoreError::Write(WriteError::Io { .. })));
        Ok(())
    }
}
