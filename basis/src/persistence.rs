use crate::{
    error::PersistenceError,
    strategy::context::{CONTEXT_SCHEMA_VERSION, TaskContext, TaskId},
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Durable storage for [`TaskContext`] records, keyed by [`TaskId`].
///
/// Context persistence is a happens-before barrier: a state transition is observable to
/// other processes only after its snapshot is durable.
#[async_trait]
pub trait ContextRepository
where
    Self: std::fmt::Debug + Send + Sync,
{
    /// Durably persist the provided snapshot, replacing any previous record.
    async fn persist(&self, context: &TaskContext) -> Result<(), PersistenceError>;

    /// Load the record associated with the provided [`TaskId`], if present.
    async fn load(&self, task_id: &TaskId) -> Result<Option<TaskContext>, PersistenceError>;

    /// Load every persisted record, skipping undecodable ones with a warning.
    async fn load_all(&self) -> Result<Vec<TaskContext>, PersistenceError>;

    /// Remove the record associated with the provided [`TaskId`].
    async fn remove(&self, task_id: &TaskId) -> Result<(), PersistenceError>;
}

/// [`ContextRepository`] storing one JSON record per task under a state directory.
///
/// Writes go to a temporary file followed by an atomic rename, so a crash mid-write can
/// never corrupt the previous durable snapshot.
#[derive(Debug, Clone)]
pub struct FileContextRepository {
    dir: PathBuf,
}

impl FileContextRepository {
    pub fn new<P>(dir: P) -> Result<Self, PersistenceError>
    where
        P: Into<PathBuf>,
    {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn record_path(&self, task_id: &TaskId) -> PathBuf {
        self.dir.join(format!("{task_id}.json"))
    }

    fn decode(path: &Path, raw: &[u8]) -> Result<TaskContext, PersistenceError> {
        let context: TaskContext = serde_json::from_slice(raw)?;

        if context.schema_version != CONTEXT_SCHEMA_VERSION {
            warn!(
                path = %path.display(),
                found = context.schema_version,
                expected = CONTEXT_SCHEMA_VERSION,
                "persisted TaskContext has unsupported schema version"
            );
            return Err(PersistenceError::UnsupportedSchema(context.schema_version));
        }

        Ok(context)
    }
}

#[async_trait]
impl ContextRepository for FileContextRepository {
    async fn persist(&self, context: &TaskContext) -> Result<(), PersistenceError> {
        let path = self.record_path(&context.task_id);
        let tmp_path = path.with_extension("json.tmp");

        let encoded = serde_json::to_vec_pretty(context)?;
        tokio::fs::write(&tmp_path, &encoded).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        debug!(task_id = %context.task_id, state = context.state.name(), "persisted TaskContext");
        Ok(())
    }

    async fn load(&self, task_id: &TaskId) -> Result<Option<TaskContext>, PersistenceError> {
        let path = self.record_path(task_id);

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(PersistenceError::Io(error)),
        };

        Self::decode(&path, &raw).map(Some)
    }

    async fn load_all(&self) -> Result<Vec<TaskContext>, PersistenceError> {
        let mut contexts = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|extension| extension.to_str()) != Some("json") {
                continue;
            }

            let raw = tokio::fs::read(&path).await?;
            match Self::decode(&path, &raw) {
                Ok(context) => contexts.push(context),
                Err(error) => {
                    warn!(path = %path.display(), ?error, "skipping undecodable TaskContext record");
                }
            }
        }

        Ok(contexts)
    }

    async fn remove(&self, task_id: &TaskId) -> Result<(), PersistenceError> {
        match tokio::fs::remove_file(self.record_path(task_id)).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(PersistenceError::Io(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::context::TaskState;
    use basis_instrument::{
        exchange::ExchangeId, instrument::kind::MarketDataInstrumentKind,
    };

    fn context() -> TaskContext {
        TaskContext::new(
            "spot_futures_arbitrage",
            ("btc", "usdt", MarketDataInstrumentKind::Spot).into(),
            ExchangeId::MexcSpot,
            ExchangeId::GateioPerpetualsUsd,
        )
    }

    fn temp_repository(name: &str) -> FileContextRepository {
        let dir = std::env::temp_dir().join(format!("basis-persistence-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        FileContextRepository::new(dir).unwrap()
    }

    #[tokio::test]
    async fn test_persist_load_round_trip() {
        let repository = temp_repository("round-trip");
        let context = context().transition(TaskState::Monitoring);

        repository.persist(&context).await.unwrap();
        let loaded = repository.load(&context.task_id).await.unwrap().unwrap();

        assert_eq!(loaded, context);
    }

    #[tokio::test]
    async fn test_persist_replaces_previous_snapshot() {
        let repository = temp_repository("replace");
        let first = context().transition(TaskState::Monitoring);
        let second = first.transition(TaskState::Exiting);

        repository.persist(&first).await.unwrap();
        repository.persist(&second).await.unwrap();

        let loaded = repository.load(&second.task_id).await.unwrap().unwrap();
        assert_eq!(loaded.state, TaskState::Exiting);
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let repository = temp_repository("missing");
        assert!(repository.load(&context().task_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_all_and_remove() {
        let repository = temp_repository("load-all");
        let context = context();

        repository.persist(&context).await.unwrap();
        assert_eq!(repository.load_all().await.unwrap().len(), 1);

        repository.remove(&context.task_id).await.unwrap();
        assert!(repository.load_all().await.unwrap().is_empty());

        // Removing a missing record is not an error
        repository.remove(&context.task_id).await.unwrap();
    }
}
