use std::{
    fmt, io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::AnnotationRecord;

/// Where an annotation was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    pub session_id: String,
    pub level: u32,
    pub category: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::IsVariant)]
pub enum StoreError {
    #[display("failed to write annotation record")]
    Io { source: io::Error },
    #[display("annotation record rejected: {reason}")]
    Rejected { reason: String },
}

impl From<io::Error> for StoreError {
    fn from(source: io::Error) -> Self {
        Self::Io { source }
    }
}

/// Sink for annotation records.
///
/// Called once per successful `annotate`, after the level state has been
/// updated. Errors are logged by the caller and never undo the annotation.
pub trait AnnotationStore: fmt::Debug {
    fn record(
        &mut self,
        record: &AnnotationRecord,
        context: &SessionContext,
    ) -> Result<(), StoreError>;
}

type Entries = Vec<(AnnotationRecord, SessionContext)>;

/// Store that keeps records in memory.
///
/// Clones share the same records, so a clone handed to a
/// [`GameController`](crate::GameController) can be inspected afterwards.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<Mutex<Entries>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records written so far, oldest first.
    #[must_use]
    pub fn entries(&self) -> Entries {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AnnotationStore for MemoryStore {
    fn record(
        &mut self,
        record: &AnnotationRecord,
        context: &SessionContext,
    ) -> Result<(), StoreError> {
        self.lock().push((record.clone(), context.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;
    use crate::core::{Annotation, ImageId};

    #[test]
    fn test_memory_store_keeps_records_in_order() {
        let mut store = MemoryStore::new();
        let context = SessionContext {
            session_id: "s".to_owned(),
            level: 1,
            category: "wally".to_owned(),
            recorded_at: Utc::now(),
        };
        let mut record = AnnotationRecord::new(ImageId::training(3), "a.png".into(), false);
        record.annotate(Annotation::Rejected);
        store.record(&record, &context).unwrap();
        record.annotate(Annotation::Rejected);
        store.record(&record, &context).unwrap();

        let entries = store.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0.image_id().as_str(), "image-3");
        assert_eq!(entries[1].1.level, 1);
    }

    #[test]
    fn test_clones_share_records() {
        let store = MemoryStore::new();
        let mut writer = store.clone();
        let context = SessionContext {
            session_id: "s".to_owned(),
            level: 2,
            category: "advanced_wally".to_owned(),
            recorded_at: Utc::now(),
        };
        let mut record = AnnotationRecord::new(ImageId::training(0), "b.png".into(), true);
        record.annotate(Annotation::Rejected);
        writer.record(&record, &context).unwrap();

        let entries = store.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1, context);
        assert_eq!(writer.entries(), entries);
    }

    #[test]
    fn test_io_error_is_the_source() {
        let err = StoreError::from(io::Error::other("disk full"));
        assert!(err.is_io());
        assert_eq!(err.to_string(), "failed to write annotation record");
        assert_eq!(err.source().unwrap().to_string(), "disk full");
    }
}
