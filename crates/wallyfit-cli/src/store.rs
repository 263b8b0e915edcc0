use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use serde::Serialize;
use wallyfit_engine::{
    Annotation, AnnotationRecord, AnnotationStore, GameSeed, ImageId, ImageSource, SessionContext,
    StoreError,
};

/// One line of a session file.
#[derive(Debug, Serialize)]
struct StoredAnnotation<'a> {
    recorded_at: DateTime<Utc>,
    session_id: &'a str,
    level: u32,
    category: &'a str,
    image_id: &'a ImageId,
    source: &'a ImageSource,
    has_object: bool,
    annotation: Option<&'a Annotation>,
    correct: Option<bool>,
}

/// Appends every annotation as one JSON object per line to
/// `<dir>/session-<seed>.jsonl`.
#[derive(Debug)]
pub(crate) struct JsonLinesStore {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonLinesStore {
    pub(crate) fn create(dir: &Path, seed: GameSeed) -> anyhow::Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create record directory: {}", dir.display()))?;
        let path = dir.join(format!("session-{seed}.jsonl"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open record file: {}", path.display()))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl AnnotationStore for JsonLinesStore {
    fn record(
        &mut self,
        record: &AnnotationRecord,
        context: &SessionContext,
    ) -> Result<(), StoreError> {
        let line = StoredAnnotation {
            recorded_at: context.recorded_at,
            session_id: &context.session_id,
            level: context.level,
            category: &context.category,
            image_id: record.image_id(),
            source: record.source(),
            has_object: record.has_object(),
            annotation: record.user_annotation(),
            correct: record.is_correct(),
        };
        serde_json::to_writer(&mut self.writer, &line).map_err(|e| StoreError::Rejected {
            reason: e.to_string(),
        })?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use wallyfit_engine::BoundingBox;

    use super::*;

    #[test]
    fn test_records_are_appended_as_json_lines() {
        let seed = GameSeed::from_bytes(*b"jsonl-store-test");
        let dir = env::temp_dir().join(format!("wallyfit-store-{}", std::process::id()));
        let mut store = JsonLinesStore::create(&dir, seed).unwrap();
        assert_eq!(
            store.path().file_name().unwrap().to_str().unwrap(),
            format!("session-{seed}.jsonl")
        );

        let context = SessionContext {
            session_id: seed.to_string(),
            level: 2,
            category: "advanced_wally".to_owned(),
            recorded_at: Utc::now(),
        };
        let mut record = AnnotationRecord::new(ImageId::training(4), "a.png".into(), true);
        record.annotate(Annotation::Boxed(
            BoundingBox::new(10.0, 20.0, 30.0, 40.0).unwrap(),
        ));
        store.record(&record, &context).unwrap();
        record.annotate(Annotation::Rejected);
        store.record(&record, &context).unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["level"], 2);
        assert_eq!(lines[0]["image_id"], "image-4");
        assert_eq!(lines[0]["correct"], true);
        assert_eq!(lines[1]["annotation"], "rejected");
        assert_eq!(lines[1]["correct"], false);

        fs::remove_dir_all(&dir).unwrap();
    }
}
