//! Pattern file encoding and tolerant decoding.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use popguard_protocols::{Pattern, PersistenceError};

/// Why one record of a pattern file was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodeDiagnostic {
    /// Position of the record in the file.
    pub index: usize,
    /// Record id, when one could be read.
    pub id: Option<String>,
    pub reason: String,
}

/// Outcome of loading a pattern file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub diagnostics: Vec<DecodeDiagnostic>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Decode a pattern file body record by record.
///
/// A body that is not a JSON array fails as a whole. Inside the array, a
/// record that does not decode, or decodes to an empty id, is reported and
/// skipped without affecting its neighbours.
pub(crate) fn decode_patterns(
    content: &str,
) -> Result<(Vec<Pattern>, Vec<DecodeDiagnostic>), PersistenceError> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let records = match value {
        serde_json::Value::Array(records) => records,
        other => {
            return Err(PersistenceError::InvalidFormat(format!(
                "expected a JSON array of patterns, found {}",
                json_kind(&other)
            )));
        }
    };

    let mut patterns = Vec::with_capacity(records.len());
    let mut diagnostics = Vec::new();

    for (index, record) in records.into_iter().enumerate() {
        let id = record
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        match decode_record(record) {
            Ok(pattern) => patterns.push(pattern),
            Err(reason) => {
                warn!("Skipping pattern record #{} ({:?}): {}", index, id, reason);
                diagnostics.push(DecodeDiagnostic { index, id, reason });
            }
        }
    }

    Ok((patterns, diagnostics))
}

/// Decode and normalize one pattern record.
pub(crate) fn decode_record(record: serde_json::Value) -> Result<Pattern, String> {
    let mut pattern: Pattern = serde_json::from_value(record).map_err(|e| e.to_string())?;
    pattern.normalize();
    if pattern.id.is_empty() {
        return Err("pattern id is empty".to_string());
    }
    Ok(pattern)
}

pub(crate) fn encode_patterns(patterns: &[Arc<Pattern>]) -> Result<String, PersistenceError> {
    let records: Vec<&Pattern> = patterns.iter().map(|p| p.as_ref()).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Read a whole file. A missing file yields `None`.
pub(crate) async fn read_file(path: &Path) -> Result<Option<String>, PersistenceError> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("File {} does not exist", path.display());
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Write `content` next to `path` and rename it into place.
///
/// Each call writes its own temporary file, so concurrent writers never
/// rename over each other's half-written content.
pub(crate) async fn write_atomic(path: &Path, content: &str) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".{}.tmp", Uuid::new_v4().simple()));
    let tmp = std::path::PathBuf::from(tmp);

    fs::write(&tmp, content).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use popguard_protocols::InterruptionType;

    #[test]
    fn test_decode_skips_bad_records() {
        let content = r#"[
            {"id": "ok", "type": "cookie"},
            {"id": "bad_type", "type": "banner"},
            {"type": "ad"},
            42,
            {"id": "ok2"}
        ]"#;
        let (patterns, diagnostics) = decode_patterns(content).unwrap();

        let ids: Vec<_> = patterns.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["ok", "ok2"]);
        assert_eq!(patterns[1].interruption_type, InterruptionType::Custom);

        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics[0].index, 1);
        assert_eq!(diagnostics[0].id.as_deref(), Some("bad_type"));
        assert_eq!(diagnostics[1].index, 2);
        assert!(diagnostics[1].reason.contains("empty"));
        assert_eq!(diagnostics[2].index, 3);
        assert!(diagnostics[2].id.is_none());
    }

    #[test]
    fn test_decode_rejects_non_array() {
        let result = decode_patterns(r#"{"patterns": []}"#);
        assert!(matches!(result, Err(PersistenceError::InvalidFormat(_))));
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        let result = decode_patterns("[{");
        assert!(matches!(result, Err(PersistenceError::Json(_))));
    }

    #[test]
    fn test_decode_record_normalizes_domains() {
        let record = serde_json::json!({"id": "p", "domains": ["Example.COM"]});
        let pattern = decode_record(record).unwrap();
        assert_eq!(pattern.domains, vec!["example.com"]);
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let content = read_file(&dir.path().join("missing.json")).await.unwrap();
        assert!(content.is_none());
    }

    #[tokio::test]
    async fn test_write_atomic_creates_parents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("patterns.json");

        write_atomic(&path, "[]").await.unwrap();

        assert_eq!(read_file(&path).await.unwrap().as_deref(), Some("[]"));
        assert_eq!(tmp_files(&dir.path().join("nested/deeper")), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_leave_one_whole_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("patterns.json");

        let mut writers = tokio::task::JoinSet::new();
        for i in 0..16 {
            let path = path.clone();
            writers.spawn(async move { write_atomic(&path, &format!("[{}]", i)).await });
        }
        while let Some(written) = writers.join_next().await {
            written.unwrap().unwrap();
        }

        let content = read_file(&path).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(tmp_files(dir.path()), 0);
    }

    fn tmp_files(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count()
    }
}
