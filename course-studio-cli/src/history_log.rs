use crate::state::ChatEntry;
use anyhow::Result;
use chrono::Local;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Appends every chat entry of the session to a JSON Lines file.
pub struct HistoryLogger {
    log_file: Option<PathBuf>,
}

impl HistoryLogger {
    pub fn new(log_dir: &Path) -> Result<Self> {
        if !log_dir.exists() {
            fs::create_dir_all(log_dir)?;
        }

        let filename = format!("session_{}.jsonl", Local::now().format("%Y%m%d_%H%M%S"));
        let log_file = log_dir.join(filename);

        debug!("Starting history log: {:?}", log_file);

        Ok(Self {
            log_file: Some(log_file),
        })
    }

    pub fn disabled() -> Self {
        Self { log_file: None }
    }

    pub fn log_entry(&self, entry: &ChatEntry) -> Result<()> {
        if let Some(ref log_file) = self.log_file {
            let json = serde_json::to_string(entry)?;

            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)?;

            writeln!(file, "{}", json)?;
            file.flush()?;
        }
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ResponsePayload;
    use course_studio_shared::Operation;
    use serde_json::Value;

    fn entry(seq: u64, operation: Operation, doubt: Option<&str>) -> ChatEntry {
        ChatEntry {
            seq,
            operation,
            user_input: "Intro to Graphs".into(),
            response: ResponsePayload::request_failed(),
            doubt: doubt.map(str::to_string),
            user_answer: None,
            completed_at: Local::now(),
        }
    }

    #[test]
    fn appends_one_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let logger = HistoryLogger::new(&dir.path().join("logs")).unwrap();
        logger.log_entry(&entry(1, Operation::GenerateCourse, None)).unwrap();
        logger
            .log_entry(&entry(2, Operation::ClarifyDoubt, Some("why?")))
            .unwrap();

        let path = logger.path().unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("session_"));
        let lines: Vec<Value> = fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["operation"], "Generate Course");
        assert!(lines[0].get("doubt").is_none());
        assert_eq!(lines[1]["doubt"], "why?");
        assert_eq!(lines[1]["response"]["kind"], "generic");
    }

    #[test]
    fn disabled_logger_writes_nothing() {
        let logger = HistoryLogger::disabled();
        assert!(logger.path().is_none());
        logger.log_entry(&entry(1, Operation::GenerateMcq, None)).unwrap();
    }
}
