//! Job context input and failure reporting for ingestion jobs

use crate::constants::{CONTEXT_FILE, ERROR_FILE, TRACEBACK_FILE};
use crate::types::SarResult;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Parameters handed to a job through `_context.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobContext {
    #[serde(default)]
    pub slc_path: Option<String>,
}

impl JobContext {
    /// Load `_context.json` from `dir`; a missing file gives an empty context
    pub fn load<P: AsRef<Path>>(dir: P) -> SarResult<Self> {
        let path = dir.as_ref().join(CONTEXT_FILE);
        if !path.exists() {
            log::debug!("No {} in {}", CONTEXT_FILE, dir.as_ref().display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn append(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", text)
}

/// Append a failure to `_alt_error.txt` and its cause chain to `_alt_traceback.txt`
pub fn write_failure_report<P: AsRef<Path>>(dir: P, error: &anyhow::Error) -> SarResult<()> {
    let dir = dir.as_ref();
    append(&dir.join(ERROR_FILE), &error.to_string())?;
    append(&dir.join(TRACEBACK_FILE), &format!("{:?}", error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_context() {
        let dir = tempfile::tempdir().unwrap();
        assert!(JobContext::load(dir.path()).unwrap().slc_path.is_none());

        fs::write(dir.path().join(CONTEXT_FILE), r#"{"slc_path": "/data/data/", "job_id": 7}"#).unwrap();
        let ctx = JobContext::load(dir.path()).unwrap();
        assert_eq!(ctx.slc_path.as_deref(), Some("/data/data/"));

        fs::write(dir.path().join(CONTEXT_FILE), "{").unwrap();
        assert!(JobContext::load(dir.path()).is_err());
    }

    #[test]
    fn test_failure_report_appends() {
        let dir = tempfile::tempdir().unwrap();
        let first = anyhow::anyhow!("first failure");
        let second = anyhow::anyhow!("root cause").context("second failure");

        write_failure_report(dir.path(), &first).unwrap();
        write_failure_report(dir.path(), &second).unwrap();

        let errors = fs::read_to_string(dir.path().join(ERROR_FILE)).unwrap();
        assert_eq!(errors, "first failure\nsecond failure\n");

        let traceback = fs::read_to_string(dir.path().join(TRACEBACK_FILE)).unwrap();
        assert!(traceback.contains("root cause"));
    }
}
