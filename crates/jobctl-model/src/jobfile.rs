//! Batch descriptor files.
//!
//! One JSON-encoded [`JobDescriptor`] per line. Blank lines and lines starting with `#` are
//! ignored. A bad line never poisons the rest of the file: it is reported in
//! [`JobFile::rejected`] and parsing continues.
//!
//! ```text
//! # nightly batch
//! {"id":"fetch","command":"git","args":["fetch","--all"],"cwd":"/srv/repo"}
//! {"id":"report","command":"sh","args":["-c","./report.sh"],"timeoutMs":60000}
//! ```

use std::{fs, io, path::Path};

use crate::JobDescriptor;

/// Outcome of parsing a job file.
#[derive(Debug, Default)]
pub struct JobFile {
    pub descriptors: Vec<JobDescriptor>,
    pub rejected: Vec<Rejected>,
}

/// A line that was skipped, with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub line: usize,
    pub reason: String,
}

pub fn parse(text: &str) -> JobFile {
    let mut out = JobFile::default();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parsed = serde_json::from_str::<JobDescriptor>(line)
            .map_err(|e| e.to_string())
            .and_then(|d| d.validate().map(|_| d).map_err(|e| e.to_string()));

        match parsed {
            Ok(d) => out.descriptors.push(d),
            Err(reason) => out.rejected.push(Rejected {
                line: idx + 1,
                reason,
            }),
        }
    }
    out
}

pub fn load(path: impl AsRef<Path>) -> io::Result<JobFile> {
    let text = fs::read_to_string(path)?;
    Ok(parse(&text))
}
