//! The client's `logs/HEAD`: an append-only text log of ref updates, read in
//! reverse by `anchor reflog`. Line format matches the original byte for
//! byte: `"{old} {new} {timestamp}\t{message}\n"`.

use std::fs::OpenOptions;
use std::io::Write;

use anyhow::{Context, Result};
use camino::Utf8Path;

#[derive(Debug, Clone)]
pub struct ReflogEntry {
    pub old: String,
    pub new: String,
    pub timestamp: String,
    pub message: String,
}

pub fn append(path: &Utf8Path, old: &str, new: &str, message: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let timestamp = chrono::Utc::now().to_rfc3339();
    let line = format!("{old} {new} {timestamp}\t{message}\n");

    let mut fh = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("Couldn't open {path}"))?;
    fh.write_all(line.as_bytes())?;
    Ok(())
}

/// Returns entries newest-first.
pub fn read_reversed(path: &Utf8Path) -> Result<Vec<ReflogEntry>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("Couldn't read {path}")),
    };

    let mut entries = Vec::new();
    for line in contents.lines() {
        let Some((header, message)) = line.split_once('\t') else {
            continue;
        };
        let mut parts = header.splitn(3, ' ');
        let (Some(old), Some(new), Some(timestamp)) = (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        entries.push(ReflogEntry {
            old: old.to_string(),
            new: new.to_string(),
            timestamp: timestamp.to_string(),
            message: message.to_string(),
        });
    }
    entries.reverse();
    Ok(entries)
}

#[cfg(test)]
mod test {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn appends_and_reads_reversed() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("logs/HEAD")).unwrap();

        append(&path, "", "s_1", "first").unwrap();
        append(&path, "s_1", "s_2", "second").unwrap();

        let entries = read_reversed(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "second");
        assert_eq!(entries[1].message, "first");
    }
}
