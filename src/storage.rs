//! Small file helpers shared by the stores

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Append `line` plus a newline in a single write.
///
/// If the file does not end with a newline one is written first, so the new
/// line never merges with a hand-edited last line.
pub fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    ensure_parent(path)?;

    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;

    let mut buf = String::with_capacity(line.len() + 2);
    if file.metadata()?.len() > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            buf.push('\n');
        }
    }
    buf.push_str(line);
    buf.push('\n');

    file.write_all(buf.as_bytes())?;
    file.flush()
}

/// Replace the file at `path` with `contents` via a sibling temp file
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    ensure_parent(path)?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_creates_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("learned.txt");

        append_line(&path, "a|b").unwrap();
        append_line(&path, "c|d").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a|b\nc|d\n");
    }

    #[test]
    fn test_append_repairs_missing_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qa_dict.txt");
        std::fs::write(&path, "juros|interest").unwrap();

        append_line(&path, "taxa|rate").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "juros|interest\ntaxa|rate\n");
    }

    #[test]
    fn test_write_atomic_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");
        std::fs::write(&path, "old").unwrap();

        write_atomic(&path, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        assert!(!dir.path().join("counters.json.tmp").exists());
    }
}
