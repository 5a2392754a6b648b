//! Two-file append used when the bot learns a new answer
//!
//! The audit log is written first, then the main store. If the main store
//! append fails the audit log is cut back to its previous length, so either
//! both lines are on disk or neither is.

use std::fs::OpenOptions;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{Error, Result, WriteStep};
use crate::storage::append_line;

/// Length of a file before the transaction touched it
#[derive(Debug, Clone, Copy)]
enum Mark {
    Missing,
    Len(u64),
}

/// Appends one line to the learned audit log and one to the main store
pub struct LearnTransaction<'a> {
    audit_log: &'a Path,
    main_store: &'a Path,
}

impl<'a> LearnTransaction<'a> {
    pub fn new(audit_log: &'a Path, main_store: &'a Path) -> Self {
        Self { audit_log, main_store }
    }

    /// Append `audit_line` and `store_line` (each without trailing newline)
    pub fn commit(&self, audit_line: &str, store_line: &str) -> Result<()> {
        let mark = mark(self.audit_log)
            .map_err(|e| Error::persistence(WriteStep::AuditLog, self.audit_log, e))?;

        if let Err(e) = append_line(self.audit_log, audit_line) {
            if let Err(rollback) = restore(self.audit_log, mark) {
                warn!("Could not restore {} after failed append: {}", self.audit_log.display(), rollback);
            }
            return Err(Error::persistence(WriteStep::AuditLog, self.audit_log, e));
        }

        if let Err(e) = append_line(self.main_store, store_line) {
            return match restore(self.audit_log, mark) {
                Ok(()) => {
                    debug!("Rolled back {} after main store failure", self.audit_log.display());
                    Err(Error::persistence(WriteStep::MainStore, self.main_store, e))
                }
                Err(rollback_error) => Err(Error::PartialLearn {
                    audit_log: self.audit_log.to_path_buf(),
                    main_store_error: e,
                    rollback_error,
                }),
            };
        }

        Ok(())
    }
}

fn mark(path: &Path) -> std::io::Result<Mark> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Mark::Len(meta.len())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Mark::Missing),
        Err(e) => Err(e),
    }
}

fn restore(path: &Path, mark: Mark) -> std::io::Result<()> {
    match mark {
        Mark::Missing => match std::fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        },
        Mark::Len(len) => OpenOptions::new().write(true).open(path)?.set_len(len),
    }
}
