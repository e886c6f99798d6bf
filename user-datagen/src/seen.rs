use std::collections::HashSet;
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::GenError;
use crate::record::UserRecord;

/// The unique email addresses and SSNs already present in the output file.
/// Loaded once at startup and grown as records are accepted; never shrinks
/// within a run.
#[derive(Debug, Default)]
pub struct SeenSet {
    emails: HashSet<String>,
    ssns: HashSet<String>,
}

impl SeenSet {
    /// Seed the sets from an existing output file. A missing file yields
    /// empty sets; a file holding nothing beyond the header yields empty
    /// sets as well.
    ///
    /// # Errors
    /// Errors when the file exists but cannot be read as delimited
    /// [`UserRecord`] rows.
    pub fn load(path: &Path) -> Result<Self, GenError> {
        let mut seen = SeenSet::default();
        if !path.exists() {
            return Ok(seen);
        }

        let mut reader = ReaderBuilder::new().from_path(path)?;
        for result in reader.deserialize::<UserRecord>() {
            let record = result?;
            seen.insert(record.email, record.ssn);
        }

        Ok(seen)
    }

    /// Whether either identifying field has been seen before.
    #[must_use]
    pub fn contains(&self, email: &str, ssn: &str) -> bool {
        self.emails.contains(email) || self.ssns.contains(ssn)
    }

    pub fn insert(&mut self, email: String, ssn: String) {
        self.emails.insert(email);
        self.ssns.insert(ssn);
    }

    /// Number of unique email addresses seen so far; this is the record
    /// count the driver loop measures progress by.
    #[must_use]
    pub fn count(&self) -> usize {
        self.emails.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}
