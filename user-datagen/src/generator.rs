use std::fs::{File, OpenOptions};
use std::path::Path;
use std::thread;
use std::time::Duration;

use csv::WriterBuilder;
use log::{info, warn};
use rand::Rng;

use crate::error::GenError;
use crate::fetch::{self, UserSource};
use crate::record::{RawUser, UserRecord};
use crate::seen::SeenSet;

/// Drives the fetch, transform, deduplicate, write cycle until the output
/// file holds the target number of unique records.
#[derive(Debug)]
pub struct Generator {
    seen: SeenSet,
    target: usize,
    header_needed: bool,
}

impl Generator {
    /// Seed the generator from any records already on disk, so a rerun
    /// continues where the previous run left off.
    ///
    /// # Errors
    /// Errors when an existing output file cannot be read.
    pub fn load(path: &Path, target: usize) -> Result<Self, GenError> {
        let seen = SeenSet::load(path)?;
        let header_needed = seen.is_empty();
        Ok(Generator {
            seen,
            target,
            header_needed,
        })
    }

    /// Unique records known so far, on disk and accepted this run.
    #[must_use]
    pub fn count(&self) -> usize {
        self.seen.count()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.seen.count() >= self.target
    }

    #[must_use]
    pub fn target(&self) -> usize {
        self.target
    }

    /// Transform a fetched batch into output rows, dropping any record
    /// whose email or SSN is already known. Accepted identifiers join the
    /// seen-sets immediately, so a duplicate later in the same batch is
    /// also dropped. Stops early once the target count is reached.
    ///
    /// # Errors
    /// Errors when a record carries an unmapped state name or a malformed
    /// date of birth.
    pub fn accept_batch(
        &mut self,
        raw_users: Vec<RawUser>,
        rng: &mut impl Rng,
    ) -> Result<Vec<UserRecord>, GenError> {
        let mut accepted = Vec::new();
        for raw in raw_users {
            if self.is_done() {
                break;
            }

            let email = raw.email.clone();
            let ssn = raw.id.value.clone();
            if self.seen.contains(&email, &ssn) {
                warn!("Duplicate email address or SSN found: {email} or {ssn}");
                continue;
            }

            let record = UserRecord::from_raw(raw, rng)?;
            self.seen.insert(email, ssn);
            accepted.push(record);
        }

        Ok(accepted)
    }

    /// Repeat fetch, transform, write with a fixed sleep between batches
    /// until the target count is reached. The final iteration skips the
    /// trailing sleep. Any failure ends the run; rows already written stay
    /// on disk and are picked up by the next [`Generator::load`].
    ///
    /// # Errors
    /// Errors when a fetch fails, a record cannot be transformed, or the
    /// output file cannot be written.
    pub fn run<S: UserSource>(
        &mut self,
        source: &mut S,
        path: &Path,
        sleep: Duration,
    ) -> Result<(), GenError> {
        let mut rng = rand::thread_rng();
        while !self.is_done() {
            let to_fetch = fetch::batch_size(self.target, self.count());
            info!("Retrieving {to_fetch} records...");
            let raw_users = source.fetch_users(to_fetch)?;
            info!("Received {} users", raw_users.len());

            let accepted = self.accept_batch(raw_users, &mut rng)?;
            if !accepted.is_empty() {
                info!("Storing {} records...", accepted.len());
                write_records(path, &accepted, self.header_needed)?;
                self.header_needed = false;
            }
            info!("Total records so far: {}", self.count());

            if self.is_done() {
                break;
            }
            info!(
                "Sleeping for {} seconds before fetching more...",
                sleep.as_secs()
            );
            thread::sleep(sleep);
        }

        Ok(())
    }
}

/// Write a non-empty list of rows to the output file: truncate and emit the
/// header when `write_header` is set, append bare rows otherwise.
///
/// # Errors
/// Errors when the file cannot be opened or a row cannot be serialized.
pub fn write_records(
    path: &Path,
    records: &[UserRecord],
    write_header: bool,
) -> Result<(), GenError> {
    let file = if write_header {
        File::create(path)?
    } else {
        OpenOptions::new().create(true).append(true).open(path)?
    };

    let mut writer = WriterBuilder::new()
        .has_headers(write_header)
        .from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}
