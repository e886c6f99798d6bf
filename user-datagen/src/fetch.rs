use std::cmp::min;

use serde::Deserialize;

use crate::error::GenError;
use crate::record::RawUser;

/// Most records the API will serve in a single request.
pub const MAX_BATCH_SIZE: usize = 5000;

const API_URL: &str = "https://randomuser.me/api/";
const NATIONALITY: &str = "us";
/// Payload sections the pipeline never reads; excluded server-side to keep
/// responses small.
const EXCLUDED_FIELDS: &str = "gender,login,registered,cell";

/// A supplier of raw user records for the driver loop.
pub trait UserSource {
    /// Fetch `count` raw records.
    ///
    /// # Errors
    /// Errors when the records cannot be retrieved or decoded.
    fn fetch_users(&mut self, count: usize) -> Result<Vec<RawUser>, GenError>;
}

/// How many records to request next: twice the remaining need, capped at
/// [`MAX_BATCH_SIZE`]. Zero once the target is met; callers must not issue
/// a request for zero records.
#[must_use]
pub fn batch_size(target: usize, current_count: usize) -> usize {
    min(
        MAX_BATCH_SIZE,
        target.saturating_sub(current_count).saturating_mul(2),
    )
}

#[derive(Debug, Deserialize)]
struct UserDataPage {
    results: Vec<RawUser>,
}

/// Blocking client for the `randomuser.me` API. No request timeout is
/// configured; a hung request blocks the run.
pub struct RandomUserClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl RandomUserClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(API_URL.to_owned())
    }

    /// Point the client at an alternate endpoint serving the same shape.
    #[must_use]
    pub fn with_base_url(base_url: String) -> Self {
        RandomUserClient {
            client: reqwest::blocking::Client::new(),
            base_url,
        }
    }
}

impl Default for RandomUserClient {
    fn default() -> Self {
        Self::new()
    }
}

impl UserSource for RandomUserClient {
    fn fetch_users(&mut self, count: usize) -> Result<Vec<RawUser>, GenError> {
        let results = count.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("nat", NATIONALITY),
                ("exc", EXCLUDED_FIELDS),
                ("noinfo", ""),
                ("results", results.as_str()),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenError::ApiError { status, body });
        }

        let page: UserDataPage = response.json()?;
        Ok(page.results)
    }
}
