use chrono::NaiveDateTime;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::GenError;
use crate::states;

/// Date of birth format used by the `randomuser.me` API.
pub const DOB_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
/// Date of birth format written to the output file.
pub const DOB_OUTPUT_FORMAT: &str = "%m/%d/%Y";
/// Probability that an accepted record has its phone number nulled out,
/// simulating missing data.
pub const PHONE_NULL_PROBABILITY: f64 = 0.4;

/// A single user object from the API's `results` array, limited to the
/// fields the pipeline consumes. Anything missing is a decode error.
#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    pub name: RawName,
    pub location: RawLocation,
    pub phone: String,
    pub email: String,
    pub dob: RawDob,
    pub id: RawId,
    pub picture: RawPicture,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawName {
    pub first: String,
    pub last: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLocation {
    pub street: RawStreet,
    pub city: String,
    pub state: String,
    #[serde(deserialize_with = "postcode_string")]
    pub postcode: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStreet {
    pub number: u32,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDob {
    /// ISO-8601 with milliseconds, e.g. `1968-06-18T10:04:59.261Z`
    pub date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawId {
    /// The SSN for `nat=us` records
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPicture {
    pub large: String,
}

/// The API serves US postcodes as JSON numbers but uses strings for other
/// nationalities; accept both.
fn postcode_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Postcode {
        Text(String),
        Number(u64),
    }

    Ok(match Postcode::deserialize(deserializer)? {
        Postcode::Text(text) => text,
        Postcode::Number(number) => number.to_string(),
    })
}

/// One flat row of the output file. Field order here is the column order
/// written to disk; serde renames pin the `camelCase` header names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub phone: Option<String>,
    pub email: String,
    pub dob: String,
    pub ssn: String,
    pub picture: String,
}

impl UserRecord {
    /// Flatten a raw API record into an output row: street number and name
    /// are joined into one address line, the state name is abbreviated, the
    /// date of birth is reformatted, and the phone is randomly nulled.
    ///
    /// # Errors
    /// Errors when the state name has no known abbreviation or the date of
    /// birth does not match [`DOB_INPUT_FORMAT`].
    pub fn from_raw(raw: RawUser, rng: &mut impl Rng) -> Result<Self, GenError> {
        let state = states::abbreviation(&raw.location.state)
            .ok_or_else(|| GenError::UnknownState(raw.location.state.clone()))?;
        let dob = NaiveDateTime::parse_from_str(&raw.dob.date, DOB_INPUT_FORMAT)?
            .format(DOB_OUTPUT_FORMAT)
            .to_string();
        let phone = if rng.gen::<f64>() > PHONE_NULL_PROBABILITY {
            Some(raw.phone)
        } else {
            None
        };

        Ok(UserRecord {
            first_name: raw.name.first,
            last_name: raw.name.last,
            address: format!("{} {}", raw.location.street.number, raw.location.street.name),
            city: raw.location.city,
            state: state.to_owned(),
            zipcode: raw.location.postcode,
            phone,
            email: raw.email,
            dob,
            ssn: raw.id.value,
            picture: raw.picture.large,
        })
    }
}
