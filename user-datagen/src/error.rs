use std::io;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenError {
    #[error("CSV Error")]
    CsvError(#[from] csv::Error),
    #[error("I/O Error")]
    IoError(#[from] io::Error),
    #[error("HTTP Error")]
    HttpError(#[from] reqwest::Error),
    #[error("{body} ({status})")]
    ApiError { status: StatusCode, body: String },
    #[error("Unknown state name: {0}")]
    UnknownState(String),
    #[error("Malformed date of birth")]
    DateError(#[from] chrono::format::ParseError),
}
