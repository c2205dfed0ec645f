//! Error types for workbook extraction and geocoding.

use thiserror::Error;

/// A sheet that offers neither coordinate source. The sheet is skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("sheet '{sheet}' must contain the columns 'Longitude', 'Latitude' or 'Ville'")]
pub struct SheetValidationError {
    pub sheet: String,
}

/// A failed lookup attempt. Every variant is treated as transient by the resolver.
#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoding service answered {status}")]
    Status { status: u16 },

    #[error("malformed geocoding response: {reason}")]
    Decode { reason: String },
}
