//! Lead records and batch parsing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable example of the expected upload schema, served by the template
/// endpoint. Column order matches what the parser expects by header name.
pub const SAMPLE_TEMPLATE_CSV: &str = "\
first_name,last_name,email,profile_url,company,title,location
Jane,Doe,jane.doe@example.com,https://www.linkedin.com/in/janedoe,Example Corp,VP of Engineering,\"Minneapolis, MN\"
John,Smith,,https://www.linkedin.com/in/johnsmith,Acme Inc,Head of Sales,
";

/// One raw submitted row, prior to validation. Optional columns that were
/// absent or blank are `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub profile_url: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
}

impl LeadRecord {
    /// Human-readable identifier used in outcomes and exports.
    pub fn identity(&self) -> String {
        let identity = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let identity = identity.trim().to_string();
        if identity.is_empty() {
            "(unnamed lead)".to_string()
        } else {
            identity
        }
    }
}

/// A record that passed validation. Fields are trimmed; blank optionals are
/// normalized to `None`.
#[derive(Debug, Clone)]
pub struct ValidatedLead {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub profile_url: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
}

impl ValidatedLead {
    pub fn identity(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// The generated per-lead artifact.
#[derive(Debug, Clone)]
pub struct GeneratedEmail {
    pub body: String,
}

// ============================================================================
// Batch parsing
// ============================================================================

#[derive(Debug, Error)]
pub enum BatchParseError {
    #[error("upload is not valid CSV: {0}")]
    Malformed(String),

    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
}

/// Case- and whitespace-insensitive header match ("First Name" == first_name).
fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace([' ', '-'], "_")
}

fn cell(row: &csv::StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|i| row.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse an uploaded CSV batch into lead records.
///
/// Required columns: `first_name`, `last_name`. Optional: `email`,
/// `profile_url`, `company`, `title`, `location`. Rows are returned as-is;
/// per-record validation happens in the pipeline so an invalid row still
/// produces an outcome.
pub fn parse_batch(bytes: &[u8]) -> Result<Vec<LeadRecord>, BatchParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| BatchParseError::Malformed(e.to_string()))?
        .iter()
        .map(normalize_header)
        .collect::<Vec<_>>();

    let column = |name: &str| headers.iter().position(|h| h == name);

    let first_name = column("first_name").ok_or(BatchParseError::MissingColumn("first_name"))?;
    let last_name = column("last_name").ok_or(BatchParseError::MissingColumn("last_name"))?;
    let email = column("email");
    let profile_url = column("profile_url");
    let company = column("company");
    let title = column("title");
    let location = column("location");

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| BatchParseError::Malformed(e.to_string()))?;
        records.push(LeadRecord {
            first_name: cell(&row, Some(first_name)).unwrap_or_default(),
            last_name: cell(&row, Some(last_name)).unwrap_or_default(),
            email: cell(&row, email),
            profile_url: cell(&row, profile_url),
            company: cell(&row, company),
            title: cell(&row, title),
            location: cell(&row, location),
        });
    }
    Ok(records)
}
