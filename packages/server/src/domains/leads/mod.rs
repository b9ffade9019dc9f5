//! Leads domain: batch parsing, validation, personalization, and export.

pub mod assemble;
pub mod models;
pub mod personalize;
pub mod validate;

pub use assemble::{assemble, Summary};
pub use models::{
    parse_batch, BatchParseError, GeneratedEmail, LeadRecord, ValidatedLead, SAMPLE_TEMPLATE_CSV,
};
pub use personalize::{generate, GenerationError};
pub use validate::validate;
