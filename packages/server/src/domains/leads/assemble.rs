//! Result assembly.
//!
//! Renders a job's accumulated outcomes into the exportable CSV and its
//! summary counts. Rows are ordered by original input index regardless of
//! completion order, so the same outcome set always yields the same bytes.

use anyhow::{Context, Result};

use crate::kernel::jobs::RecordOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub success_count: usize,
    pub error_count: usize,
}

/// Assemble the export CSV: header row plus one row per outcome, with the
/// generated email on success rows and the error message on failed rows.
pub fn assemble(outcomes: &[RecordOutcome]) -> Result<(Vec<u8>, Summary)> {
    let mut ordered: Vec<&RecordOutcome> = outcomes.iter().collect();
    ordered.sort_by_key(|o| o.index);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["identity", "personalized_email", "error"])
        .context("failed to write export header")?;

    let mut summary = Summary {
        success_count: 0,
        error_count: 0,
    };

    for outcome in ordered {
        if outcome.is_success() {
            summary.success_count += 1;
        } else {
            summary.error_count += 1;
        }
        writer
            .write_record([
                outcome.identity.as_str(),
                outcome.email().unwrap_or(""),
                outcome.error_message().unwrap_or(""),
            ])
            .context("failed to write export row")?;
    }

    let bytes = writer
        .into_inner()
        .context("failed to finish export artifact")?;
    Ok((bytes, summary))
}
