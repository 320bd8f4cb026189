//! Daily summary of the delivery backlog.

use std::collections::HashMap;

use crate::models::{Posting, SourceKind};
use crate::utils::truncate_chars;

/// Failure lines longer than this are cut in the summary.
pub const FAILURE_LINE_MAX: usize = 300;

/// Render the summary for the unsent backlog and the latest failure lines.
///
/// Backlog is counted per source inferred from the URL; the "Other" line
/// only appears when some URL matches no known source.
pub fn build_report(unsent: &[Posting], failures: &[String]) -> String {
    let mut counts: HashMap<SourceKind, usize> = HashMap::new();
    let mut other = 0usize;
    for posting in unsent {
        match SourceKind::infer(&posting.url) {
            Some(kind) => *counts.entry(kind).or_default() += 1,
            None => other += 1,
        }
    }

    let mut lines = vec![
        "Daily summary:".to_string(),
        format!("Unsent total: {}", unsent.len()),
    ];
    for kind in SourceKind::ALL {
        lines.push(format!(
            "{}: {}",
            kind.label(),
            counts.get(&kind).copied().unwrap_or(0)
        ));
    }
    if other > 0 {
        lines.push(format!("Other: {other}"));
    }

    if !failures.is_empty() {
        lines.push("\nLast failures:".to_string());
        lines.extend(
            failures
                .iter()
                .map(|line| truncate_chars(line.trim_end(), FAILURE_LINE_MAX)),
        );
    }

    lines.join("\n")
}
