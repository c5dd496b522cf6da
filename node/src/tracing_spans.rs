//! [`tracing::Span`] constructors for arbiter node operations.
//!
//! Consistent span names and fields make it easy to follow one dispute
//! from its report to its tally across log lines.

use arbiter_types::{AccountAddress, VoteIndex};
use tracing::{info_span, Span};

/// Span covering validation of a conflict report and its immediate effects.
pub fn conflict_report_span(kind: &str, client: &AccountAddress) -> Span {
    info_span!("conflict_report", kind = %kind, client = %client)
}

/// Span covering a juror's commit or reveal.
pub fn juror_span(action: &str, index: VoteIndex, juror: &AccountAddress) -> Span {
    info_span!("juror", action = %action, vote_index = %index, juror = %juror)
}

/// Span covering a phase change or the close of a round.
pub fn round_span(action: &str, index: VoteIndex) -> Span {
    info_span!("round", action = %action, vote_index = %index)
}
