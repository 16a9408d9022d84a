use crate::Match;
use tracing::warn;

/// Splice every match's correction into `text`.
///
/// Matches are applied rightmost first so earlier offsets stay valid. The
/// input must be non-overlapping, as produced by the overlap resolver.
/// A match whose span is out of range or splits a character is skipped.
pub fn apply_corrections(text: &str, matches: &[Match]) -> String {
    let mut ordered: Vec<&Match> = matches.iter().collect();
    ordered.sort_by(|a, b| b.start_index.cmp(&a.start_index));

    let mut corrected = text.to_string();
    for m in ordered {
        let span = m.start_index..m.end_index;
        if corrected.get(span.clone()).is_none() {
            warn!(
                rule = %m.rule_id,
                start = m.start_index,
                end = m.end_index,
                "skipping correction with invalid span"
            );
            continue;
        }
        corrected.replace_range(span, &m.corrected);
    }

    corrected
}
