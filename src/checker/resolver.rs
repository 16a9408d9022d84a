use crate::Match;

/// Reduce candidates to a non-overlapping set ordered by position.
///
/// Each candidate is compared against the first accepted match it overlaps
/// and only that one. A candidate overlapping two accepted matches can
/// therefore displace the first while still intersecting the second.
pub fn resolve_overlaps(mut candidates: Vec<Match>) -> Vec<Match> {
    candidates.sort_by(|a, b| {
        a.start_index
            .cmp(&b.start_index)
            .then_with(|| b.priority.cmp(&a.priority))
    });

    let mut accepted: Vec<Match> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match accepted.iter().position(|m| overlaps(&candidate, m)) {
            None => accepted.push(candidate),
            Some(idx) => {
                if supersedes(&candidate, &accepted[idx]) {
                    accepted[idx] = candidate;
                }
            }
        }
    }

    accepted.sort_by_key(|m| m.start_index);
    accepted
}

fn overlaps(a: &Match, b: &Match) -> bool {
    (a.start_index >= b.start_index && a.start_index < b.end_index)
        || (a.end_index > b.start_index && a.end_index <= b.end_index)
        || (a.start_index <= b.start_index && a.end_index >= b.end_index)
}

fn supersedes(candidate: &Match, current: &Match) -> bool {
    candidate.priority > current.priority
        || (candidate.priority == current.priority && candidate.len() > current.len())
}
