//! Deterministic target selection for calls and imports.
//!
//! Candidates are ranked, then ordered by key. The lowest rank wins; if
//! several candidates share it the first by key is chosen and the tie is
//! reported so it can surface as a diagnostic.

/// Outcome of picking a link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    None,
    Unique(String),
    Ambiguous { chosen: String, candidates: Vec<String> },
}

impl Resolution {
    pub fn target(&self) -> Option<&str> {
        match self {
            Resolution::None => None,
            Resolution::Unique(key) | Resolution::Ambiguous { chosen: key, .. } => Some(key),
        }
    }
}

/// Pick the best candidate from `(rank, key)` pairs.
pub(crate) fn pick<R: Ord + Copy>(mut candidates: Vec<(R, String)>) -> Resolution {
    candidates.sort();
    candidates.dedup();
    let Some((best_rank, _)) = candidates.first().cloned() else {
        return Resolution::None;
    };

    let tied: Vec<String> = candidates
        .into_iter()
        .take_while(|(rank, _)| *rank == best_rank)
        .map(|(_, key)| key)
        .collect();

    if tied.len() == 1 {
        Resolution::Unique(tied.into_iter().next().unwrap_or_default())
    } else {
        Resolution::Ambiguous { chosen: tied[0].clone(), candidates: tied }
    }
}

/// Rank for an import target: files from the analysis being imported first,
/// then suffix matches before substring matches.
pub(crate) fn import_rank(in_analysis: bool, suffix_match: bool) -> (bool, bool) {
    (!in_analysis, !suffix_match)
}

/// Rank for a call target found outside the caller's file: functions from the
/// analysis being imported before those of other projects.
pub(crate) fn call_rank(in_analysis: bool) -> bool {
    !in_analysis
}
