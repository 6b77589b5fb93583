//! Second-pass mapping from human-readable analyzer issues to the typed
//! signal taxonomy. The substring coupling is deliberate and isolated here so
//! every mapping rule can be unit-tested on its own.

use crate::core::types::{EvidenceKind, Signal, SignalKind};

/// Exhaustive substring -> kind -> score table. Entries are matched
/// case-insensitively and in order; the first hit wins, so more specific
/// substrings come before the generic ones they contain.
pub const ISSUE_MAPPINGS: &[(&str, SignalKind, u8)] = &[
    ("spf", SignalKind::SpfFail, 25),
    ("dkim", SignalKind::DkimFail, 15),
    ("dmarc", SignalKind::DmarcFail, 25),
    ("does not match the from", SignalKind::SpoofedSender, 15),
    ("from header", SignalKind::MissingSender, 20),
    ("return-path", SignalKind::ReturnPathMissing, 10),
    ("routing chain", SignalKind::LongRoutingChain, 10),
    ("link", SignalKind::SuspiciousLink, 25),
    ("urgency", SignalKind::Urgency, 20),
    ("credential", SignalKind::Credentials, 25),
    ("reward", SignalKind::Reward, 15),
    ("impersonat", SignalKind::Impersonation, 15),
    ("generic salutation", SignalKind::GenericGreeting, 10),
    ("auto-generated", SignalKind::GenericUsername, 20),
    ("scam keyword", SignalKind::ScamKeywords, 25),
    ("bio", SignalKind::EmptyBio, 10),
    ("follower", SignalKind::FollowerAnomaly, 15),
    ("no posts", SignalKind::NoPosts, 10),
    ("very new", SignalKind::NewAccount, 20),
    ("deepfake", SignalKind::Deepfake, 30),
    ("duration", SignalKind::DurationAnomaly, 10),
    ("file type", SignalKind::UncommonFormat, 15),
    ("file size", SignalKind::OversizedFile, 10),
    ("filename", SignalKind::GenericFilename, 10),
];

/// Classify one issue string, if any mapping applies.
pub fn classify_issue(issue: &str) -> Option<(SignalKind, u8)> {
    let lowered = issue.to_lowercase();
    ISSUE_MAPPINGS
        .iter()
        .find(|(needle, _, _)| lowered.contains(needle))
        .map(|(_, kind, score)| (*kind, *score))
}

/// Map an analyzer's issue list into typed signals. Signal ids are unique
/// within the owning evidence item.
pub fn map_issues(evidence_id: &str, source: EvidenceKind, issues: &[String]) -> Vec<Signal> {
    let mut signals = Vec::new();
    for issue in issues {
        if let Some((kind, score)) = classify_issue(issue) {
            let id = format!("{}_s{}", evidence_id, signals.len());
            signals.push(Signal::new(id, kind, score, source));
        }
    }
    signals
}
