//! Matches the accumulated evidence against the static pattern library.

use crate::core::types::{EvidenceItem, PatternMatch, Signal};
use crate::pipeline::patterns::{ThreatPattern, PATTERNS};

/// Rule-confidence vs signal-coverage weighting in the combined score.
pub const RULE_CONFIDENCE_WEIGHT: f64 = 0.6;
pub const SIGNAL_COVERAGE_WEIGHT: f64 = 0.4;
/// Matches at or below this confidence are dropped.
pub const MIN_MATCH_CONFIDENCE: f64 = 0.3;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Match every pattern in the library against the evidence list, ranked by
/// confidence descending.
pub fn detect_patterns(evidence: &[EvidenceItem]) -> Vec<PatternMatch> {
    let signals: Vec<&Signal> = evidence.iter().flat_map(|e| e.signals.iter()).collect();

    let mut matches = Vec::new();
    for pattern in PATTERNS {
        if let Some(found) = match_pattern(pattern, evidence, &signals) {
            matches.push(found);
        }
    }

    matches.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    matches
}

fn match_pattern(
    pattern: &ThreatPattern,
    evidence: &[EvidenceItem],
    signals: &[&Signal],
) -> Option<PatternMatch> {
    let matched: Vec<&Signal> = signals
        .iter()
        .copied()
        .filter(|s| pattern.signal_kinds.contains(&s.kind))
        .collect();
    if matched.len() < pattern.required_signals {
        return None;
    }

    // Rules run against the full evidence list, not just the matched signals.
    let refs: Vec<&EvidenceItem> = evidence.iter().collect();
    let rule_confidences: Vec<f64> = pattern
        .rules
        .iter()
        .filter_map(|rule| rule.evaluate(&refs).map(|m| m.confidence))
        .collect();
    let avg_rule_confidence = if rule_confidences.is_empty() {
        0.0
    } else {
        rule_confidences.iter().sum::<f64>() / rule_confidences.len() as f64
    };

    let coverage = (matched.len() as f64 / pattern.signal_kinds.len() as f64).min(1.0);
    let combined = RULE_CONFIDENCE_WEIGHT * avg_rule_confidence
        + SIGNAL_COVERAGE_WEIGHT * coverage;
    let confidence = round2(combined * pattern.confidence_weight);
    if confidence <= MIN_MATCH_CONFIDENCE {
        return None;
    }

    Some(PatternMatch {
        pattern_id: pattern.id.to_string(),
        category: pattern.category,
        confidence,
        matched_signals: matched.iter().map(|s| s.id.clone()).collect(),
        description: pattern.description.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::now_utc;
    use crate::core::types::{EvidenceKind, RiskLevel, Signal, SignalKind};

    fn evidence(kind: EvidenceKind, level: RiskLevel, kinds: &[SignalKind]) -> EvidenceItem {
        let signals = kinds
            .iter()
            .enumerate()
            .map(|(i, k)| Signal::new(format!("ev_t_s{}", i), *k, 25, kind))
            .collect();
        EvidenceItem {
            id: format!("ev_{}", kind.label()),
            kind,
            analyzed_at: now_utc(),
            data: serde_json::Value::Null,
            signals,
            risk_score: match level {
                RiskLevel::High => 80,
                RiskLevel::Medium => 45,
                RiskLevel::Low => 10,
            },
            risk_level: level,
            issues: vec![],
            recommendations: vec![],
        }
    }

    #[test]
    fn empty_evidence_matches_nothing() {
        assert!(detect_patterns(&[]).is_empty());
    }

    #[test]
    fn below_required_signal_count_never_matches() {
        let ev = evidence(EvidenceKind::Message, RiskLevel::Low, &[SignalKind::Urgency]);
        let matches = detect_patterns(&[ev]);
        assert!(matches.iter().all(|m| m.matched_signals.len() >= 2));
    }

    #[test]
    fn phishing_signals_match_credential_phishing() {
        let message = evidence(
            EvidenceKind::Message,
            RiskLevel::High,
            &[SignalKind::Urgency, SignalKind::Credentials, SignalKind::SuspiciousLink],
        );
        let email = evidence(
            EvidenceKind::Email,
            RiskLevel::High,
            &[SignalKind::SpfFail, SignalKind::DmarcFail],
        );
        let matches = detect_patterns(&[message, email]);
        assert!(matches.iter().any(|m| m.pattern_id == "credential_phishing"));
        let top = &matches[0];
        assert!(top.confidence > MIN_MATCH_CONFIDENCE);
        assert!(top.confidence <= 1.0);
    }

    #[test]
    fn output_is_sorted_by_confidence_descending() {
        let message = evidence(
            EvidenceKind::Message,
            RiskLevel::High,
            &[
                SignalKind::Urgency,
                SignalKind::Credentials,
                SignalKind::SuspiciousLink,
                SignalKind::Reward,
            ],
        );
        let email = evidence(
            EvidenceKind::Email,
            RiskLevel::High,
            &[SignalKind::SpfFail, SignalKind::GenericGreeting, SignalKind::LongRoutingChain],
        );
        let matches = detect_patterns(&[message, email]);
        for pair in matches.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    #[test]
    fn coverage_alone_can_match_without_rules() {
        // All credential_phishing kinds on a single email item: no rule can
        // fire (they all need message evidence too), so only coverage counts.
        let email = evidence(
            EvidenceKind::Email,
            RiskLevel::High,
            &[
                SignalKind::Urgency,
                SignalKind::Credentials,
                SignalKind::SuspiciousLink,
                SignalKind::SpfFail,
                SignalKind::DkimFail,
                SignalKind::DmarcFail,
                SignalKind::SpoofedSender,
            ],
        );
        let matches = detect_patterns(&[email]);
        let phishing = matches
            .iter()
            .find(|m| m.pattern_id == "credential_phishing")
            .expect("full coverage should match");
        // 0.4 * 1.0 coverage * 0.9 weight
        assert_eq!(phishing.confidence, 0.36);
    }

    #[test]
    fn confidence_is_rounded_to_two_decimals() {
        let message = evidence(
            EvidenceKind::Message,
            RiskLevel::High,
            &[SignalKind::Urgency, SignalKind::Credentials],
        );
        let email = evidence(EvidenceKind::Email, RiskLevel::High, &[SignalKind::SpfFail]);
        for m in detect_patterns(&[message, email]) {
            assert_eq!(m.confidence, round2(m.confidence));
        }
    }
}
