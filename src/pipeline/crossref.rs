//! Cross-reference engine: runs correlation rules pairwise across evidence of
//! different kinds and surfaces corroborating or contradictory findings.

use std::collections::BTreeSet;

use crate::core::types::{
    CheckType, CrossReference, EvidenceItem, EvidenceKind, RiskLevel, SignalKind,
};
use crate::pipeline::matcher::round2;
use crate::pipeline::patterns::PATTERNS;

/// Scale applied when converting a pattern rule's confidence into an additive
/// confidence impact.
pub const RULE_IMPACT_SCALE: f64 = 0.25;
/// Impact of the structural profile+message rule when both sides are
/// high-risk.
pub const PROFILE_MESSAGE_BOTH_IMPACT: f64 = 0.25;
/// Impact when only one of the two is high-risk.
pub const PROFILE_MESSAGE_EITHER_IMPACT: f64 = 0.6;
/// Impact of the structural email-auth + message-lure rule.
pub const AUTH_LURE_IMPACT: f64 = 0.3;

/// Evaluate every library correlation rule plus the two structural rules.
/// Library rules and structural rules are deliberately duplicative; both
/// layers run and can both contribute entries.
pub fn find_cross_references(evidence: &[EvidenceItem]) -> Vec<CrossReference> {
    let mut refs = Vec::new();

    // Each rule is evaluated once even when several patterns attach it.
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for pattern in PATTERNS {
        for rule in pattern.rules {
            if !seen.insert(rule.id) {
                continue;
            }
            let subset: Vec<&EvidenceItem> = evidence
                .iter()
                .filter(|e| rule.evidence_kinds.contains(&e.kind))
                .collect();
            if subset.len() < 2 {
                continue;
            }
            if let Some(found) = rule.evaluate(&subset) {
                refs.push(CrossReference {
                    check_type: rule.check_type,
                    evidence_ids: subset.iter().map(|e| e.id.clone()).collect(),
                    description: found.description,
                    impact_on_confidence: round2(found.confidence * RULE_IMPACT_SCALE),
                });
            }
        }
    }

    if let Some(found) = profile_message_risk(evidence) {
        refs.push(found);
    }
    if let Some(found) = auth_failure_with_lure(evidence) {
        refs.push(found);
    }

    refs
}

/// Structural rule: profile and message evidence both present, one or both
/// high-risk. Confidence 0.9 when both are high-risk, 0.6 when either is;
/// each branch carries its own additive impact.
fn profile_message_risk(evidence: &[EvidenceItem]) -> Option<CrossReference> {
    let profile = evidence.iter().find(|e| e.kind == EvidenceKind::Profile)?;
    let message = evidence.iter().find(|e| e.kind == EvidenceKind::Message)?;

    let profile_high = profile.risk_level == RiskLevel::High;
    let message_high = message.risk_level == RiskLevel::High;
    let (description, impact) = if profile_high && message_high {
        (
            "Sender profile and message are both high-risk".to_string(),
            PROFILE_MESSAGE_BOTH_IMPACT,
        )
    } else if profile_high || message_high {
        (
            "One of sender profile and message is high-risk".to_string(),
            PROFILE_MESSAGE_EITHER_IMPACT,
        )
    } else {
        return None;
    };

    Some(CrossReference {
        check_type: CheckType::Correlation,
        evidence_ids: vec![profile.id.clone(), message.id.clone()],
        description,
        impact_on_confidence: impact,
    })
}

/// Structural rule: email authentication failure plus a credential or urgency
/// lure in the message.
fn auth_failure_with_lure(evidence: &[EvidenceItem]) -> Option<CrossReference> {
    let email = evidence.iter().find(|e| e.kind == EvidenceKind::Email)?;
    let message = evidence.iter().find(|e| e.kind == EvidenceKind::Message)?;

    let auth_failed = email.has_signal(SignalKind::SpfFail)
        || email.has_signal(SignalKind::DkimFail)
        || email.has_signal(SignalKind::DmarcFail);
    let lure =
        message.has_signal(SignalKind::Credentials) || message.has_signal(SignalKind::Urgency);
    if !(auth_failed && lure) {
        return None;
    }

    Some(CrossReference {
        check_type: CheckType::Correlation,
        evidence_ids: vec![email.id.clone(), message.id.clone()],
        description: "Failed email authentication combined with a credential or urgency lure"
            .to_string(),
        impact_on_confidence: AUTH_LURE_IMPACT,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::now_utc;
    use crate::core::types::Signal;

    fn evidence(kind: EvidenceKind, level: RiskLevel, kinds: &[SignalKind]) -> EvidenceItem {
        let signals = kinds
            .iter()
            .enumerate()
            .map(|(i, k)| Signal::new(format!("ev_{}_s{}", kind.label(), i), *k, 25, kind))
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
    fn no_cross_references_from_single_item() {
        let message = evidence(EvidenceKind::Message, RiskLevel::High, &[SignalKind::Urgency]);
        assert!(find_cross_references(&[message]).is_empty());
    }

    #[test]
    fn both_high_risk_profile_and_message_correlate() {
        let profile = evidence(EvidenceKind::Profile, RiskLevel::High, &[]);
        let message = evidence(EvidenceKind::Message, RiskLevel::High, &[]);
        let refs = find_cross_references(&[profile, message]);
        let structural = refs
            .iter()
            .find(|r| r.description.contains("both high-risk"))
            .expect("structural rule should fire");
        assert_eq!(structural.impact_on_confidence, PROFILE_MESSAGE_BOTH_IMPACT);
        assert_eq!(structural.evidence_ids.len(), 2);
    }

    #[test]
    fn either_high_risk_branch_carries_the_larger_impact() {
        let profile = evidence(EvidenceKind::Profile, RiskLevel::Low, &[]);
        let message = evidence(EvidenceKind::Message, RiskLevel::High, &[]);
        let refs = find_cross_references(&[profile, message]);
        let structural = refs
            .iter()
            .find(|r| r.description.contains("One of sender profile and message"))
            .expect("either-high branch should fire");
        assert_eq!(
            structural.impact_on_confidence,
            PROFILE_MESSAGE_EITHER_IMPACT
        );
    }

    #[test]
    fn analyzer_built_evidence_hits_the_either_high_branch() {
        use crate::analyzers::message::{analyze_message, message_evidence};
        use crate::analyzers::profile::{analyze_profile, profile_evidence, ProfileInput};

        let text = "Dear customer, act now and verify your account at http://bit.ly/x";
        let msg = analyze_message(text);
        let message = message_evidence(text, &msg);
        assert_eq!(message.risk_level, RiskLevel::High);

        let input = ProfileInput {
            username: "jane.doe".to_string(),
            bio: "Gardener, cyclist, amateur baker in Leeds.".to_string(),
            follower_count: 300,
            following_count: 280,
            post_count: 120,
            account_age: Some("4 years".to_string()),
            verified: false,
        };
        let prof = analyze_profile(&input);
        let profile = profile_evidence(&input, &prof);
        assert_eq!(profile.risk_level, RiskLevel::Low);

        let refs = find_cross_references(&[profile, message]);
        let structural = refs
            .iter()
            .find(|r| r.description.contains("One of sender profile and message"))
            .expect("either-high branch should fire");
        assert_eq!(
            structural.impact_on_confidence,
            PROFILE_MESSAGE_EITHER_IMPACT
        );
    }

    #[test]
    fn auth_failure_with_credential_lure_adds_fixed_impact() {
        let email = evidence(EvidenceKind::Email, RiskLevel::Medium, &[SignalKind::SpfFail]);
        let message = evidence(
            EvidenceKind::Message,
            RiskLevel::Medium,
            &[SignalKind::Credentials],
        );
        let refs = find_cross_references(&[email, message]);
        let structural = refs
            .iter()
            .find(|r| r.impact_on_confidence == AUTH_LURE_IMPACT)
            .expect("auth+lure structural rule should fire");
        assert_eq!(structural.check_type, CheckType::Correlation);
        // The pattern-level twin fires too; both layers contribute.
        assert!(refs.len() >= 2);
    }

    #[test]
    fn library_rules_need_two_matching_evidence_items() {
        let email = evidence(EvidenceKind::Email, RiskLevel::High, &[SignalKind::SpfFail]);
        let refs = find_cross_references(&[email]);
        assert!(refs.is_empty());
    }
}
