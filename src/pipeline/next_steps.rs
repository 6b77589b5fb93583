//! Deterministic next-step recommendations, evaluated in fixed order. Every
//! rule that fires contributes its line; nothing short-circuits.

use crate::core::types::{
    ContactOrigin, EvidenceKind, PatternMatch, RiskAssessment, RiskLevel, ScanSession,
    ThreatCategory,
};

/// Confidence at which a high-risk verdict is considered actionable.
pub const ACTIONABLE_CONFIDENCE: f64 = 0.6;
/// Below this, a low-risk verdict still warrants gathering more evidence.
pub const LOW_CONFIDENCE_FLOOR: f64 = 0.5;

pub const STEP_INITIAL: &str = "Begin by adding evidence to analyze";
pub const STEP_BLOCK_AND_REPORT: &str =
    "Do not respond or act on this request. Block the sender and report them to the platform.";
pub const STEP_CHECK_PROFILE: &str =
    "Check the sender's social profile for signs of a fake or recently created account.";
pub const STEP_CHECK_HEADERS: &str =
    "Analyze the full email headers to verify the sender's authentication results.";
pub const STEP_CHECK_MESSAGE: &str =
    "Analyze the message text itself for phishing language and suspicious links.";
pub const STEP_VERIFY_INDEPENDENTLY: &str =
    "Verify the request independently through an official channel before acting on it.";
pub const STEP_MORE_EVIDENCE: &str =
    "Add more evidence to raise the confidence of this assessment.";
pub const STEP_DEFAULT: &str =
    "Continue collecting evidence and review the assessment as it updates.";

pub fn generate_next_steps(
    session: &ScanSession,
    patterns: &[PatternMatch],
    risk: &RiskAssessment,
) -> Vec<String> {
    let mut steps = Vec::new();

    if risk.level == RiskLevel::High && risk.confidence >= ACTIONABLE_CONFIDENCE {
        steps.push(STEP_BLOCK_AND_REPORT.to_string());
    }

    let has_message = session.has_evidence(EvidenceKind::Message);
    let has_email = session.has_evidence(EvidenceKind::Email);
    if (has_message || has_email) && !session.has_evidence(EvidenceKind::Profile) {
        steps.push(STEP_CHECK_PROFILE.to_string());
    }

    if session.context.origin == Some(ContactOrigin::Email) && !has_email {
        steps.push(STEP_CHECK_HEADERS.to_string());
    }

    let phishing_detected = patterns
        .iter()
        .any(|p| p.category == ThreatCategory::Phishing);
    if phishing_detected && !has_message {
        steps.push(STEP_CHECK_MESSAGE.to_string());
    }

    if risk.level == RiskLevel::Medium {
        steps.push(STEP_VERIFY_INDEPENDENTLY.to_string());
    }

    if risk.level == RiskLevel::Low && risk.confidence < LOW_CONFIDENCE_FLOOR {
        steps.push(STEP_MORE_EVIDENCE.to_string());
    }

    if steps.is_empty() {
        steps.push(STEP_DEFAULT.to_string());
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::now_utc;
    use crate::core::types::{EvidenceItem, ScanContext, SessionStatus};

    fn session_with(kinds: &[EvidenceKind], origin: Option<ContactOrigin>) -> ScanSession {
        let evidence = kinds
            .iter()
            .map(|k| EvidenceItem {
                id: format!("ev_{}", k.label()),
                kind: *k,
                analyzed_at: now_utc(),
                data: serde_json::Value::Null,
                signals: vec![],
                risk_score: 0,
                risk_level: RiskLevel::Low,
                issues: vec![],
                recommendations: vec![],
            })
            .collect();
        ScanSession {
            id: "scan_test".into(),
            created_at: now_utc(),
            updated_at: now_utc(),
            status: SessionStatus::InProgress,
            context: ScanContext {
                origin,
                ..Default::default()
            },
            evidence,
            signals: vec![],
            pattern_matches: vec![],
            cross_references: vec![],
            overall_risk_score: 0,
            overall_risk_level: RiskLevel::Low,
            threat_category: ThreatCategory::Unknown,
            confidence: 0.0,
            completion_percentage: 0,
            next_steps: vec![],
        }
    }

    fn risk(level: RiskLevel, confidence: f64) -> RiskAssessment {
        RiskAssessment {
            score: 0,
            level,
            confidence,
        }
    }

    #[test]
    fn high_confident_risk_says_block_and_report() {
        let session = session_with(&[EvidenceKind::Message], None);
        let steps = generate_next_steps(&session, &[], &risk(RiskLevel::High, 0.8));
        assert_eq!(steps[0], STEP_BLOCK_AND_REPORT);
    }

    #[test]
    fn missing_profile_suggests_profile_check() {
        let session = session_with(&[EvidenceKind::Email], Some(ContactOrigin::Email));
        let steps = generate_next_steps(&session, &[], &risk(RiskLevel::Medium, 0.5));
        assert!(steps.contains(&STEP_CHECK_PROFILE.to_string()));
    }

    #[test]
    fn email_origin_without_headers_suggests_header_analysis() {
        let session = session_with(&[EvidenceKind::Message], Some(ContactOrigin::Email));
        let steps = generate_next_steps(&session, &[], &risk(RiskLevel::Low, 0.6));
        assert!(steps.contains(&STEP_CHECK_HEADERS.to_string()));
    }

    #[test]
    fn phishing_pattern_without_message_suggests_message_analysis() {
        let session = session_with(&[EvidenceKind::Email], None);
        let patterns = vec![PatternMatch {
            pattern_id: "credential_phishing".into(),
            category: ThreatCategory::Phishing,
            confidence: 0.5,
            matched_signals: vec![],
            description: String::new(),
        }];
        let steps = generate_next_steps(&session, &patterns, &risk(RiskLevel::Medium, 0.5));
        assert!(steps.contains(&STEP_CHECK_MESSAGE.to_string()));
    }

    #[test]
    fn multiple_rules_all_contribute() {
        let session = session_with(&[EvidenceKind::Message], Some(ContactOrigin::Email));
        let steps = generate_next_steps(&session, &[], &risk(RiskLevel::Medium, 0.5));
        // profile check, header analysis and independent verification all fire
        assert!(steps.len() >= 3);
    }

    #[test]
    fn default_step_when_nothing_fires() {
        let session = session_with(
            &[
                EvidenceKind::Message,
                EvidenceKind::Profile,
                EvidenceKind::Email,
            ],
            None,
        );
        let steps = generate_next_steps(&session, &[], &risk(RiskLevel::Low, 0.9));
        assert_eq!(steps, vec![STEP_DEFAULT.to_string()]);
    }
}
