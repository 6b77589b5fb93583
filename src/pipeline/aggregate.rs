//! Risk aggregation: combines evidence scores, pattern confidences and
//! cross-reference boosts into one score/level/confidence triple.

use std::collections::BTreeMap;

use crate::core::types::{
    CrossReference, EvidenceItem, PatternMatch, RiskAssessment, RiskLevel, ThreatCategory,
};

pub const EVIDENCE_SCORE_WEIGHT: f64 = 0.5;
pub const PATTERN_CONFIDENCE_WEIGHT: f64 = 0.3;
pub const CROSS_REF_WEIGHT: f64 = 0.2;
pub const CROSS_REF_BOOST_CAP: f64 = 0.5;

pub const RISK_HIGH_FLOOR: u8 = 60;
pub const RISK_MEDIUM_FLOOR: u8 = 35;

pub const BASE_CONFIDENCE: f64 = 0.2;
pub const COVERAGE_BONUS_MAX: f64 = 0.3;
pub const PATTERN_BONUS: f64 = 0.3;
pub const CROSS_REF_BONUS: f64 = 0.2;
/// Confidence never reaches 1.0; the engine never claims certainty.
pub const CONFIDENCE_CAP: f64 = 0.95;

/// Evidence-item count at which the coverage bonus saturates.
pub const FULL_COVERAGE_COUNT: f64 = 3.0;

pub fn risk_level(score: u8) -> RiskLevel {
    if score >= RISK_HIGH_FLOOR {
        RiskLevel::High
    } else if score >= RISK_MEDIUM_FLOOR {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub fn calculate_overall_risk(
    evidence: &[EvidenceItem],
    patterns: &[PatternMatch],
    cross_refs: &[CrossReference],
) -> RiskAssessment {
    if evidence.is_empty() {
        return RiskAssessment {
            score: 0,
            level: RiskLevel::Low,
            confidence: 0.0,
        };
    }

    let avg_evidence_score = evidence
        .iter()
        .map(|e| e.risk_score as f64)
        .sum::<f64>()
        / evidence.len() as f64;
    let max_pattern_confidence = patterns
        .iter()
        .map(|p| p.confidence)
        .fold(0.0_f64, f64::max);
    let cross_ref_boost = cross_refs
        .iter()
        .map(|c| c.impact_on_confidence)
        .sum::<f64>()
        .min(CROSS_REF_BOOST_CAP);

    let final_score = (avg_evidence_score * EVIDENCE_SCORE_WEIGHT
        + max_pattern_confidence * 50.0 * PATTERN_CONFIDENCE_WEIGHT
        + cross_ref_boost * 100.0 * CROSS_REF_WEIGHT)
        .min(100.0);
    // Thresholds compare the unrounded score; rounding is display-only, so
    // 59.5 stays Medium even though it prints as 60.
    let level = if final_score >= RISK_HIGH_FLOOR as f64 {
        RiskLevel::High
    } else if final_score >= RISK_MEDIUM_FLOOR as f64 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };
    let score = final_score.round() as u8;

    let coverage_bonus =
        (evidence.len() as f64 / FULL_COVERAGE_COUNT).min(1.0) * COVERAGE_BONUS_MAX;
    let pattern_bonus = if patterns.is_empty() { 0.0 } else { PATTERN_BONUS };
    let cross_ref_bonus = if cross_refs.is_empty() { 0.0 } else { CROSS_REF_BONUS };
    let confidence =
        (BASE_CONFIDENCE + coverage_bonus + pattern_bonus + cross_ref_bonus).min(CONFIDENCE_CAP);

    RiskAssessment {
        score,
        level,
        confidence,
    }
}

/// No patterns means unknown; otherwise the category with the highest
/// cumulative confidence wins, so two moderate matches in one category beat a
/// single strong match in another.
pub fn determine_threat_category(patterns: &[PatternMatch]) -> ThreatCategory {
    if patterns.is_empty() {
        return ThreatCategory::Unknown;
    }
    let mut totals: BTreeMap<ThreatCategory, f64> = BTreeMap::new();
    for p in patterns {
        *totals.entry(p.category).or_insert(0.0) += p.confidence;
    }
    totals
        .into_iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(category, _)| category)
        .unwrap_or(ThreatCategory::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::now_utc;
    use crate::core::types::{CheckType, EvidenceKind};

    fn evidence(score: u8) -> EvidenceItem {
        EvidenceItem {
            id: format!("ev_{}", score),
            kind: EvidenceKind::Message,
            analyzed_at: now_utc(),
            data: serde_json::Value::Null,
            signals: vec![],
            risk_score: score,
            risk_level: risk_level(score),
            issues: vec![],
            recommendations: vec![],
        }
    }

    fn pattern(category: ThreatCategory, confidence: f64) -> PatternMatch {
        PatternMatch {
            pattern_id: "test".into(),
            category,
            confidence,
            matched_signals: vec![],
            description: String::new(),
        }
    }

    fn cross_ref(impact: f64) -> CrossReference {
        CrossReference {
            check_type: CheckType::Correlation,
            evidence_ids: vec![],
            description: String::new(),
            impact_on_confidence: impact,
        }
    }

    #[test]
    fn empty_inputs_yield_zero_low_zero() {
        let risk = calculate_overall_risk(&[], &[], &[]);
        assert_eq!(
            risk,
            RiskAssessment {
                score: 0,
                level: RiskLevel::Low,
                confidence: 0.0
            }
        );
    }

    #[test]
    fn confidence_never_exceeds_cap() {
        let evidence: Vec<EvidenceItem> = (0..6).map(|_| evidence(90)).collect();
        let patterns = vec![pattern(ThreatCategory::Phishing, 0.95)];
        let refs = vec![cross_ref(0.3), cross_ref(0.3), cross_ref(0.3)];
        let risk = calculate_overall_risk(&evidence, &patterns, &refs);
        assert!(risk.confidence <= CONFIDENCE_CAP);
        assert_eq!(risk.score, 100);
        assert_eq!(risk.level, RiskLevel::High);
    }

    #[test]
    fn cross_ref_boost_is_clamped() {
        let ev = vec![evidence(0)];
        let refs = vec![cross_ref(0.4), cross_ref(0.4)];
        let risk = calculate_overall_risk(&ev, &[], &refs);
        // boost clamped to 0.5 -> 0.5 * 100 * 0.2 = 10
        assert_eq!(risk.score, 10);
    }

    #[test]
    fn level_is_taken_from_the_unrounded_score() {
        // avg 99 * 0.5 + boost 0.5 * 100 * 0.2 = 59.5: prints as 60 but stays
        // below the high floor.
        let evidence = vec![evidence(99), evidence(99)];
        let refs = vec![cross_ref(0.5)];
        let risk = calculate_overall_risk(&evidence, &[], &refs);
        assert_eq!(risk.score, 60);
        assert_eq!(risk.level, RiskLevel::Medium);
    }

    #[test]
    fn level_boundaries_are_exact() {
        assert_eq!(risk_level(34), RiskLevel::Low);
        assert_eq!(risk_level(35), RiskLevel::Medium);
        assert_eq!(risk_level(59), RiskLevel::Medium);
        assert_eq!(risk_level(60), RiskLevel::High);
    }

    #[test]
    fn no_patterns_means_unknown_category() {
        assert_eq!(determine_threat_category(&[]), ThreatCategory::Unknown);
    }

    #[test]
    fn single_pattern_returns_its_category() {
        let patterns = vec![pattern(ThreatCategory::RomanceScam, 0.4)];
        assert_eq!(
            determine_threat_category(&patterns),
            ThreatCategory::RomanceScam
        );
    }

    #[test]
    fn cumulative_confidence_outranks_single_strong_match() {
        let patterns = vec![
            pattern(ThreatCategory::Impersonation, 0.6),
            pattern(ThreatCategory::Phishing, 0.4),
            pattern(ThreatCategory::Phishing, 0.35),
        ];
        assert_eq!(determine_threat_category(&patterns), ThreatCategory::Phishing);
    }
}
