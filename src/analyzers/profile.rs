//! Social profile analyzer: username, bio, ratio and account-age heuristics.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::hash::evidence_id;
use crate::core::time::now_utc;
use crate::core::types::{EvidenceItem, EvidenceKind, RiskLevel};
use crate::pipeline::signal_map::map_issues;

pub const GENERIC_USERNAME_SCORE: u8 = 20;
pub const EMPTY_BIO_SCORE: u8 = 10;
pub const SCAM_KEYWORD_SCORE: u8 = 25;
pub const FOLLOWER_RATIO_SCORE: u8 = 15;
pub const NO_POSTS_SCORE: u8 = 10;
pub const NEW_ACCOUNT_SCORE: u8 = 20;
/// Verified accounts get this much credit back.
pub const VERIFIED_CREDIT: u8 = 20;

pub const SUSPICIOUS_FLOOR: u8 = 35;
pub const PROFILE_HIGH_FLOOR: u8 = 60;
pub const PROFILE_MEDIUM_FLOOR: u8 = 35;

pub const MIN_BIO_CHARS: usize = 10;
/// A following count this high with almost no followers back is anomalous.
pub const RATIO_FOLLOWING_FLOOR: u64 = 500;
pub const RATIO_FACTOR: u64 = 10;

const SCAM_BIO_KEYWORDS: &[&str] = &[
    "crypto",
    "bitcoin",
    "forex",
    "investment",
    "guaranteed",
    "profit",
    "giveaway",
    "cash app",
    "dm me",
    "whatsapp me",
    "telegram",
    "binary options",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileInput {
    pub username: String,
    #[serde(default)]
    pub bio: String,
    pub follower_count: u64,
    pub following_count: u64,
    pub post_count: u64,
    /// Free-form age string as shown by the platform, e.g. "3 days".
    #[serde(default)]
    pub account_age: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileAnalysis {
    pub risk_score: u8,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub is_suspicious: bool,
}

pub fn analyze_profile(input: &ProfileInput) -> ProfileAnalysis {
    let mut score: u32 = 0;
    let mut issues = Vec::new();

    if is_generic_username(&input.username) {
        issues.push("Username looks auto-generated".to_string());
        score += GENERIC_USERNAME_SCORE as u32;
    }

    if input.bio.trim().len() < MIN_BIO_CHARS {
        issues.push("Profile bio is empty or very short".to_string());
        score += EMPTY_BIO_SCORE as u32;
    } else {
        let lowered = input.bio.to_lowercase();
        if SCAM_BIO_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            issues.push("Profile bio contains scam keywords".to_string());
            score += SCAM_KEYWORD_SCORE as u32;
        }
    }

    if input.following_count >= RATIO_FOLLOWING_FLOOR
        && input.follower_count < input.following_count / RATIO_FACTOR
    {
        issues.push("Heavily one-sided follower/following ratio".to_string());
        score += FOLLOWER_RATIO_SCORE as u32;
    }

    if input.post_count == 0 {
        issues.push("Account has no posts".to_string());
        score += NO_POSTS_SCORE as u32;
    }

    if let Some(age) = &input.account_age {
        let lowered = age.to_lowercase();
        if lowered.contains("day") || lowered.contains("week") {
            issues.push(format!("Account is very new ({})", age));
            score += NEW_ACCOUNT_SCORE as u32;
        }
    }

    if input.verified {
        score = score.saturating_sub(VERIFIED_CREDIT as u32);
    }

    let risk_score = score.min(100) as u8;
    let is_suspicious = risk_score >= SUSPICIOUS_FLOOR;

    let recommendations = if is_suspicious {
        vec![
            "Do not move the conversation off-platform or send money to this account.".to_string(),
            "Search the profile photo and name for duplicates on other platforms.".to_string(),
        ]
    } else {
        vec!["Profile shows no strong red flags; still verify identity for money requests."
            .to_string()]
    };

    ProfileAnalysis {
        risk_score,
        issues,
        recommendations,
        is_suspicious,
    }
}

/// Auto-generated-looking handles: a default stem, or a name trailed by a
/// long digit block.
pub fn is_generic_username(username: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^(?:user|account|profile|member)\d+$|^[a-z]+[._-]?\d{4,}$")
            .expect("static regex")
    });
    re.is_match(&username.trim().to_lowercase())
}

pub fn profile_risk_level(score: u8) -> RiskLevel {
    if score >= PROFILE_HIGH_FLOOR {
        RiskLevel::High
    } else if score >= PROFILE_MEDIUM_FLOOR {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub fn profile_evidence(input: &ProfileInput, analysis: &ProfileAnalysis) -> EvidenceItem {
    let at = now_utc();
    let data = serde_json::to_value(input).unwrap_or(serde_json::Value::Null);
    let id = evidence_id(EvidenceKind::Profile, &data, at);
    let signals = map_issues(&id, EvidenceKind::Profile, &analysis.issues);
    EvidenceItem {
        id,
        kind: EvidenceKind::Profile,
        analyzed_at: at,
        data,
        signals,
        risk_score: analysis.risk_score,
        risk_level: profile_risk_level(analysis.risk_score),
        issues: analysis.issues.clone(),
        recommendations: analysis.recommendations.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SignalKind;

    fn base_profile() -> ProfileInput {
        ProfileInput {
            username: "jane.doe".to_string(),
            bio: "Gardener, cyclist, amateur baker in Leeds.".to_string(),
            follower_count: 300,
            following_count: 280,
            post_count: 120,
            account_age: Some("4 years".to_string()),
            verified: false,
        }
    }

    #[test]
    fn established_profile_is_low_risk() {
        let result = analyze_profile(&base_profile());
        assert_eq!(result.risk_score, 0);
        assert!(!result.is_suspicious);
    }

    #[test]
    fn verified_never_scores_higher_than_unverified() {
        let mut unverified = base_profile();
        unverified.username = "user839201".to_string();
        unverified.bio = String::new();
        unverified.post_count = 0;

        let mut verified = unverified.clone();
        verified.verified = true;

        let a = analyze_profile(&unverified);
        let b = analyze_profile(&verified);
        assert!(b.risk_score <= a.risk_score);
    }

    #[test]
    fn fresh_scam_profile_is_high_risk() {
        let input = ProfileInput {
            username: "kelly4829105".to_string(),
            bio: "Crypto investment coach, guaranteed profit, DM me".to_string(),
            follower_count: 12,
            following_count: 4_000,
            post_count: 0,
            account_age: Some("3 days".to_string()),
            verified: false,
        };
        let result = analyze_profile(&input);
        assert!(result.risk_score >= PROFILE_HIGH_FLOOR);
        assert!(result.is_suspicious);

        let item = profile_evidence(&input, &result);
        assert!(item.has_signal(SignalKind::GenericUsername));
        assert!(item.has_signal(SignalKind::ScamKeywords));
        assert!(item.has_signal(SignalKind::FollowerAnomaly));
        assert!(item.has_signal(SignalKind::NoPosts));
        assert!(item.has_signal(SignalKind::NewAccount));
        assert_eq!(item.risk_level, RiskLevel::High);
    }

    #[test]
    fn generic_username_patterns() {
        assert!(is_generic_username("user12345"));
        assert!(is_generic_username("anna_48291"));
        assert!(!is_generic_username("jane.doe"));
        assert!(!is_generic_username("baker99"));
    }

    #[test]
    fn risk_level_boundaries_are_exact() {
        assert_eq!(profile_risk_level(34), RiskLevel::Low);
        assert_eq!(profile_risk_level(35), RiskLevel::Medium);
        assert_eq!(profile_risk_level(59), RiskLevel::Medium);
        assert_eq!(profile_risk_level(60), RiskLevel::High);
    }
}
