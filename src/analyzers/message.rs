//! Message text analyzer: keyword and regex families for scam language.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strsim::levenshtein;

use crate::core::hash::evidence_id;
use crate::core::time::now_utc;
use crate::core::types::{EvidenceItem, EvidenceKind, RiskLevel};
use crate::pipeline::signal_map::map_issues;

pub const LINK_SCORE: u8 = 25;
pub const URGENCY_SCORE: u8 = 20;
pub const CREDENTIAL_SCORE: u8 = 25;
pub const REWARD_SCORE: u8 = 15;
pub const IMPERSONATION_SCORE: u8 = 15;
pub const GENERIC_SALUTATION_SCORE: u8 = 10;
pub const SCORE_CAP: u8 = 100;
pub const THREAT_FLOOR: u8 = 45;

pub const MESSAGE_HIGH_FLOOR: u8 = 70;
pub const MESSAGE_MEDIUM_FLOOR: u8 = 45;

const URGENCY_PHRASES: &[&str] = &[
    "act now",
    "urgent",
    "immediately",
    "right away",
    "within 24 hours",
    "expires",
    "last chance",
    "final notice",
    "asap",
    "time is running out",
    "limited time",
    "before it's too late",
];

const CREDENTIAL_PHRASES: &[&str] = &[
    "password",
    "verify your account",
    "confirm your identity",
    "log in",
    "login",
    "social security",
    "ssn",
    "bank account",
    "credit card",
    "security code",
    "one-time code",
    "pin number",
];

const REWARD_PHRASES: &[&str] = &[
    "congratulations",
    "you have won",
    "you've won",
    "winner",
    "prize",
    "lottery",
    "free gift",
    "claim your",
    "reward",
    "cash out",
];

const GENERIC_SALUTATIONS: &[&str] = &[
    "dear customer",
    "dear user",
    "dear sir",
    "dear madam",
    "dear friend",
    "dear member",
    "valued customer",
    "to whom it may concern",
];

const KNOWN_BRANDS: &[&str] = &[
    "paypal",
    "amazon",
    "apple",
    "microsoft",
    "netflix",
    "google",
    "facebook",
    "instagram",
    "whatsapp",
    "fedex",
    "dhl",
    "irs",
];

const SHORTENER_DOMAINS: &[&str] = &[
    "bit.ly", "tinyurl.com", "t.co", "goo.gl", "is.gd", "buff.ly", "ow.ly", "cutt.ly",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageAnalysis {
    pub risk_score: u8,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub is_potential_threat: bool,
    pub contains_links: bool,
}

/// Pure keyword/regex scan over free text. Same input always produces the
/// same output; empty input degrades to a zero-signal result.
pub fn analyze_message(text: &str) -> MessageAnalysis {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return MessageAnalysis {
            risk_score: 0,
            issues: vec![],
            recommendations: vec![],
            is_potential_threat: false,
            contains_links: false,
        };
    }

    let lowered = trimmed.to_lowercase();
    let mut score: u32 = 0;
    let mut issues = Vec::new();

    let contains_links = link_regex().is_match(trimmed);
    if contains_links {
        let shortened = SHORTENER_DOMAINS.iter().any(|d| lowered.contains(d));
        if shortened {
            issues.push("Contains a shortened link that hides its destination".to_string());
        } else {
            issues.push("Contains a link; verify the destination before clicking".to_string());
        }
        score += LINK_SCORE as u32;
    }

    if URGENCY_PHRASES.iter().any(|p| lowered.contains(p)) {
        issues.push("Creates a false sense of urgency or time pressure".to_string());
        score += URGENCY_SCORE as u32;
    }

    if CREDENTIAL_PHRASES.iter().any(|p| lowered.contains(p)) {
        issues.push("Requests credentials or personal verification details".to_string());
        score += CREDENTIAL_SCORE as u32;
    }

    if REWARD_PHRASES.iter().any(|p| lowered.contains(p)) {
        issues.push("Promises a reward, prize, or winnings".to_string());
        score += REWARD_SCORE as u32;
    }

    if let Some(brand) = impersonated_brand(&lowered) {
        issues.push(format!("May be impersonating a known brand: {}", brand));
        score += IMPERSONATION_SCORE as u32;
    }

    if GENERIC_SALUTATIONS.iter().any(|p| lowered.contains(p)) {
        issues.push("Uses a generic salutation typical of mass mailings".to_string());
        score += GENERIC_SALUTATION_SCORE as u32;
    }

    let risk_score = score.min(SCORE_CAP as u32) as u8;
    let is_potential_threat = risk_score >= THREAT_FLOOR;

    let recommendations = if is_potential_threat {
        vec![
            "Do not click any links or reply until the sender is verified.".to_string(),
            "Contact the claimed sender through an official channel instead.".to_string(),
        ]
    } else {
        vec!["No strong scam indicators in the text; stay cautious with unexpected requests."
            .to_string()]
    };

    MessageAnalysis {
        risk_score,
        issues,
        recommendations,
        is_potential_threat,
        contains_links,
    }
}

fn link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:https?://|www\.)\S+").expect("static regex"))
}

/// Exact brand mention, or a token within edit distance 2 of a known brand
/// (catching lookalikes such as "paypa1").
fn impersonated_brand(lowered: &str) -> Option<&'static str> {
    for brand in KNOWN_BRANDS {
        if lowered.contains(brand) {
            return Some(brand);
        }
    }
    for token in lowered.split(|c: char| !c.is_ascii_alphanumeric()) {
        if token.len() < 4 {
            continue;
        }
        for brand in KNOWN_BRANDS {
            if brand.len() >= 4 && levenshtein(token, brand) <= 2 && token != *brand {
                return Some(brand);
            }
        }
    }
    None
}

pub fn message_risk_level(score: u8) -> RiskLevel {
    if score >= MESSAGE_HIGH_FLOOR {
        RiskLevel::High
    } else if score >= MESSAGE_MEDIUM_FLOOR {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Wrap an analysis result into an immutable evidence item.
pub fn message_evidence(text: &str, analysis: &MessageAnalysis) -> EvidenceItem {
    let at = now_utc();
    let data = serde_json::json!({
        "text": text,
        "contains_links": analysis.contains_links,
        "is_potential_threat": analysis.is_potential_threat,
    });
    let id = evidence_id(EvidenceKind::Message, &data, at);
    let signals = map_issues(&id, EvidenceKind::Message, &analysis.issues);
    EvidenceItem {
        id,
        kind: EvidenceKind::Message,
        analyzed_at: at,
        data,
        signals,
        risk_score: analysis.risk_score,
        risk_level: message_risk_level(analysis.risk_score),
        issues: analysis.issues.clone(),
        recommendations: analysis.recommendations.clone(),
    }
}
