//! Email header analyzer: sender fields, authentication results, routing.

use serde::{Deserialize, Serialize};

use crate::core::hash::evidence_id;
use crate::core::time::now_utc;
use crate::core::types::{EvidenceItem, EvidenceKind, RiskLevel};
use crate::pipeline::signal_map::map_issues;

pub const MISSING_FROM_SCORE: u8 = 20;
pub const MISSING_RETURN_PATH_SCORE: u8 = 10;
pub const SPF_FAIL_SCORE: u8 = 25;
pub const DMARC_FAIL_SCORE: u8 = 25;
pub const DKIM_FAIL_SCORE: u8 = 15;
pub const SENDER_MISMATCH_SCORE: u8 = 15;
pub const LONG_ROUTE_SCORE: u8 = 10;
pub const SCORE_CAP: u8 = 100;

pub const SUSPICIOUS_FLOOR: u8 = 35;
pub const EMAIL_HIGH_FLOOR: u8 = 60;
pub const EMAIL_MEDIUM_FLOOR: u8 = 35;

/// Received hop count beyond which the routing chain is flagged.
pub const MAX_NORMAL_HOPS: usize = 8;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthResult {
    Pass,
    Fail,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAnalysis {
    pub risk_score: u8,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub is_suspicious: bool,
    pub from: Option<String>,
    pub return_path: Option<String>,
    pub spf: AuthResult,
    pub dkim: AuthResult,
    pub dmarc: AuthResult,
    pub received_hops: usize,
}

/// Parse a raw header block and score it. Malformed or empty input degrades
/// to missing-field penalties; this never fails.
pub fn analyze_headers(raw: &str) -> EmailAnalysis {
    let unfolded = unfold_headers(raw);
    let from = header_value(&unfolded, "from");
    let return_path = header_value(&unfolded, "return-path");
    let auth_results = header_value(&unfolded, "authentication-results").unwrap_or_default();
    let received_hops = unfolded
        .iter()
        .filter(|(name, _)| name == "received")
        .count();

    let spf = auth_token(&auth_results, "spf");
    let dkim = auth_token(&auth_results, "dkim");
    let dmarc = auth_token(&auth_results, "dmarc");

    let mut score: u32 = 0;
    let mut issues = Vec::new();

    if from.is_none() {
        issues.push("From header is missing".to_string());
        score += MISSING_FROM_SCORE as u32;
    }
    if return_path.is_none() {
        issues.push("Return-Path header is missing".to_string());
        score += MISSING_RETURN_PATH_SCORE as u32;
    }

    if spf == AuthResult::Fail {
        issues.push("SPF authentication failed".to_string());
        score += SPF_FAIL_SCORE as u32;
    }
    if dmarc == AuthResult::Fail {
        issues.push("DMARC authentication failed".to_string());
        score += DMARC_FAIL_SCORE as u32;
    }
    if dkim == AuthResult::Fail {
        issues.push("DKIM signature verification failed".to_string());
        score += DKIM_FAIL_SCORE as u32;
    }

    if let (Some(from_addr), Some(rp_addr)) = (&from, &return_path) {
        let from_domain = address_domain(from_addr);
        let rp_domain = address_domain(rp_addr);
        if let (Some(fd), Some(rd)) = (from_domain, rp_domain) {
            if fd != rd {
                issues.push(format!(
                    "Return-Path domain ({}) does not match the From domain ({})",
                    rd, fd
                ));
                score += SENDER_MISMATCH_SCORE as u32;
            }
        }
    }

    if received_hops > MAX_NORMAL_HOPS {
        issues.push(format!(
            "Unusually long routing chain ({} Received hops)",
            received_hops
        ));
        score += LONG_ROUTE_SCORE as u32;
    }

    let risk_score = score.min(SCORE_CAP as u32) as u8;
    let is_suspicious = risk_score >= SUSPICIOUS_FLOOR;

    let mut recommendations = Vec::new();
    if spf == AuthResult::Fail || dmarc == AuthResult::Fail || dkim == AuthResult::Fail {
        recommendations.push(
            "Sender authentication failed; treat this email as untrusted.".to_string(),
        );
    }
    if is_suspicious {
        recommendations
            .push("Do not open attachments or follow links from this email.".to_string());
    }
    // Always return at least one recommendation.
    if recommendations.is_empty() {
        recommendations.push(
            "Headers show no strong spoofing indicators; verify the sender if the request is unusual."
                .to_string(),
        );
    }

    EmailAnalysis {
        risk_score,
        issues,
        recommendations,
        is_suspicious,
        from,
        return_path,
        spf,
        dkim,
        dmarc,
        received_hops,
    }
}

pub fn email_risk_level(score: u8) -> RiskLevel {
    if score >= EMAIL_HIGH_FLOOR {
        RiskLevel::High
    } else if score >= EMAIL_MEDIUM_FLOOR {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub fn email_evidence(raw: &str, analysis: &EmailAnalysis) -> EvidenceItem {
    let at = now_utc();
    let data = serde_json::json!({
        "raw_headers": raw,
        "from": analysis.from,
        "return_path": analysis.return_path,
        "spf": analysis.spf,
        "dkim": analysis.dkim,
        "dmarc": analysis.dmarc,
        "received_hops": analysis.received_hops,
    });
    let id = evidence_id(EvidenceKind::Email, &data, at);
    let signals = map_issues(&id, EvidenceKind::Email, &analysis.issues);
    EvidenceItem {
        id,
        kind: EvidenceKind::Email,
        analyzed_at: at,
        data,
        signals,
        risk_score: analysis.risk_score,
        risk_level: email_risk_level(analysis.risk_score),
        issues: analysis.issues.clone(),
        recommendations: analysis.recommendations.clone(),
    }
}

/// Unfold RFC 5322 continuation lines and split into (lowercased name, value)
/// pairs. Unparseable lines are skipped.
fn unfold_headers(raw: &str) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = Vec::new();
    for line in raw.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(last) = headers.last_mut() {
                last.1.push(' ');
                last.1.push_str(line.trim());
            }
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_lowercase(), value.trim().to_string()));
        }
    }
    headers
}

fn header_value(headers: &[(String, String)], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.clone())
        .filter(|v| !v.is_empty())
}

/// Extract `spf=pass`-style verdicts from an Authentication-Results value.
fn auth_token(auth_results: &str, mechanism: &str) -> AuthResult {
    let lowered = auth_results.to_lowercase();
    let needle = format!("{}=", mechanism);
    if let Some(pos) = lowered.find(&needle) {
        let rest = &lowered[pos + needle.len()..];
        let verdict: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect();
        return match verdict.as_str() {
            "pass" => AuthResult::Pass,
            "fail" | "softfail" | "permerror" | "temperror" => AuthResult::Fail,
            _ => AuthResult::None,
        };
    }
    AuthResult::None
}

fn address_domain(value: &str) -> Option<String> {
    let addr = value
        .rfind('<')
        .and_then(|start| value[start..].strip_prefix('<'))
        .map(|rest| rest.trim_end_matches('>'))
        .unwrap_or(value);
    addr.rsplit_once('@')
        .map(|(_, domain)| domain.trim().trim_end_matches('>').to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SignalKind;

    #[test]
    fn empty_input_still_scores_missing_fields() {
        let result = analyze_headers("");
        assert_eq!(
            result.risk_score,
            MISSING_FROM_SCORE + MISSING_RETURN_PATH_SCORE
        );
        assert!(!result.recommendations.is_empty());
    }

    #[test]
    fn spf_fail_is_reported_and_scored() {
        let raw = "From: Alice <alice@example.com>\n\
                   Return-Path: <alice@example.com>\n\
                   Authentication-Results: mx.test; spf=fail smtp.mailfrom=example.com";
        let result = analyze_headers(raw);
        assert!(result.issues.iter().any(|i| i.contains("SPF")));
        assert!(result.risk_score >= SPF_FAIL_SCORE);
    }

    #[test]
    fn risk_level_boundaries_are_exact() {
        assert_eq!(email_risk_level(34), RiskLevel::Low);
        assert_eq!(email_risk_level(35), RiskLevel::Medium);
        assert_eq!(email_risk_level(59), RiskLevel::Medium);
        assert_eq!(email_risk_level(60), RiskLevel::High);
    }

    #[test]
    fn return_path_mismatch_is_flagged() {
        let raw = "From: Support <support@paypal.com>\n\
                   Return-Path: <bounce@evil.test>";
        let result = analyze_headers(raw);
        assert!(result
            .issues
            .iter()
            .any(|i| i.contains("does not match the From domain")));
        let item = email_evidence(raw, &result);
        assert!(item.has_signal(SignalKind::SpoofedSender));
    }

    #[test]
    fn long_routing_chain_is_flagged() {
        let mut raw = String::from("From: a@b.c\nReturn-Path: <a@b.c>\n");
        for i in 0..10 {
            raw.push_str(&format!("Received: from hop{} by mx{}\n", i, i));
        }
        let result = analyze_headers(&raw);
        assert_eq!(result.received_hops, 10);
        assert!(result.issues.iter().any(|i| i.contains("routing chain")));
    }

    #[test]
    fn folded_authentication_results_are_parsed() {
        let raw = "From: a@b.c\n\
                   Return-Path: <a@b.c>\n\
                   Authentication-Results: mx.test;\n\
                   \tspf=pass smtp.mailfrom=b.c;\n\
                   \tdkim=fail header.d=b.c;\n\
                   \tdmarc=fail header.from=b.c";
        let result = analyze_headers(raw);
        assert_eq!(result.spf, AuthResult::Pass);
        assert_eq!(result.dkim, AuthResult::Fail);
        assert_eq!(result.dmarc, AuthResult::Fail);
        assert_eq!(result.risk_score, DKIM_FAIL_SCORE + DMARC_FAIL_SCORE);
        assert!(result.is_suspicious);
    }

    #[test]
    fn auth_failures_map_to_distinct_signals() {
        let raw = "From: a@b.c\n\
                   Return-Path: <a@b.c>\n\
                   Authentication-Results: mx.test; spf=fail; dkim=fail; dmarc=fail";
        let analysis = analyze_headers(raw);
        let item = email_evidence(raw, &analysis);
        assert!(item.has_signal(SignalKind::SpfFail));
        assert!(item.has_signal(SignalKind::DkimFail));
        assert!(item.has_signal(SignalKind::DmarcFail));
    }
}
