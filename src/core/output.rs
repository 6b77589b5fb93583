use std::fs;
use std::path::Path;

use crate::core::error::LensError;
use crate::core::types::{RiskLevel, ScanSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
}

pub fn write_session(
    session: &ScanSession,
    format: OutputFormat,
    path: &Path,
) -> Result<(), LensError> {
    let rendered = match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(session)?;
            json.push('\n');
            json
        }
        OutputFormat::Markdown => render_markdown(session),
    };
    fs::write(path, rendered).map_err(|e| LensError::Store(e.to_string()))
}

/// Human-readable session summary for sharing or archiving.
pub fn render_markdown(session: &ScanSession) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Scam Risk Report {}\n\n", session.id));
    out.push_str(&format!(
        "Created: {}\nUpdated: {}\n\n",
        session.created_at.to_rfc3339(),
        session.updated_at.to_rfc3339()
    ));
    out.push_str(&format!(
        "**Overall risk: {} ({}/100, confidence {:.0}%)**\n\n",
        level_label(session.overall_risk_level),
        session.overall_risk_score,
        session.confidence * 100.0
    ));
    out.push_str(&format!(
        "Threat category: {:?}\nCompletion: {}%\n\n",
        session.threat_category, session.completion_percentage
    ));

    if session.evidence.is_empty() {
        out.push_str("_No evidence analyzed yet._\n\n");
    }
    for item in &session.evidence {
        out.push_str(&format!(
            "## {} — {} ({}/100)\n",
            item.kind.label(),
            level_label(item.risk_level),
            item.risk_score
        ));
        if item.issues.is_empty() {
            out.push_str("- No issues found\n");
        }
        for issue in &item.issues {
            out.push_str(&format!("- {}\n", issue));
        }
        out.push('\n');
    }

    if !session.pattern_matches.is_empty() {
        out.push_str("## Matched scam patterns\n");
        for p in &session.pattern_matches {
            out.push_str(&format!(
                "- {} ({:.0}% confidence): {}\n",
                p.pattern_id,
                p.confidence * 100.0,
                p.description
            ));
        }
        out.push('\n');
    }

    if !session.cross_references.is_empty() {
        out.push_str("## Corroborating links between evidence\n");
        for c in &session.cross_references {
            out.push_str(&format!("- {}\n", c.description));
        }
        out.push('\n');
    }

    out.push_str("## Recommended next steps\n");
    for step in &session.next_steps {
        out.push_str(&format!("- {}\n", step));
    }
    out
}

fn level_label(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "Low",
        RiskLevel::Medium => "Medium",
        RiskLevel::High => "High",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::now_utc;
    use crate::core::types::{ScanContext, SessionStatus, ThreatCategory};

    fn session() -> ScanSession {
        let now = now_utc();
        ScanSession {
            id: "scan_abcdef0123456789".to_string(),
            created_at: now,
            updated_at: now,
            status: SessionStatus::InProgress,
            context: ScanContext::default(),
            evidence: vec![],
            signals: vec![],
            pattern_matches: vec![],
            cross_references: vec![],
            overall_risk_score: 0,
            overall_risk_level: RiskLevel::Low,
            threat_category: ThreatCategory::Unknown,
            confidence: 0.0,
            completion_percentage: 0,
            next_steps: vec!["Begin by adding evidence to analyze".to_string()],
        }
    }

    #[test]
    fn markdown_covers_empty_session() {
        let md = render_markdown(&session());
        assert!(md.contains("# Scam Risk Report scan_abcdef0123456789"));
        assert!(md.contains("_No evidence analyzed yet._"));
        assert!(md.contains("Begin by adding evidence to analyze"));
    }

    #[test]
    fn json_output_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_session(&session(), OutputFormat::Json, &path).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        let parsed: ScanSession = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.id, "scan_abcdef0123456789");
    }
}
