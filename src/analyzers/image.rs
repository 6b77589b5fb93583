//! Image metadata analyzer: file type, size and naming heuristics only, no
//! pixel analysis.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::hash::evidence_id;
use crate::core::time::now_utc;
use crate::core::types::{EvidenceItem, EvidenceKind, RiskLevel};
use crate::pipeline::signal_map::map_issues;

pub const UNCOMMON_TYPE_SCORE: u8 = 15;
pub const OVERSIZED_SCORE: u8 = 10;
pub const GENERIC_FILENAME_SCORE: u8 = 10;

pub const SUSPICIOUS_FLOOR: u8 = 35;
pub const MEDIA_HIGH_FLOOR: u8 = 45;
pub const MEDIA_MEDIUM_FLOOR: u8 = 20;

pub const MAX_IMAGE_BYTES: u64 = 25 * 1024 * 1024;

const COMMON_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/heic",
];

pub const METADATA_DISCLAIMER: &str =
    "Absence of metadata anomalies is not proof that an image is authentic.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageInput {
    pub filename: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub risk_score: u8,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub is_suspicious: bool,
}

pub fn analyze_image(input: &ImageInput) -> ImageAnalysis {
    let mut score: u32 = 0;
    let mut issues = Vec::new();

    if !input.mime_type.is_empty()
        && !COMMON_IMAGE_TYPES.contains(&input.mime_type.to_lowercase().as_str())
    {
        issues.push(format!("Uncommon image file type: {}", input.mime_type));
        score += UNCOMMON_TYPE_SCORE as u32;
    }

    if input.size_bytes > MAX_IMAGE_BYTES {
        issues.push("Unusually large file size for an image".to_string());
        score += OVERSIZED_SCORE as u32;
    }

    if is_generic_filename(&input.filename) {
        issues.push("Generic filename pattern, often seen on re-shared files".to_string());
        score += GENERIC_FILENAME_SCORE as u32;
    }

    let risk_score = score.min(100) as u8;
    ImageAnalysis {
        risk_score,
        issues,
        recommendations: vec![
            METADATA_DISCLAIMER.to_string(),
            "Use a reverse image search to check whether this image appears elsewhere."
                .to_string(),
        ],
        is_suspicious: risk_score >= SUSPICIOUS_FLOOR,
    }
}

pub fn is_generic_filename(filename: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^(?:img|image|photo|pic|screenshot|download|untitled)[-_ ]?\d*$|^\d+$")
            .expect("static regex")
    });
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename)
        .to_lowercase();
    re.is_match(&stem)
}

pub fn media_risk_level(score: u8) -> RiskLevel {
    if score >= MEDIA_HIGH_FLOOR {
        RiskLevel::High
    } else if score >= MEDIA_MEDIUM_FLOOR {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub fn image_evidence(input: &ImageInput, analysis: &ImageAnalysis) -> EvidenceItem {
    let at = now_utc();
    let data = serde_json::json!({
        "filename": input.filename,
        "size_bytes": input.size_bytes,
        "mime_type": input.mime_type,
    });
    let id = evidence_id(EvidenceKind::Image, &data, at);
    let signals = map_issues(&id, EvidenceKind::Image, &analysis.issues);
    EvidenceItem {
        id,
        kind: EvidenceKind::Image,
        analyzed_at: at,
        data,
        signals,
        risk_score: analysis.risk_score,
        risk_level: media_risk_level(analysis.risk_score),
        issues: analysis.issues.clone(),
        recommendations: analysis.recommendations.clone(),
    }
}
