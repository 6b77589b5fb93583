//! Video metadata analyzer: image-style file heuristics plus duration
//! outliers and the optional deepfake verdict.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzers::deepfake::DeepfakeVerdict;
use crate::analyzers::image::is_generic_filename;
use crate::core::hash::evidence_id;
use crate::core::time::now_utc;
use crate::core::types::{EvidenceItem, EvidenceKind, RiskLevel};
use crate::pipeline::signal_map::map_issues;

pub const UNCOMMON_TYPE_SCORE: u8 = 15;
pub const OVERSIZED_SCORE: u8 = 10;
pub const GENERIC_FILENAME_SCORE: u8 = 10;
pub const DURATION_SCORE: u8 = 10;
pub const DEEPFAKE_SCORE: u8 = 30;
pub const DEEPFAKE_WEAK_SCORE: u8 = 15;

pub const SUSPICIOUS_FLOOR: u8 = 35;
pub const VIDEO_HIGH_FLOOR: u8 = 45;
pub const VIDEO_MEDIUM_FLOOR: u8 = 20;

pub const MIN_DURATION_SECS: f64 = 3.0;
pub const MAX_DURATION_SECS: f64 = 600.0;
pub const MAX_VIDEO_BYTES: u64 = 100 * 1024 * 1024;

/// Deepfake probability at which the strong signal fires.
pub const DEEPFAKE_PROB_FLOOR: f64 = 0.7;
pub const DEEPFAKE_WEAK_PROB_FLOOR: f64 = 0.4;

const COMMON_VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/quicktime",
    "video/webm",
    "video/x-matroska",
];

pub const DISCLAIMER_METADATA: &str =
    "Metadata checks cannot prove a video is genuine; convincing fakes can have clean metadata.";
pub const DISCLAIMER_VISUAL: &str =
    "Watch for unnatural blinking, lighting mismatches, and lip-sync drift when judging authenticity.";

/// Dimensions and duration extracted from the container, when decodable.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub duration_secs: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInput {
    pub filename: String,
    pub size_bytes: u64,
    pub mime_type: String,
    #[serde(default)]
    pub metadata: VideoMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoAnalysis {
    pub risk_score: u8,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub is_suspicious: bool,
    pub deepfake: Option<DeepfakeVerdict>,
}

/// Bound a metadata-extraction future with a deadline. Decode errors and
/// timeouts both degrade to "no metadata"; duration-dependent heuristics are
/// simply skipped.
pub async fn probe_with_timeout<F>(fut: F, deadline: Duration) -> VideoMetadata
where
    F: Future<Output = Result<VideoMetadata, crate::core::error::LensError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(Ok(meta)) => meta,
        Ok(Err(err)) => {
            debug!("video metadata extraction failed: {}", err);
            VideoMetadata::default()
        }
        Err(_) => {
            debug!("video metadata extraction timed out");
            VideoMetadata::default()
        }
    }
}

pub fn analyze_video(input: &VideoInput, deepfake: Option<&DeepfakeVerdict>) -> VideoAnalysis {
    let mut score: u32 = 0;
    let mut issues = Vec::new();

    if !input.mime_type.is_empty()
        && !COMMON_VIDEO_TYPES.contains(&input.mime_type.to_lowercase().as_str())
    {
        issues.push(format!("Uncommon video file type: {}", input.mime_type));
        score += UNCOMMON_TYPE_SCORE as u32;
    }

    if input.size_bytes > MAX_VIDEO_BYTES {
        issues.push("Unusually large file size for a shared video".to_string());
        score += OVERSIZED_SCORE as u32;
    }

    if is_generic_filename(&input.filename) {
        issues.push("Generic filename pattern, often seen on re-shared files".to_string());
        score += GENERIC_FILENAME_SCORE as u32;
    }

    if let Some(duration) = input.metadata.duration_secs {
        if duration < MIN_DURATION_SECS {
            issues.push("Very short duration, typical of looped or clipped fakes".to_string());
            score += DURATION_SCORE as u32;
        } else if duration > MAX_DURATION_SECS {
            issues.push("Unusually long duration for a personally shared video".to_string());
            score += DURATION_SCORE as u32;
        }
    }

    if let Some(verdict) = deepfake {
        if verdict.prob_fake >= DEEPFAKE_PROB_FLOOR {
            issues.push(format!(
                "Deepfake analysis flagged this video as likely synthetic ({}%)",
                (verdict.prob_fake * 100.0).round() as u32
            ));
            score += DEEPFAKE_SCORE as u32;
        } else if verdict.prob_fake >= DEEPFAKE_WEAK_PROB_FLOOR {
            issues.push(format!(
                "Deepfake analysis found weak manipulation indicators ({}%)",
                (verdict.prob_fake * 100.0).round() as u32
            ));
            score += DEEPFAKE_WEAK_SCORE as u32;
        }
    }

    let risk_score = score.min(100) as u8;
    let mut recommendations = Vec::new();
    if risk_score >= SUSPICIOUS_FLOOR {
        recommendations
            .push("Ask for a live video call before trusting this recording.".to_string());
    }
    // Two fixed educational entries, always appended, never scored.
    recommendations.push(DISCLAIMER_METADATA.to_string());
    recommendations.push(DISCLAIMER_VISUAL.to_string());

    VideoAnalysis {
        risk_score,
        issues,
        recommendations,
        is_suspicious: risk_score >= SUSPICIOUS_FLOOR,
        deepfake: deepfake.cloned(),
    }
}

pub fn video_risk_level(score: u8) -> RiskLevel {
    if score >= VIDEO_HIGH_FLOOR {
        RiskLevel::High
    } else if score >= VIDEO_MEDIUM_FLOOR {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub fn video_evidence(input: &VideoInput, analysis: &VideoAnalysis) -> EvidenceItem {
    let at = now_utc();
    let data = serde_json::json!({
        "filename": input.filename,
        "size_bytes": input.size_bytes,
        "mime_type": input.mime_type,
        "metadata": input.metadata,
        "deepfake": analysis.deepfake,
    });
    let id = evidence_id(EvidenceKind::Video, &data, at);
    let signals = map_issues(&id, EvidenceKind::Video, &analysis.issues);
    EvidenceItem {
        id,
        kind: EvidenceKind::Video,
        analyzed_at: at,
        data,
        signals,
        risk_score: analysis.risk_score,
        risk_level: video_risk_level(analysis.risk_score),
        issues: analysis.issues.clone(),
        recommendations: analysis.recommendations.clone(),
    }
}
