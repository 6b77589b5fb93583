use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which kind of user-submitted evidence produced a finding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Message,
    Email,
    Image,
    Profile,
    Video,
}

impl EvidenceKind {
    pub const ALL: [EvidenceKind; 5] = [
        EvidenceKind::Message,
        EvidenceKind::Email,
        EvidenceKind::Image,
        EvidenceKind::Profile,
        EvidenceKind::Video,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EvidenceKind::Message => "message",
            EvidenceKind::Email => "email",
            EvidenceKind::Image => "image",
            EvidenceKind::Profile => "profile",
            EvidenceKind::Video => "video",
        }
    }
}

/// Closed taxonomy of machine-matchable signal types. Every key referenced by
/// the pattern library and the correlation rules is a variant here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Urgency,
    Credentials,
    SuspiciousLink,
    Reward,
    Impersonation,
    GenericGreeting,
    SpfFail,
    DkimFail,
    DmarcFail,
    SpoofedSender,
    MissingSender,
    ReturnPathMissing,
    LongRoutingChain,
    GenericUsername,
    EmptyBio,
    ScamKeywords,
    FollowerAnomaly,
    NoPosts,
    NewAccount,
    UncommonFormat,
    OversizedFile,
    GenericFilename,
    DurationAnomaly,
    Deepfake,
}

/// Severity mapped from a signal's score via fixed thresholds, independent of
/// any per-analyzer risk-level thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

pub const SEVERITY_HIGH_FLOOR: u8 = 20;
pub const SEVERITY_MEDIUM_FLOOR: u8 = 10;

impl Severity {
    pub fn from_score(score: u8) -> Self {
        if score >= SEVERITY_HIGH_FLOOR {
            Severity::High
        } else if score >= SEVERITY_MEDIUM_FLOOR {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// An atomic, typed observation extracted from one piece of evidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    pub id: String,
    pub kind: SignalKind,
    pub severity: Severity,
    pub score: u8,
    pub source: EvidenceKind,
}

impl Signal {
    pub fn new(id: impl Into<String>, kind: SignalKind, score: u8, source: EvidenceKind) -> Self {
        Self {
            id: id.into(),
            kind,
            severity: Severity::from_score(score),
            score,
            source,
        }
    }
}

/// Evidence-level and session-level risk buckets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// One analyzed piece of user-submitted content. Created atomically by an
/// analyzer call and immutable afterwards; owned by the session that holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub id: String,
    pub kind: EvidenceKind,
    pub analyzed_at: DateTime<Utc>,
    /// Opaque raw-input snapshot, shape varies per analyzer.
    pub data: serde_json::Value,
    pub signals: Vec<Signal>,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    /// Human-readable findings retained for display.
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

impl EvidenceItem {
    pub fn has_signal(&self, kind: SignalKind) -> bool {
        self.signals.iter().any(|s| s.kind == kind)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ThreatCategory {
    Phishing,
    RomanceScam,
    InvestmentFraud,
    Impersonation,
    SyntheticMedia,
    Unknown,
}

/// Output of matching one threat pattern against the accumulated evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternMatch {
    pub pattern_id: String,
    pub category: ThreatCategory,
    /// 0..1, rounded to two decimals.
    pub confidence: f64,
    pub matched_signals: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    Inconsistency,
    Correlation,
    Confirmation,
}

/// A detected relationship spanning two or more evidence items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossReference {
    pub check_type: CheckType,
    pub evidence_ids: Vec<String>,
    pub description: String,
    /// Additive contribution to the overall confidence, not a probability.
    pub impact_on_confidence: f64,
}

/// Overall score/level/confidence triple produced by the risk aggregator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub score: u8,
    pub level: RiskLevel,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContactOrigin {
    Email,
    DirectMessage,
    SocialMedia,
    Website,
    PhoneCall,
    Other,
}

/// Free-form investigation metadata, mutable until the session completes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanContext {
    pub origin: Option<ContactOrigin>,
    pub sender_name: Option<String>,
    pub sender_handle: Option<String>,
    pub requested_action: Option<String>,
    pub notes: Option<String>,
}

/// Shallow-merge patch for `ScanContext`; `None` fields leave the existing
/// value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextPatch {
    pub origin: Option<ContactOrigin>,
    pub sender_name: Option<String>,
    pub sender_handle: Option<String>,
    pub requested_action: Option<String>,
    pub notes: Option<String>,
}

impl ScanContext {
    pub fn apply(&mut self, patch: ContextPatch) {
        if patch.origin.is_some() {
            self.origin = patch.origin;
        }
        if patch.sender_name.is_some() {
            self.sender_name = patch.sender_name;
        }
        if patch.sender_handle.is_some() {
            self.sender_handle = patch.sender_handle;
        }
        if patch.requested_action.is_some() {
            self.requested_action = patch.requested_action;
        }
        if patch.notes.is_some() {
            self.notes = patch.notes;
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Paused,
}

/// The aggregate root for one user investigation. All derived fields are a
/// pure function of `context` + `evidence` and are recomputed in full on every
/// evidence mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub context: ScanContext,
    pub evidence: Vec<EvidenceItem>,
    pub signals: Vec<Signal>,
    pub pattern_matches: Vec<PatternMatch>,
    pub cross_references: Vec<CrossReference>,
    pub overall_risk_score: u8,
    pub overall_risk_level: RiskLevel,
    pub threat_category: ThreatCategory,
    pub confidence: f64,
    pub completion_percentage: u8,
    pub next_steps: Vec<String>,
}

impl ScanSession {
    pub fn has_evidence(&self, kind: EvidenceKind) -> bool {
        self.evidence.iter().any(|e| e.kind == kind)
    }

    pub fn distinct_evidence_kinds(&self) -> usize {
        let mut kinds: Vec<EvidenceKind> = self.evidence.iter().map(|e| e.kind).collect();
        kinds.sort();
        kinds.dedup();
        kinds.len()
    }
}

/// One step of the guided evidence-collection workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub kind: EvidenceKind,
    pub title: String,
    pub description: String,
    pub priority: u8,
    pub required: bool,
    pub completed: bool,
}
