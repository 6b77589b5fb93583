//! Session state machine: accumulates evidence over the guided workflow,
//! recomputes the assessment after every mutation, and persists each change.

use tracing::{info, warn};

use crate::core::hash::session_id;
use crate::core::store::SessionStore;
use crate::core::time::now_utc;
use crate::core::types::{
    ContactOrigin, ContextPatch, EvidenceItem, EvidenceKind, RiskLevel, ScanContext, ScanSession,
    SessionStatus, ThreatCategory, WorkflowStep,
};
use crate::pipeline::aggregate::{calculate_overall_risk, determine_threat_category};
use crate::pipeline::crossref::find_cross_references;
use crate::pipeline::matcher::detect_patterns;
use crate::pipeline::next_steps::{generate_next_steps, STEP_INITIAL};

pub const WORKFLOW_STEP_COUNT: usize = 5;

type ChangeListener = Box<dyn Fn(&ScanSession) + Send>;

/// Single-writer session container. Holds the durable list, the "current
/// session" slot, and an explicit list of change listeners; every mutation
/// recomputes derived state and persists best-effort.
pub struct SessionManager {
    sessions: Vec<ScanSession>,
    current: Option<String>,
    store: Box<dyn SessionStore>,
    listeners: Vec<ChangeListener>,
    created_count: usize,
}

impl SessionManager {
    /// Load failures degrade to an empty list; the store stays attached for
    /// later saves.
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        let sessions = match store.load_all() {
            Ok(sessions) => sessions,
            Err(err) => {
                warn!("session store load failed, starting empty: {}", err);
                Vec::new()
            }
        };
        Self {
            sessions,
            current: None,
            store,
            listeners: Vec::new(),
            created_count: 0,
        }
    }

    pub fn subscribe(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    pub fn current_session(&self) -> Option<&ScanSession> {
        let id = self.current.as_deref()?;
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn sessions(&self) -> &[ScanSession] {
        &self.sessions
    }

    pub fn load_session(&self, id: &str) -> Option<&ScanSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Allocate a new in-progress session and make it current.
    pub fn create_session(&mut self, context: ScanContext) -> String {
        let now = now_utc();
        self.created_count += 1;
        let id = session_id(now, self.created_count);
        let session = ScanSession {
            id: id.clone(),
            created_at: now,
            updated_at: now,
            status: SessionStatus::InProgress,
            context,
            evidence: vec![],
            signals: vec![],
            pattern_matches: vec![],
            cross_references: vec![],
            overall_risk_score: 0,
            overall_risk_level: RiskLevel::Low,
            threat_category: ThreatCategory::Unknown,
            confidence: 0.0,
            completion_percentage: 0,
            next_steps: vec![STEP_INITIAL.to_string()],
        };
        self.sessions.push(session);
        self.current = Some(id.clone());
        info!("created session {}", id);
        self.persist_and_notify(&id);
        id
    }

    /// Append evidence to the current session and recompute every derived
    /// field from scratch. No current session means no-op.
    pub fn add_evidence(&mut self, item: EvidenceItem) -> bool {
        let Some(session) = self.current_session_mut() else {
            warn!("add_evidence called with no current session");
            return false;
        };
        if session.status != SessionStatus::InProgress {
            warn!("add_evidence ignored for {} session", status_label(session.status));
            return false;
        }
        session.evidence.push(item);
        let id = session.id.clone();
        self.recompute(&id);
        self.touch_and_persist(&id);
        true
    }

    /// Shallow-merge into the context. Context alone does not change the
    /// evidence-derived signals, so no recompute happens here.
    pub fn update_context(&mut self, patch: ContextPatch) -> bool {
        let Some(session) = self.current_session_mut() else {
            warn!("update_context called with no current session");
            return false;
        };
        if session.status == SessionStatus::Completed {
            return false;
        }
        session.context.apply(patch);
        let id = session.id.clone();
        self.touch_and_persist(&id);
        true
    }

    pub fn complete_session(&mut self) -> bool {
        self.transition_current(SessionStatus::InProgress, SessionStatus::Completed)
    }

    pub fn pause_session(&mut self) -> bool {
        self.transition_current(SessionStatus::InProgress, SessionStatus::Paused)
    }

    /// Load a stored session into the current slot, reopening it if paused.
    pub fn resume_session(&mut self, id: &str) -> bool {
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        if session.status == SessionStatus::Paused {
            session.status = SessionStatus::InProgress;
            session.updated_at = now_utc();
        }
        let id = session.id.clone();
        self.current = Some(id.clone());
        self.touch_and_persist(&id);
        true
    }

    pub fn delete_session(&mut self, id: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        if self.sessions.len() == before {
            return false;
        }
        if self.current.as_deref() == Some(id) {
            self.current = None;
        }
        if let Err(err) = self.store.save_all(&self.sessions) {
            warn!("session persist failed after delete: {}", err);
        }
        true
    }

    /// The five step descriptors, priority-ordered for the current context.
    pub fn workflow_steps(&self) -> Vec<WorkflowStep> {
        let Some(session) = self.current_session() else {
            return vec![];
        };
        let origin = session.context.origin;
        let mut steps: Vec<WorkflowStep> = EvidenceKind::ALL
            .iter()
            .map(|kind| WorkflowStep {
                kind: *kind,
                title: step_title(*kind).to_string(),
                description: step_description(*kind).to_string(),
                priority: step_priority(*kind, origin),
                required: step_required(*kind, origin),
                completed: session.has_evidence(*kind),
            })
            .collect();
        steps.sort_by_key(|s| s.priority);
        steps
    }

    /// First incomplete step in priority order, or None when all are done.
    pub fn next_recommended_step(&self) -> Option<WorkflowStep> {
        self.workflow_steps().into_iter().find(|s| !s.completed)
    }

    fn current_session_mut(&mut self) -> Option<&mut ScanSession> {
        let id = self.current.clone()?;
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    fn transition_current(&mut self, from: SessionStatus, to: SessionStatus) -> bool {
        let Some(session) = self.current_session_mut() else {
            warn!("status transition requested with no current session");
            return false;
        };
        if session.status != from {
            return false;
        }
        session.status = to;
        let id = session.id.clone();
        self.touch_and_persist(&id);
        true
    }

    /// Full recomputation of every derived field from context + evidence.
    fn recompute(&mut self, id: &str) {
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == id) else {
            return;
        };
        session.signals = session
            .evidence
            .iter()
            .flat_map(|e| e.signals.iter().cloned())
            .collect();
        session.pattern_matches = detect_patterns(&session.evidence);
        session.cross_references = find_cross_references(&session.evidence);
        let risk = calculate_overall_risk(
            &session.evidence,
            &session.pattern_matches,
            &session.cross_references,
        );
        session.overall_risk_score = risk.score;
        session.overall_risk_level = risk.level;
        session.confidence = risk.confidence;
        session.threat_category = determine_threat_category(&session.pattern_matches);
        session.completion_percentage =
            (session.distinct_evidence_kinds() * 100 / WORKFLOW_STEP_COUNT) as u8;
        let patterns = session.pattern_matches.clone();
        session.next_steps = generate_next_steps(session, &patterns, &risk);
    }

    fn touch_and_persist(&mut self, id: &str) {
        if let Some(session) = self.sessions.iter_mut().find(|s| s.id == id) {
            session.updated_at = now_utc();
        }
        self.persist_and_notify(id);
    }

    /// Persistence is best-effort: on failure the in-memory state stays the
    /// source of truth for the rest of the process lifetime.
    fn persist_and_notify(&mut self, id: &str) {
        if let Err(err) = self.store.save_all(&self.sessions) {
            warn!("session persist failed: {}", err);
        }
        if let Some(session) = self.sessions.iter().find(|s| s.id == id) {
            for listener in &self.listeners {
                listener(session);
            }
        }
    }
}

fn status_label(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::InProgress => "in-progress",
        SessionStatus::Completed => "completed",
        SessionStatus::Paused => "paused",
    }
}

fn step_title(kind: EvidenceKind) -> &'static str {
    match kind {
        EvidenceKind::Message => "Analyze the message",
        EvidenceKind::Profile => "Check the sender's profile",
        EvidenceKind::Email => "Inspect email headers",
        EvidenceKind::Image => "Review shared images",
        EvidenceKind::Video => "Review shared videos",
    }
}

fn step_description(kind: EvidenceKind) -> &'static str {
    match kind {
        EvidenceKind::Message => "Paste the suspicious message text for language analysis",
        EvidenceKind::Profile => "Enter the sender's profile details for account heuristics",
        EvidenceKind::Email => "Paste the raw email headers to verify authentication",
        EvidenceKind::Image => "Add any image the sender shared for metadata checks",
        EvidenceKind::Video => "Add any video the sender shared for metadata and deepfake checks",
    }
}

/// Base order is message, profile, email, image, video; the contact origin
/// promotes the channel the scam arrived on.
fn step_priority(kind: EvidenceKind, origin: Option<ContactOrigin>) -> u8 {
    let base = match kind {
        EvidenceKind::Message => 1,
        EvidenceKind::Profile => 2,
        EvidenceKind::Email => 3,
        EvidenceKind::Image => 4,
        EvidenceKind::Video => 5,
    };
    match origin {
        Some(ContactOrigin::Email) => match kind {
            EvidenceKind::Email => 1,
            EvidenceKind::Message => 2,
            EvidenceKind::Profile => 3,
            other => step_priority(other, None),
        },
        Some(ContactOrigin::SocialMedia) => match kind {
            EvidenceKind::Profile => 1,
            EvidenceKind::Message => 2,
            EvidenceKind::Email => 5,
            EvidenceKind::Image => 3,
            EvidenceKind::Video => 4,
        },
        Some(ContactOrigin::DirectMessage) => match kind {
            EvidenceKind::Message => 1,
            EvidenceKind::Profile => 2,
            EvidenceKind::Email => 5,
            EvidenceKind::Image => 3,
            EvidenceKind::Video => 4,
        },
        _ => base,
    }
}

fn step_required(kind: EvidenceKind, origin: Option<ContactOrigin>) -> bool {
    match origin {
        Some(ContactOrigin::Email) => kind == EvidenceKind::Email,
        Some(ContactOrigin::DirectMessage) | Some(ContactOrigin::SocialMedia) => {
            kind == EvidenceKind::Message
        }
        _ => false,
    }
}
