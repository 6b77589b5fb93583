//! Static catalog of threat patterns and the correlation rules attached to
//! them. Rules are named strategies dispatched off a tagged variant, so the
//! library stays serializable and inspectable.

use crate::core::types::{CheckType, EvidenceItem, EvidenceKind, RiskLevel, SignalKind, ThreatCategory};

/// Result of evaluating one correlation rule against an evidence subset.
#[derive(Debug, Clone)]
pub struct RuleMatch {
    pub confidence: f64,
    pub description: String,
}

/// Named correlation strategies. Each variant implements the same
/// evaluate-over-evidence contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Email authentication failure combined with a credential or urgency lure
    /// in the message.
    AuthFailureCredentialLure,
    /// Profile and message evidence where one or both are high-risk.
    HighRiskProfileMessaging,
    /// Spoofed sender headers confirmed by impersonation language.
    SpoofedSenderImpersonation,
    /// Deepfake-flagged media tied to a fresh or auto-generated profile.
    SyntheticMediaFreshProfile,
    /// Prize or reward lure corroborated by a suspicious link.
    RewardLureWithLink,
    /// Established, low-risk profile contradicting a high-risk message.
    EstablishedProfileContradiction,
}

#[derive(Debug, Clone, Copy)]
pub struct CorrelationRule {
    pub id: &'static str,
    pub check_type: CheckType,
    pub evidence_kinds: &'static [EvidenceKind],
    pub kind: RuleKind,
}

impl CorrelationRule {
    /// Pure, stateless, deterministic predicate over the evidence subset.
    pub fn evaluate(&self, evidence: &[&EvidenceItem]) -> Option<RuleMatch> {
        match self.kind {
            RuleKind::AuthFailureCredentialLure => {
                let auth_fail = evidence.iter().any(|e| {
                    e.kind == EvidenceKind::Email
                        && (e.has_signal(SignalKind::SpfFail)
                            || e.has_signal(SignalKind::DkimFail)
                            || e.has_signal(SignalKind::DmarcFail))
                });
                let lure = evidence.iter().any(|e| {
                    e.kind == EvidenceKind::Message
                        && (e.has_signal(SignalKind::Credentials)
                            || e.has_signal(SignalKind::Urgency))
                });
                if auth_fail && lure {
                    Some(RuleMatch {
                        confidence: 0.8,
                        description:
                            "Failed sender authentication combined with a credential or urgency lure"
                                .to_string(),
                    })
                } else {
                    None
                }
            }
            RuleKind::HighRiskProfileMessaging => {
                let profile = evidence.iter().find(|e| e.kind == EvidenceKind::Profile)?;
                let message = evidence.iter().find(|e| e.kind == EvidenceKind::Message)?;
                let profile_high = profile.risk_level == RiskLevel::High;
                let message_high = message.risk_level == RiskLevel::High;
                if profile_high && message_high {
                    Some(RuleMatch {
                        confidence: 0.9,
                        description: "Both the sender profile and the message are high-risk"
                            .to_string(),
                    })
                } else if profile_high || message_high {
                    Some(RuleMatch {
                        confidence: 0.6,
                        description: "Either the sender profile or the message is high-risk"
                            .to_string(),
                    })
                } else {
                    None
                }
            }
            RuleKind::SpoofedSenderImpersonation => {
                let spoofed = evidence.iter().any(|e| {
                    e.kind == EvidenceKind::Email && e.has_signal(SignalKind::SpoofedSender)
                });
                let impersonation = evidence.iter().any(|e| {
                    e.kind == EvidenceKind::Message && e.has_signal(SignalKind::Impersonation)
                });
                if spoofed && impersonation {
                    Some(RuleMatch {
                        confidence: 0.7,
                        description:
                            "Spoofed sender headers confirmed by brand-impersonation language"
                                .to_string(),
                    })
                } else {
                    None
                }
            }
            RuleKind::SyntheticMediaFreshProfile => {
                let deepfake = evidence.iter().any(|e| {
                    e.kind == EvidenceKind::Video && e.has_signal(SignalKind::Deepfake)
                });
                let fresh_profile = evidence.iter().any(|e| {
                    e.kind == EvidenceKind::Profile
                        && (e.has_signal(SignalKind::NewAccount)
                            || e.has_signal(SignalKind::GenericUsername))
                });
                if deepfake && fresh_profile {
                    Some(RuleMatch {
                        confidence: 0.75,
                        description:
                            "Deepfake-flagged video tied to a new or auto-generated profile"
                                .to_string(),
                    })
                } else {
                    None
                }
            }
            RuleKind::RewardLureWithLink => {
                let reward = evidence.iter().any(|e| {
                    e.kind == EvidenceKind::Message && e.has_signal(SignalKind::Reward)
                });
                let link = evidence
                    .iter()
                    .any(|e| e.has_signal(SignalKind::SuspiciousLink));
                if reward && link {
                    Some(RuleMatch {
                        confidence: 0.65,
                        description: "Prize or reward lure delivered alongside a suspicious link"
                            .to_string(),
                    })
                } else {
                    None
                }
            }
            RuleKind::EstablishedProfileContradiction => {
                let profile = evidence.iter().find(|e| e.kind == EvidenceKind::Profile)?;
                let message = evidence.iter().find(|e| e.kind == EvidenceKind::Message)?;
                if profile.risk_level == RiskLevel::Low && message.risk_level == RiskLevel::High {
                    Some(RuleMatch {
                        confidence: 0.5,
                        description:
                            "High-risk message sent from an apparently established profile; the account may be compromised or copied"
                                .to_string(),
                    })
                } else {
                    None
                }
            }
        }
    }
}

/// A named archetype of scam behavior.
#[derive(Debug, Clone, Copy)]
pub struct ThreatPattern {
    pub id: &'static str,
    pub name: &'static str,
    pub category: ThreatCategory,
    pub description: &'static str,
    pub signal_kinds: &'static [SignalKind],
    pub required_signals: usize,
    pub rules: &'static [CorrelationRule],
    /// 0..1 multiplier applied to the combined confidence.
    pub confidence_weight: f64,
}

const AUTH_FAILURE_CREDENTIAL_LURE: CorrelationRule = CorrelationRule {
    id: "auth_failure_credential_lure",
    check_type: CheckType::Confirmation,
    evidence_kinds: &[EvidenceKind::Email, EvidenceKind::Message],
    kind: RuleKind::AuthFailureCredentialLure,
};

const HIGH_RISK_PROFILE_MESSAGING: CorrelationRule = CorrelationRule {
    id: "high_risk_profile_messaging",
    check_type: CheckType::Correlation,
    evidence_kinds: &[EvidenceKind::Profile, EvidenceKind::Message],
    kind: RuleKind::HighRiskProfileMessaging,
};

const SPOOFED_SENDER_IMPERSONATION: CorrelationRule = CorrelationRule {
    id: "spoofed_sender_impersonation",
    check_type: CheckType::Confirmation,
    evidence_kinds: &[EvidenceKind::Email, EvidenceKind::Message],
    kind: RuleKind::SpoofedSenderImpersonation,
};

const SYNTHETIC_MEDIA_FRESH_PROFILE: CorrelationRule = CorrelationRule {
    id: "synthetic_media_fresh_profile",
    check_type: CheckType::Correlation,
    evidence_kinds: &[EvidenceKind::Video, EvidenceKind::Profile],
    kind: RuleKind::SyntheticMediaFreshProfile,
};

const REWARD_LURE_WITH_LINK: CorrelationRule = CorrelationRule {
    id: "reward_lure_with_link",
    check_type: CheckType::Correlation,
    evidence_kinds: &[EvidenceKind::Message, EvidenceKind::Email],
    kind: RuleKind::RewardLureWithLink,
};

const ESTABLISHED_PROFILE_CONTRADICTION: CorrelationRule = CorrelationRule {
    id: "established_profile_contradiction",
    check_type: CheckType::Inconsistency,
    evidence_kinds: &[EvidenceKind::Profile, EvidenceKind::Message],
    kind: RuleKind::EstablishedProfileContradiction,
};

/// Immutable pattern catalog, loaded once.
pub const PATTERNS: &[ThreatPattern] = &[
    ThreatPattern {
        id: "credential_phishing",
        name: "Credential phishing",
        category: ThreatCategory::Phishing,
        description: "Urgent request for credentials backed by failed sender authentication",
        signal_kinds: &[
            SignalKind::Urgency,
            SignalKind::Credentials,
            SignalKind::SuspiciousLink,
            SignalKind::SpfFail,
            SignalKind::DkimFail,
            SignalKind::DmarcFail,
            SignalKind::SpoofedSender,
        ],
        required_signals: 2,
        rules: &[AUTH_FAILURE_CREDENTIAL_LURE, SPOOFED_SENDER_IMPERSONATION],
        confidence_weight: 0.9,
    },
    ThreatPattern {
        id: "mass_phishing",
        name: "Mass-mailed phishing",
        category: ThreatCategory::Phishing,
        description: "Generic bulk mailing with suspicious delivery characteristics",
        signal_kinds: &[
            SignalKind::GenericGreeting,
            SignalKind::SuspiciousLink,
            SignalKind::LongRoutingChain,
            SignalKind::MissingSender,
        ],
        required_signals: 2,
        rules: &[],
        confidence_weight: 0.6,
    },
    ThreatPattern {
        id: "romance_scam",
        name: "Romance scam",
        category: ThreatCategory::RomanceScam,
        description: "Fresh or fabricated profile building a relationship toward a payout",
        signal_kinds: &[
            SignalKind::GenericUsername,
            SignalKind::NewAccount,
            SignalKind::EmptyBio,
            SignalKind::ScamKeywords,
            SignalKind::Deepfake,
            SignalKind::Urgency,
        ],
        required_signals: 2,
        rules: &[HIGH_RISK_PROFILE_MESSAGING, SYNTHETIC_MEDIA_FRESH_PROFILE],
        confidence_weight: 0.8,
    },
    ThreatPattern {
        id: "investment_fraud",
        name: "Investment fraud",
        category: ThreatCategory::InvestmentFraud,
        description: "Guaranteed-return or prize language pushing toward a payment",
        signal_kinds: &[
            SignalKind::Reward,
            SignalKind::ScamKeywords,
            SignalKind::SuspiciousLink,
            SignalKind::Urgency,
        ],
        required_signals: 2,
        rules: &[REWARD_LURE_WITH_LINK],
        confidence_weight: 0.85,
    },
    ThreatPattern {
        id: "impersonation",
        name: "Impersonation",
        category: ThreatCategory::Impersonation,
        description: "Sender masquerading as a known brand, contact or authority",
        signal_kinds: &[
            SignalKind::Impersonation,
            SignalKind::SpoofedSender,
            SignalKind::GenericUsername,
            SignalKind::Deepfake,
        ],
        required_signals: 2,
        rules: &[
            HIGH_RISK_PROFILE_MESSAGING,
            SPOOFED_SENDER_IMPERSONATION,
            ESTABLISHED_PROFILE_CONTRADICTION,
        ],
        confidence_weight: 0.85,
    },
    ThreatPattern {
        id: "synthetic_media",
        name: "Synthetic media",
        category: ThreatCategory::SyntheticMedia,
        description: "Manipulated or generated media used to add credibility",
        signal_kinds: &[
            SignalKind::Deepfake,
            SignalKind::DurationAnomaly,
            SignalKind::UncommonFormat,
            SignalKind::OversizedFile,
            SignalKind::GenericFilename,
        ],
        required_signals: 2,
        rules: &[SYNTHETIC_MEDIA_FRESH_PROFILE],
        confidence_weight: 0.75,
    },
];
