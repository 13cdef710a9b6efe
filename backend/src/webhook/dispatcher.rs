//! Review state tracking driven by verified callbacks.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use kyc_types::{ReviewAnswer, ReviewStatus};
use schemars::JsonSchema;
use serde::Serialize;
use tokio::sync::Mutex;

use super::payload::{ApplicantEvent, WebhookPayload};

/// Review state of an applicant as seen by this service.
///
/// Moves forward only: `CREATED < PENDING < UNKNOWN < {APPROVED, REJECTED}`.
/// `APPROVED` and `REJECTED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Created,
    Pending,
    /// Reviewed with an answer this service does not recognise
    Unknown,
    Approved,
    Rejected,
}

impl ReviewState {
    const fn rank(self) -> u8 {
        match self {
            Self::Created => 0,
            Self::Pending => 1,
            Self::Unknown => 2,
            Self::Approved | Self::Rejected => 3,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    #[must_use]
    pub const fn from_answer(answer: ReviewAnswer) -> Self {
        match answer {
            ReviewAnswer::Green => Self::Approved,
            ReviewAnswer::Red => Self::Rejected,
            ReviewAnswer::Unrecognized => Self::Unknown,
        }
    }

    /// State implied by a bare review status. `completed` without an answer
    /// implies nothing.
    #[must_use]
    pub const fn from_status(status: ReviewStatus) -> Option<Self> {
        match status {
            ReviewStatus::Init => Some(Self::Created),
            ReviewStatus::Pending
            | ReviewStatus::Prechecked
            | ReviewStatus::Queued
            | ReviewStatus::OnHold => Some(Self::Pending),
            ReviewStatus::Completed => None,
        }
    }

    /// Whether moving from `self` to `next` is a forward transition
    const fn advances_to(self, next: Self) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

/// Target state of an event: the answer wins over the status
fn target_state(event: &ApplicantEvent) -> Option<ReviewState> {
    event
        .review_answer()
        .map(ReviewState::from_answer)
        .or_else(|| event.review_status().and_then(ReviewState::from_status))
}

/// Locally tracked review record of one applicant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub applicant_id: String,
    pub state: ReviewState,
    /// Raw `reviewStatus` of the event that set `state`
    pub review_status: Option<String>,
    /// Raw `reviewAnswer` of the event that set `state`
    pub review_answer: Option<String>,
    pub last_event_type: Option<String>,
    #[schemars(with = "String")]
    pub created_at: DateTime<Utc>,
    #[schemars(with = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ReviewRecord {
    fn apply(&mut self, event: &ApplicantEvent, state: ReviewState, now: DateTime<Utc>) {
        self.state = state;
        self.review_status.clone_from(&event.review_status);
        self.review_answer = event.raw_review_answer().map(ToString::to_string);
        self.last_event_type.clone_from(&event.event_type);
        self.updated_at = now;
    }
}

/// What a dispatched callback did to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The payload does not reference an applicant
    Ignored,
    /// The event carries neither an answer nor a recognised status
    NoReview { applicant_id: String },
    /// The state moved forward (`from` is `None` for a first sighting)
    Transitioned {
        applicant_id: String,
        from: Option<ReviewState>,
        to: ReviewState,
    },
    /// Re-delivery of the state already recorded
    Unchanged {
        applicant_id: String,
        state: ReviewState,
    },
    /// Late or conflicting event that would move the state backwards
    Stale {
        applicant_id: String,
        current: ReviewState,
        reported: ReviewState,
    },
}

/// In-memory review records keyed by applicant id.
///
/// All updates go through one mutex, so concurrent deliveries for the same
/// applicant are applied one at a time.
#[derive(Debug, Default)]
pub struct ReviewStore {
    records: Mutex<HashMap<String, ReviewRecord>>,
}

impl ReviewStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, applicant_id: &str) -> Option<ReviewRecord> {
        self.records.lock().await.get(applicant_id).cloned()
    }

    /// Number of applicants with a recorded review
    pub async fn tracked_count(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Applies a verified callback payload.
    ///
    /// Idempotent: dispatching the same payload twice leaves the store as a
    /// single dispatch would.
    pub async fn dispatch(&self, payload: &WebhookPayload) -> DispatchOutcome {
        let WebhookPayload::Applicant(event) = payload else {
            return DispatchOutcome::Ignored;
        };
        let applicant_id = event.applicant_id.clone();
        let Some(target) = target_state(event) else {
            return DispatchOutcome::NoReview { applicant_id };
        };

        let now = Utc::now();
        let mut records = self.records.lock().await;

        let Some(record) = records.get_mut(&applicant_id) else {
            let mut record = ReviewRecord {
                applicant_id: applicant_id.clone(),
                state: target,
                review_status: None,
                review_answer: None,
                last_event_type: None,
                created_at: now,
                updated_at: now,
            };
            record.apply(event, target, now);
            records.insert(applicant_id.clone(), record);
            return DispatchOutcome::Transitioned {
                applicant_id,
                from: None,
                to: target,
            };
        };

        let current = record.state;
        if current == target {
            DispatchOutcome::Unchanged {
                applicant_id,
                state: current,
            }
        } else if current.advances_to(target) {
            record.apply(event, target, now);
            DispatchOutcome::Transitioned {
                applicant_id,
                from: Some(current),
                to: target,
            }
        } else {
            DispatchOutcome::Stale {
                applicant_id,
                current,
                reported: target,
            }
        }
    }
}
