use std::collections::HashMap;

use shared_types::webhook::{CALL_ANALYZED, CALL_ENDED, CALL_FAILED, CALL_STARTED};

use crate::error::CallEventError;

/// One lifecycle notification for a single outbound call
#[derive(Debug, Clone, PartialEq)]
pub struct CallEvent {
    pub call_id: String,
    pub occurred_at: i64, // Unix timestamp
    pub campaign_id: Option<String>,
    pub candidate_id: Option<String>,
    pub kind: CallEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallEventKind {
    Started,
    Ended { duration_seconds: Option<i64> },
    Analyzed(CallAnalysis),
    Failed { error_message: Option<String> },
}

/// Answers to the three fixed screening questions every campaign call asks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreeningAnswers {
    pub available_to_work: bool,
    pub interested: bool,
    pub knows_referee: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallAnalysis {
    pub answers: ScreeningAnswers,
    pub custom_answers: HashMap<String, String>,
    pub summary: String,
    pub sentiment: f64,
    pub key_points: Vec<String>,
    pub objections: Option<Vec<String>>,
    pub next_steps: Option<String>,
    pub transcript_url: Option<String>,
    pub recording_url: Option<String>,
}

impl Default for CallAnalysis {
    fn default() -> Self {
        Self {
            answers: ScreeningAnswers::default(),
            custom_answers: HashMap::new(),
            summary: String::new(),
            sentiment: 0.5,
            key_points: Vec::new(),
            objections: None,
            next_steps: None,
            transcript_url: None,
            recording_url: None,
        }
    }
}

impl CallEventKind {
    /// Wire name of the event type
    pub fn name(&self) -> &'static str {
        match self {
            CallEventKind::Started => CALL_STARTED,
            CallEventKind::Ended { .. } => CALL_ENDED,
            CallEventKind::Analyzed(_) => CALL_ANALYZED,
            CallEventKind::Failed { .. } => CALL_FAILED,
        }
    }
}

impl CallEvent {
    pub fn new(call_id: impl Into<String>, occurred_at: i64, kind: CallEventKind) -> Self {
        Self {
            call_id: call_id.into(),
            occurred_at,
            campaign_id: None,
            candidate_id: None,
            kind,
        }
    }

    pub fn with_campaign(mut self, campaign_id: impl Into<String>) -> Self {
        self.campaign_id = Some(campaign_id.into());
        self
    }

    pub fn with_candidate(mut self, candidate_id: impl Into<String>) -> Self {
        self.candidate_id = Some(candidate_id.into());
        self
    }

    pub fn event_type(&self) -> &'static str {
        self.kind.name()
    }

    /// Shape checks that must pass before anything is written
    pub fn validate(&self) -> Result<(), CallEventError> {
        if self.call_id.trim().is_empty() {
            return Err(CallEventError::invalid("call_id is empty"));
        }

        match &self.kind {
            CallEventKind::Ended {
                duration_seconds: Some(duration),
            } if *duration < 0 => Err(CallEventError::invalid(format!(
                "negative duration {duration} for call {}",
                self.call_id
            ))),
            CallEventKind::Analyzed(analysis)
                if !(0.0..=1.0).contains(&analysis.sentiment) =>
            {
                Err(CallEventError::invalid(format!(
                    "sentiment {} outside 0.0..=1.0 for call {}",
                    analysis.sentiment, self.call_id
                )))
            }
            _ => Ok(()),
        }
    }
}
