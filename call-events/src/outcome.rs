use serde::{Deserialize, Serialize};
use shared_types::{CandidateContactOutcome, ContactStatus};

use crate::event::{CallAnalysis, CallEvent};

/// How a new analysis combines with what is already known about a candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateOutcomePolicy {
    /// Every analysis replaces the previous answers
    #[default]
    Overwrite,
    /// Known answers are kept, only unknown ones are filled
    Merge,
}

impl CandidateOutcomePolicy {
    pub fn needs_prior(&self) -> bool {
        matches!(self, CandidateOutcomePolicy::Merge)
    }
}

/// Outcome to store for `candidate_id` after `analysis`.
///
/// `prior` is only consulted by the merge policy.
pub fn next_outcome(
    policy: CandidateOutcomePolicy,
    prior: Option<&CandidateContactOutcome>,
    candidate_id: &str,
    event: &CallEvent,
    analysis: &CallAnalysis,
) -> CandidateContactOutcome {
    let answers = analysis.answers;
    let overwrite = CandidateContactOutcome {
        candidate_id: candidate_id.to_string(),
        campaign_id: event.campaign_id.clone(),
        available_to_work: Some(answers.available_to_work),
        interested: Some(answers.interested),
        knows_referee: Some(answers.knows_referee),
        custom_responses: analysis.custom_answers.clone(),
        last_contact_at: Some(event.occurred_at),
        last_call_id: Some(event.call_id.clone()),
        contact_status: ContactStatus::Contacted,
    };

    let prior = match (policy, prior) {
        (CandidateOutcomePolicy::Merge, Some(prior)) => prior,
        _ => return overwrite,
    };

    let mut custom_responses = overwrite.custom_responses;
    custom_responses.extend(
        prior
            .custom_responses
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );

    let newer = prior
        .last_contact_at
        .map(|at| event.occurred_at >= at)
        .unwrap_or(true);

    CandidateContactOutcome {
        candidate_id: candidate_id.to_string(),
        campaign_id: overwrite.campaign_id.or_else(|| prior.campaign_id.clone()),
        available_to_work: prior.available_to_work.or(overwrite.available_to_work),
        interested: prior.interested.or(overwrite.interested),
        knows_referee: prior.knows_referee.or(overwrite.knows_referee),
        custom_responses,
        last_contact_at: if newer {
            overwrite.last_contact_at
        } else {
            prior.last_contact_at
        },
        last_call_id: if newer {
            overwrite.last_call_id
        } else {
            prior.last_call_id.clone()
        },
        contact_status: ContactStatus::Contacted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{CallEventKind, ScreeningAnswers};
    use std::collections::HashMap;

    fn analysis(available: bool, interested: bool, referee: bool) -> CallAnalysis {
        CallAnalysis {
            answers: ScreeningAnswers {
                available_to_work: available,
                interested,
                knows_referee: referee,
            },
            custom_answers: HashMap::from([("shift".to_string(), "night".to_string())]),
            ..Default::default()
        }
    }

    fn event(call_id: &str, at: i64, analysis: &CallAnalysis) -> CallEvent {
        CallEvent::new(call_id, at, CallEventKind::Analyzed(analysis.clone())).with_candidate("c9")
    }

    fn prior() -> CandidateContactOutcome {
        CandidateContactOutcome {
            candidate_id: "c9".to_string(),
            campaign_id: Some("camp_1".to_string()),
            available_to_work: Some(false),
            interested: None,
            knows_referee: Some(true),
            custom_responses: HashMap::from([("shift".to_string(), "day".to_string())]),
            last_contact_at: Some(500),
            last_call_id: Some("call_0".to_string()),
            contact_status: ContactStatus::Contacted,
        }
    }

    #[test]
    fn test_overwrite_replaces_answers() {
        let analysis = analysis(true, true, false);
        let prior = prior();
        let outcome = next_outcome(
            CandidateOutcomePolicy::Overwrite,
            Some(&prior),
            "c9",
            &event("call_1", 600, &analysis),
            &analysis,
        );

        assert_eq!(outcome.available_to_work, Some(true));
        assert_eq!(outcome.interested, Some(true));
        assert_eq!(outcome.knows_referee, Some(false));
        assert_eq!(outcome.custom_responses["shift"], "night");
        assert_eq!(outcome.last_contact_at, Some(600));
        assert_eq!(outcome.contact_status, ContactStatus::Contacted);
    }

    #[test]
    fn test_merge_keeps_known_answers() {
        let analysis = analysis(true, true, false);
        let prior = prior();
        let outcome = next_outcome(
            CandidateOutcomePolicy::Merge,
            Some(&prior),
            "c9",
            &event("call_1", 600, &analysis),
            &analysis,
        );

        assert_eq!(outcome.available_to_work, Some(false));
        assert_eq!(outcome.interested, Some(true));
        assert_eq!(outcome.knows_referee, Some(true));
        assert_eq!(outcome.custom_responses["shift"], "day");
        assert_eq!(outcome.campaign_id.as_deref(), Some("camp_1"));
        assert_eq!(outcome.last_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_merge_keeps_latest_contact_time() {
        let analysis = analysis(true, true, true);
        let prior = prior();
        let outcome = next_outcome(
            CandidateOutcomePolicy::Merge,
            Some(&prior),
            "c9",
            &event("call_old", 400, &analysis),
            &analysis,
        );

        assert_eq!(outcome.last_contact_at, Some(500));
        assert_eq!(outcome.last_call_id.as_deref(), Some("call_0"));
    }

    #[test]
    fn test_merge_without_prior_behaves_like_overwrite() {
        let analysis = analysis(true, false, true);
        let event = event("call_1", 600, &analysis);

        let merged = next_outcome(CandidateOutcomePolicy::Merge, None, "c9", &event, &analysis);
        let overwritten =
            next_outcome(CandidateOutcomePolicy::Overwrite, None, "c9", &event, &analysis);
        assert_eq!(merged, overwritten);
    }

    #[test]
    fn test_policy_deserialization() {
        let policy: CandidateOutcomePolicy = serde_json::from_str("\"merge\"").unwrap();
        assert_eq!(policy, CandidateOutcomePolicy::Merge);
        assert!(policy.needs_prior());
        assert_eq!(CandidateOutcomePolicy::default(), CandidateOutcomePolicy::Overwrite);
    }
}
