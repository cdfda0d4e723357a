use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::dto::attempt_dto::{AttemptStatusResponse, AttemptView, RecordAnswerRequest};
use crate::error::{Error, Result};
use crate::models::attempt::{Attempt, AttemptState, SubmitTrigger};
use crate::services::attempt_registry::{ActivationConflict, AttemptRegistry};
use crate::services::deadline_scheduler::DeadlineScheduler;
use crate::services::scoring_service::ScoringService;
use crate::services::test_service::TestService;
use crate::store::attempts::AttemptStore;
use crate::utils::time::seconds_until;

/// The attempt lifecycle: guarded creation, incremental answer capture,
/// idempotent submission, terminal-result lookup.
#[derive(Clone)]
pub struct AttemptService {
    store: Arc<AttemptStore>,
    registry: Arc<AttemptRegistry>,
    tests: Arc<TestService>,
    scheduler: DeadlineScheduler,
}

impl AttemptService {
    pub fn new(
        store: Arc<AttemptStore>,
        registry: Arc<AttemptRegistry>,
        tests: Arc<TestService>,
        scheduler: DeadlineScheduler,
    ) -> Self {
        Self {
            store,
            registry,
            tests,
            scheduler,
        }
    }

    /// Starts a new attempt for (learner, test) unless the pair already
    /// holds one. The conflict outcomes carry the existing attempt so a
    /// reloading client can resume or render the result directly.
    pub fn begin(&self, learner_id: Uuid, test_id: Uuid) -> Result<AttemptView> {
        let test = self.tests.get_test_by_id(test_id)?;
        if test.questions.is_empty() {
            return Err(Error::BadRequest("Test has no questions".to_string()));
        }

        let attempt = Attempt::new(Uuid::new_v4(), learner_id, &test, Utc::now());
        let attempt_id = attempt.id;
        let deadline = attempt.deadline;
        let view = AttemptView::from(&attempt);

        self.store.insert(attempt);
        if let Err(conflict) = self.registry.try_activate(learner_id, test_id, attempt_id) {
            self.store.remove(attempt_id);
            return Err(self.conflict_error(conflict));
        }
        if let Some(deadline) = deadline {
            self.scheduler.arm(attempt_id, deadline);
        }

        tracing::info!(
            attempt_id = %attempt_id,
            test_id = %test_id,
            timed = deadline.is_some(),
            "attempt started"
        );
        Ok(view)
    }

    fn conflict_error(&self, conflict: ActivationConflict) -> Error {
        let build = |existing: Uuid, completed: bool| match self.view(existing) {
            Ok(view) => {
                let attempt = Box::new(view);
                if completed {
                    Error::AttemptAlreadyCompleted { attempt }
                } else {
                    Error::AttemptAlreadyActive { attempt }
                }
            }
            Err(err) => err,
        };
        match conflict {
            ActivationConflict::Active(existing) => build(existing, false),
            ActivationConflict::Completed(existing) => build(existing, true),
        }
    }

    /// Records one answer into the attempt's answer set. Serialized per
    /// attempt by the store's per-attempt lock; last write per question wins.
    pub fn record_answer(
        &self,
        attempt_id: Uuid,
        learner_id: Uuid,
        request: RecordAnswerRequest,
    ) -> Result<DateTime<Utc>> {
        let shared = self.store.get(attempt_id).ok_or(Error::AttemptNotFound)?;
        let mut attempt = shared.lock().expect("attempt lock poisoned");

        if attempt.learner_id != learner_id {
            return Err(Error::NotOwner);
        }
        if !attempt.is_mutable() {
            return Err(Error::AttemptNotMutable);
        }
        // A lapsed deadline does not reject the write: answers are accepted
        // until the forced submit actually runs, and scoring reads the answer
        // set at that moment.

        let question = attempt
            .question(request.question_id)
            .cloned()
            .ok_or_else(|| Error::NotFound("Question is not part of this test".to_string()))?;

        match (request.selected_option_ids, request.text_answer) {
            (Some(option_ids), None) => attempt.answers.set_selection(&question, option_ids)?,
            (None, Some(text)) => attempt.answers.set_text(&question, text)?,
            _ => {
                return Err(Error::BadRequest(
                    "Provide either selected_option_ids or text_answer".to_string(),
                ))
            }
        }
        Ok(Utc::now())
    }

    /// Explicit submission by the attempt's owner.
    pub fn submit(&self, attempt_id: Uuid, learner_id: Uuid) -> Result<AttemptView> {
        self.submit_inner(attempt_id, Some(learner_id), SubmitTrigger::Explicit)
    }

    /// Deadline-forced submission, invoked by the scheduler worker.
    pub fn force_submit(&self, attempt_id: Uuid) -> Result<AttemptView> {
        self.submit_inner(attempt_id, None, SubmitTrigger::Deadline)
    }

    /// At most one caller performs the scoring; every later call observes
    /// the terminal state and returns the same result.
    fn submit_inner(
        &self,
        attempt_id: Uuid,
        caller: Option<Uuid>,
        trigger: SubmitTrigger,
    ) -> Result<AttemptView> {
        let shared = self.store.get(attempt_id).ok_or(Error::AttemptNotFound)?;
        let mut attempt = shared.lock().expect("attempt lock poisoned");

        if let Some(learner_id) = caller {
            if attempt.learner_id != learner_id {
                return Err(Error::NotOwner);
            }
        }
        if attempt.state == AttemptState::Submitted {
            return Ok(AttemptView::from(&*attempt));
        }

        let score = ScoringService::score_attempt(&attempt.questions, &attempt.answers);
        let passed = if score.fully_graded {
            Some(is_passing(
                score.total_score,
                attempt.max_score,
                attempt.pass_threshold,
            ))
        } else {
            None
        };

        attempt.state = AttemptState::Submitted;
        attempt.submitted_at = Some(Utc::now());
        attempt.submit_trigger = Some(trigger);
        attempt.total_score = Some(score.total_score);
        attempt.is_graded = score.fully_graded;
        attempt.is_passed = passed;
        attempt.graded_answers = Some(score.graded);

        self.scheduler.cancel(attempt_id);
        self.registry
            .deactivate(attempt.learner_id, attempt.test_id, attempt_id);

        tracing::info!(
            attempt_id = %attempt_id,
            trigger = ?trigger,
            total_score = score.total_score,
            max_score = attempt.max_score,
            graded = attempt.is_graded,
            "attempt submitted"
        );
        Ok(AttemptView::from(&*attempt))
    }

    /// Idempotent terminal-result lookup. `NoCompletedAttempt` is the
    /// expected outcome when the learner has not finished the test yet.
    pub fn completed_result(&self, learner_id: Uuid, test_id: Uuid) -> Result<AttemptView> {
        let attempt_id = self
            .registry
            .lookup_terminal(learner_id, test_id)
            .ok_or(Error::NoCompletedAttempt)?;
        self.view(attempt_id)
    }

    pub fn status(&self, attempt_id: Uuid, learner_id: Uuid) -> Result<AttemptStatusResponse> {
        let shared = self.store.get(attempt_id).ok_or(Error::AttemptNotFound)?;
        let attempt = shared.lock().expect("attempt lock poisoned");
        if attempt.learner_id != learner_id {
            return Err(Error::NotOwner);
        }
        Ok(AttemptStatusResponse {
            state: attempt.state,
            started_at: attempt.started_at,
            deadline: attempt.deadline,
            time_remaining_seconds: attempt
                .deadline
                .filter(|_| attempt.is_mutable())
                .map(seconds_until),
            questions_answered: attempt.answers.len(),
            total_questions: attempt.questions.len(),
        })
    }

    fn view(&self, attempt_id: Uuid) -> Result<AttemptView> {
        let shared = self.store.get(attempt_id).ok_or(Error::AttemptNotFound)?;
        let attempt = shared.lock().expect("attempt lock poisoned");
        Ok(AttemptView::from(&*attempt))
    }
}

fn is_passing(total_score: i32, max_score: i32, pass_threshold: f64) -> bool {
    if max_score <= 0 {
        return false;
    }
    (total_score as f64 / max_score as f64) * 100.0 >= pass_threshold
}
