//! Wizard session controller.
//!
//! Owns the [`WizardSession`] and is the only place it changes. Completing a
//! step runs in three phases so the remote call can happen off the UI thread:
//! [`WizardController::begin_advance`] checks the step and the affordability
//! gate, [`PendingSync::execute`] talks to the record store, and
//! [`WizardController::finish_advance`] merges the data and persists the
//! snapshot. Only one step may be in flight at a time; a reset in between
//! turns the late result stale.

use crate::domain::{
    Affordability, AffordabilityInput, FormData, RecordId, SessionSnapshot, StepContract, StepSequence,
    ValidatedData, WizardSession, WizardState, affordability,
};
use crate::infrastructure::{RecordStore, SessionStore, SyncError};

use super::wizard_error::WizardError;

/// Result of the remote call for one step: the new record identifier when the
/// record was created, nothing when it was updated.
pub type SyncOutcome = Result<Option<RecordId>, SyncError>;

#[derive(Debug, Clone, PartialEq)]
enum SyncRequest {
    Create,
    Update(RecordId),
}

/// A step that passed every local check and now waits for the record store.
#[derive(Debug)]
pub struct PendingSync {
    generation: u64,
    step: usize,
    request: SyncRequest,
    payload: FormData,
}

impl PendingSync {
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn creates_record(&self) -> bool {
        self.request == SyncRequest::Create
    }

    /// Performs the remote call. Safe to run on another thread; it does not
    /// touch the session.
    pub fn execute(&self, remote: &dyn RecordStore) -> SyncOutcome {
        match &self.request {
            SyncRequest::Create => remote.create(&self.payload).map(Some),
            SyncRequest::Update(id) => remote.update(id, &self.payload).map(|()| None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTransition {
    pub from: usize,
    pub to: WizardState,
    pub record_created: bool,
}

pub struct WizardController<S: SessionStore> {
    steps: StepSequence,
    session: WizardSession,
    store: S,
    generation: u64,
    in_flight: bool,
}

impl<S: SessionStore> WizardController<S> {
    /// Starts a fresh session without looking at the store.
    pub fn new(steps: StepSequence, store: S) -> Self {
        Self {
            steps,
            session: WizardSession::new(),
            store,
            generation: 0,
            in_flight: false,
        }
    }

    /// Resumes from the stored snapshot when it is consistent with `steps`,
    /// otherwise starts fresh.
    pub fn restore(steps: StepSequence, store: S) -> Self {
        let session = match store.load() {
            Some(snapshot) => match snapshot_problem(&steps, &snapshot) {
                None => {
                    tracing::info!(step = snapshot.active_step, "resuming saved session");
                    WizardSession::from_snapshot(snapshot)
                }
                Some(problem) => {
                    tracing::warn!(%problem, "ignoring inconsistent session snapshot");
                    WizardSession::new()
                }
            },
            None => WizardSession::new(),
        };

        Self {
            steps,
            session,
            store,
            generation: 0,
            in_flight: false,
        }
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    pub fn steps(&self) -> &StepSequence {
        &self.steps
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn state(&self) -> WizardState {
        self.session.state(self.steps.len())
    }

    /// Contract of the step being filled in, if any.
    pub fn current_contract(&self) -> Option<&StepContract> {
        match self.state() {
            WizardState::Step(i) => self.steps.get(i),
            _ => None,
        }
    }

    /// Whether a step is waiting for the record store.
    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Completes the current step in one go, calling `remote` inline.
    pub fn advance(
        &mut self,
        validated: ValidatedData,
        remote: &dyn RecordStore,
    ) -> Result<StepTransition, WizardError> {
        let pending = self.begin_advance(validated)?;
        let outcome = pending.execute(remote);
        self.finish_advance(pending, outcome)
    }

    /// Runs the local checks for completing the current step and reserves the
    /// session for the remote call.
    ///
    /// # Errors
    ///
    /// `Busy` while another step is in flight, `WrongStep` when the data
    /// belongs to a different step, `Unaffordable` when the step carries the
    /// affordability check and it fails.
    pub fn begin_advance(&mut self, validated: ValidatedData) -> Result<PendingSync, WizardError> {
        if self.in_flight {
            return Err(WizardError::Busy);
        }
        let step = match self.state() {
            WizardState::Step(i) => i,
            WizardState::Review => {
                return Err(WizardError::WrongStep {
                    active: self.session.active_step,
                    submitted: validated.step(),
                });
            }
            WizardState::Submitted => return Err(WizardError::AlreadySubmitted),
        };
        let wrong_step = WizardError::WrongStep {
            active: step,
            submitted: validated.step(),
        };
        if validated.step() != step {
            return Err(wrong_step);
        }
        let contract = self.steps.get(step).ok_or(wrong_step)?;

        if contract.requires_affordability_check {
            let input = AffordabilityInput::gather(&self.session.data, validated.fields());
            if let Affordability::Rejected { reason, max_loan } = affordability::evaluate(&input) {
                tracing::info!(step, loan_amount = input.loan_amount, max_loan, "affordability check failed");
                return Err(WizardError::Unaffordable { reason, max_loan });
            }
        }

        // A record created earlier is patched, even when the user went back
        // to the first step.
        let request = match (&self.session.record_id, step) {
            (Some(id), _) => SyncRequest::Update(id.clone()),
            (None, 0) => SyncRequest::Create,
            (None, _) => return Err(WizardError::MissingRecordId),
        };

        self.in_flight = true;
        tracing::debug!(step, create = request == SyncRequest::Create, "step sync started");
        Ok(PendingSync {
            generation: self.generation,
            step,
            request,
            payload: validated.into_fields(),
        })
    }

    /// Applies the outcome of the remote call started by `begin_advance`.
    ///
    /// On success the step's data is merged, the session moves on and the
    /// snapshot is written. On failure nothing changes and the step may be
    /// retried. A result arriving after `reset` is discarded as `Stale`.
    pub fn finish_advance(
        &mut self,
        pending: PendingSync,
        outcome: SyncOutcome,
    ) -> Result<StepTransition, WizardError> {
        if pending.generation != self.generation || pending.step != self.session.active_step {
            tracing::info!(step = pending.step, "discarding sync result for a restarted session");
            return Err(WizardError::Stale);
        }
        self.in_flight = false;

        let created = match outcome {
            Ok(created) => created,
            Err(e) => {
                tracing::warn!(step = pending.step, error = %e, "step sync failed");
                return Err(e.into());
            }
        };
        let record_created = match (pending.request, created) {
            (SyncRequest::Create, Some(id)) => {
                self.session.record_id = Some(id);
                true
            }
            (SyncRequest::Create, None) => {
                return Err(SyncError::MalformedResponse("no record identifier returned".to_string()).into());
            }
            (SyncRequest::Update(_), _) => false,
        };

        self.session.data.merge(&pending.payload);
        self.session.active_step = pending.step + 1;
        self.persist();

        let to = self.state();
        tracing::info!(from = pending.step, to = ?to, "step completed");
        Ok(StepTransition {
            from: pending.step,
            to,
            record_created,
        })
    }

    /// Moves one step back. Only the index changes; collected data and the
    /// record identifier are kept.
    pub fn go_back(&mut self) -> Result<WizardState, WizardError> {
        if self.in_flight {
            return Err(WizardError::Busy);
        }
        if self.session.submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.session.active_step == 0 {
            return Err(WizardError::AtFirstStep);
        }

        self.session.active_step -= 1;
        self.session.confirmed = false;
        self.persist();
        Ok(self.state())
    }

    pub fn set_confirmed(&mut self, confirmed: bool) -> Result<(), WizardError> {
        match self.state() {
            WizardState::Review => {
                self.session.confirmed = confirmed;
                Ok(())
            }
            WizardState::Submitted => Err(WizardError::AlreadySubmitted),
            WizardState::Step(_) => Err(WizardError::NotAtReview),
        }
    }

    /// Final, purely local submission. Every field already reached the record
    /// store with the step patches.
    pub fn confirm_and_submit(&mut self) -> Result<(), WizardError> {
        match self.state() {
            WizardState::Review => {}
            WizardState::Submitted => return Err(WizardError::AlreadySubmitted),
            WizardState::Step(_) => return Err(WizardError::NotAtReview),
        }
        if !self.session.confirmed {
            return Err(WizardError::ConfirmationMissing);
        }

        self.session.submitted = true;
        tracing::info!(
            record_id = ?self.session.record_id.as_ref().map(RecordId::as_str),
            data = %serde_json::to_string(&self.session.data).unwrap_or_default(),
            "application submitted"
        );
        Ok(())
    }

    /// Drops all progress and the stored snapshot. Accepted in any state; a
    /// step still in flight will come back stale.
    pub fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.in_flight = false;
        self.session = WizardSession::new();
        if let Err(e) = self.store.clear() {
            tracing::error!(error = %e, "could not clear session snapshot");
        }
        tracing::info!("session reset");
    }

    /// Releases the reservation taken by `begin_advance` when its result will
    /// never arrive. A result that still shows up later is stale.
    pub fn abandon_advance(&mut self) {
        if !self.in_flight {
            return;
        }
        self.generation = self.generation.wrapping_add(1);
        self.in_flight = false;
        tracing::warn!(step = self.session.active_step, "step sync abandoned");
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.session.snapshot()) {
            tracing::error!(error = %e, "could not persist session snapshot");
        }
    }
}

/// Describes why `snapshot` cannot belong to a session over `steps`.
fn snapshot_problem(steps: &StepSequence, snapshot: &SessionSnapshot) -> Option<String> {
    if snapshot.active_step > steps.review_index() {
        return Some(format!("step {} is past the review step", snapshot.active_step));
    }
    if snapshot.active_step >= 1 && snapshot.record_id.is_none() {
        return Some(format!("step {} has no record identifier", snapshot.active_step));
    }
    for (field, value) in snapshot.data.iter() {
        match steps.iter().find_map(|contract| contract.rule(field)) {
            None => return Some(format!("unknown field {field}")),
            Some(rule) if !rule.accepts(value) => {
                return Some(format!("field {field} holds a value of the wrong kind"));
            }
            Some(_) => {}
        }
    }
    steps
        .rules_before(snapshot.active_step)
        .find(|rule| rule.required && !snapshot.data.contains(rule.name))
        .map(|rule| format!("missing field {}", rule.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldValue, RawInput, validate};
    use crate::infrastructure::MemorySessionStore;
    use crate::infrastructure::remote::testing::{RemoteCall, ScriptedRecordStore};

    type Controller = WizardController<MemorySessionStore>;

    fn raw(pairs: &[(&str, &str)]) -> RawInput {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn step_input(step: usize) -> RawInput {
        match step {
            0 => raw(&[("firstName", "Anna"), ("lastName", "Schmidt"), ("dateOfBirth", "1990-04-12")]),
            1 => raw(&[("email", "anna@example.de"), ("phone", "+4917012345678")]),
            2 => raw(&[("loanAmount", "40000"), ("upfrontPayment", "5000"), ("terms", "24")]),
            3 => raw(&[("monthlySalary", "4000")]),
            _ => RawInput::new(),
        }
    }

    fn validated(ctrl: &Controller, step: usize, input: &RawInput) -> ValidatedData {
        validate(ctrl.steps().get(step).unwrap(), input).unwrap()
    }

    fn controller() -> Controller {
        WizardController::new(StepSequence::loan_application().unwrap(), MemorySessionStore::new())
    }

    fn complete(ctrl: &mut Controller, remote: &ScriptedRecordStore, step: usize) -> StepTransition {
        let data = validated(ctrl, step, &step_input(step));
        ctrl.advance(data, remote).unwrap()
    }

    /// Data accumulated after completing the first `steps` steps.
    fn completed_data(steps: usize) -> FormData {
        let mut ctrl = controller();
        let remote = ScriptedRecordStore::new();
        for step in 0..steps {
            complete(&mut ctrl, &remote, step);
        }
        ctrl.session().data().clone()
    }

    fn sorted_keys(data: &FormData) -> Vec<String> {
        let mut keys: Vec<String> = data.keys().map(str::to_string).collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_accumulated_data_is_union_of_completed_steps() {
        let mut ctrl = controller();
        let remote = ScriptedRecordStore::new();
        let mut expected: Vec<String> = Vec::new();

        for step in 0..4 {
            complete(&mut ctrl, &remote, step);
            expected.extend(ctrl.steps().get(step).unwrap().field_names().map(str::to_string));
            expected.retain(|name| name != "additionalIncome" && name != "mortgage" && name != "otherCredits");
            expected.sort();
            assert_eq!(sorted_keys(ctrl.session().data()), expected);
        }

        assert_eq!(ctrl.state(), WizardState::Review);
        assert_eq!(ctrl.session().record_id(), Some(&RecordId::new("rec-1")));
        assert_eq!(remote.creates(), 1);
        assert_eq!(remote.calls().len(), 4);
    }

    #[test]
    fn test_first_step_creates_and_later_steps_update() {
        let mut ctrl = controller();
        let remote = ScriptedRecordStore::new();

        let first = complete(&mut ctrl, &remote, 0);
        assert!(first.record_created);
        assert_eq!(first.to, WizardState::Step(1));

        let second = complete(&mut ctrl, &remote, 1);
        assert!(!second.record_created);

        let calls = remote.calls();
        match &calls[1] {
            RemoteCall::Update(id, payload) => {
                assert_eq!(id.as_str(), "rec-1");
                // Only the step's own fields are sent.
                assert_eq!(sorted_keys(payload), vec!["email", "phone"]);
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn test_go_back_and_readvance_does_not_create_twice() {
        let mut ctrl = controller();
        let remote = ScriptedRecordStore::new();
        complete(&mut ctrl, &remote, 0);
        let before = ctrl.session().data().clone();

        assert_eq!(ctrl.go_back().unwrap(), WizardState::Step(0));
        assert_eq!(ctrl.session().data(), &before);

        let transition = complete(&mut ctrl, &remote, 0);
        assert!(!transition.record_created);
        assert_eq!(ctrl.session().data(), &before);
        assert_eq!(ctrl.session().record_id(), Some(&RecordId::new("rec-1")));
        assert_eq!(remote.creates(), 1);
    }

    #[test]
    fn test_go_back_persists_index_only() {
        let mut ctrl = controller();
        let remote = ScriptedRecordStore::new();
        complete(&mut ctrl, &remote, 0);
        complete(&mut ctrl, &remote, 1);
        let saves = ctrl.store().saves();

        ctrl.go_back().unwrap();
        let stored = ctrl.store().load().unwrap();
        assert_eq!(stored.active_step, 1);
        assert_eq!(stored.data, *ctrl.session().data());
        assert_eq!(ctrl.store().saves(), saves + 1);
        assert_eq!(remote.calls().len(), 2);
    }

    #[test]
    fn test_go_back_at_first_step_is_refused() {
        let mut ctrl = controller();
        assert_eq!(ctrl.go_back(), Err(WizardError::AtFirstStep));
        assert_eq!(ctrl.store().saves(), 0);
    }

    #[test]
    fn test_affordability_gate_blocks_financial_step() {
        let mut ctrl = controller();
        let remote = ScriptedRecordStore::new();
        complete(&mut ctrl, &remote, 0);
        complete(&mut ctrl, &remote, 1);
        let loan = validated(&ctrl, 2, &raw(&[("loanAmount", "50000"), ("upfrontPayment", "0"), ("terms", "24")]));
        ctrl.advance(loan, &remote).unwrap();
        let calls = remote.calls().len();
        let saves = ctrl.store().saves();

        let financial = validated(&ctrl, 3, &step_input(3));
        let err = ctrl.advance(financial, &remote).unwrap_err();

        assert!(matches!(err, WizardError::Unaffordable { max_loan, .. } if max_loan == 48_000.0));
        assert_eq!(ctrl.state(), WizardState::Step(3));
        assert!(!ctrl.session().data().contains("monthlySalary"));
        assert_eq!(remote.calls().len(), calls);
        assert_eq!(ctrl.store().saves(), saves);
        assert!(!ctrl.is_busy());
    }

    #[test]
    fn test_affordable_loan_reaches_review() {
        let mut ctrl = controller();
        let remote = ScriptedRecordStore::new();
        for step in 0..3 {
            complete(&mut ctrl, &remote, step);
        }

        let transition = complete(&mut ctrl, &remote, 3);
        assert_eq!(transition.to, WizardState::Review);
        assert_eq!(ctrl.session().data().number("monthlySalary"), Some(4000.0));
    }

    #[test]
    fn test_sync_failure_on_first_step_then_retry() {
        let mut ctrl = controller();
        let remote = ScriptedRecordStore::new();
        remote.fail_next(SyncError::Network("connection refused".to_string()));

        let data = validated(&ctrl, 0, &step_input(0));
        let err = ctrl.advance(data.clone(), &remote).unwrap_err();
        assert!(matches!(err, WizardError::Sync(SyncError::Network(_))));
        assert_eq!(ctrl.state(), WizardState::Step(0));
        assert!(ctrl.session().record_id().is_none());
        assert!(ctrl.session().data().is_empty());
        assert!(ctrl.store().load().is_none());
        assert!(!ctrl.is_busy());

        let transition = ctrl.advance(data, &remote).unwrap();
        assert_eq!(transition.to, WizardState::Step(1));
        assert!(ctrl.session().record_id().is_some());
        assert_eq!(ctrl.store().saves(), 1);
    }

    #[test]
    fn test_sync_failure_keeps_data_unmerged() {
        let mut ctrl = controller();
        let remote = ScriptedRecordStore::new();
        complete(&mut ctrl, &remote, 0);
        let stored = ctrl.store().load();
        remote.fail_next(SyncError::Rejected { status: 500 });

        let data = validated(&ctrl, 1, &step_input(1));
        let err = ctrl.advance(data, &remote).unwrap_err();

        assert_eq!(err, WizardError::Sync(SyncError::Rejected { status: 500 }));
        assert!(!ctrl.session().data().contains("email"));
        assert_eq!(ctrl.state(), WizardState::Step(1));
        assert_eq!(ctrl.store().load(), stored);
    }

    #[test]
    fn test_data_for_another_step_is_refused() {
        let mut ctrl = controller();
        let remote = ScriptedRecordStore::new();

        let data = validated(&ctrl, 1, &step_input(1));
        assert_eq!(
            ctrl.advance(data, &remote),
            Err(WizardError::WrongStep { active: 0, submitted: 1 })
        );
        assert!(remote.calls().is_empty());
    }

    #[test]
    fn test_submission_requires_confirmation() {
        let mut ctrl = controller();
        let remote = ScriptedRecordStore::new();
        assert_eq!(ctrl.confirm_and_submit(), Err(WizardError::NotAtReview));
        for step in 0..4 {
            complete(&mut ctrl, &remote, step);
        }
        let calls = remote.calls().len();

        assert_eq!(ctrl.confirm_and_submit(), Err(WizardError::ConfirmationMissing));
        assert_eq!(ctrl.state(), WizardState::Review);

        ctrl.set_confirmed(true).unwrap();
        ctrl.confirm_and_submit().unwrap();
        assert_eq!(ctrl.state(), WizardState::Submitted);
        assert!(ctrl.session().submitted());
        assert_eq!(remote.calls().len(), calls);

        assert_eq!(ctrl.go_back(), Err(WizardError::AlreadySubmitted));
        assert_eq!(ctrl.confirm_and_submit(), Err(WizardError::AlreadySubmitted));
        let data = validated(&ctrl, 0, &step_input(0));
        assert_eq!(ctrl.advance(data, &remote), Err(WizardError::AlreadySubmitted));
    }

    #[test]
    fn test_leaving_review_clears_confirmation() {
        let mut ctrl = controller();
        let remote = ScriptedRecordStore::new();
        for step in 0..4 {
            complete(&mut ctrl, &remote, step);
        }
        ctrl.set_confirmed(true).unwrap();

        ctrl.go_back().unwrap();
        assert!(!ctrl.session().confirmed());
        assert_eq!(ctrl.set_confirmed(true), Err(WizardError::NotAtReview));
    }

    #[test]
    fn test_reset_clears_session_and_store() {
        let mut ctrl = controller();
        let remote = ScriptedRecordStore::new();
        for step in 0..4 {
            complete(&mut ctrl, &remote, step);
        }
        ctrl.set_confirmed(true).unwrap();
        ctrl.confirm_and_submit().unwrap();

        ctrl.reset();

        assert_eq!(ctrl.state(), WizardState::Step(0));
        assert_eq!(ctrl.session().active_step(), 0);
        assert!(ctrl.session().data().is_empty());
        assert!(ctrl.session().record_id().is_none());
        assert!(!ctrl.session().confirmed());
        assert!(!ctrl.session().submitted());
        assert!(ctrl.store().load().is_none());
    }

    #[test]
    fn test_second_step_is_refused_while_busy() {
        let mut ctrl = controller();
        let remote = ScriptedRecordStore::new();
        complete(&mut ctrl, &remote, 0);

        let pending = ctrl.begin_advance(validated(&ctrl, 1, &step_input(1))).unwrap();
        assert!(ctrl.is_busy());
        assert!(!pending.creates_record());
        assert_eq!(ctrl.go_back(), Err(WizardError::Busy));
        assert_eq!(
            ctrl.begin_advance(validated(&ctrl, 1, &step_input(1))).unwrap_err(),
            WizardError::Busy
        );

        let outcome = pending.execute(&remote);
        ctrl.finish_advance(pending, outcome).unwrap();
        assert!(!ctrl.is_busy());
        assert_eq!(ctrl.state(), WizardState::Step(2));
    }

    #[test]
    fn test_result_after_reset_is_discarded() {
        let mut ctrl = controller();
        let remote = ScriptedRecordStore::new();

        let pending = ctrl.begin_advance(validated(&ctrl, 0, &step_input(0))).unwrap();
        assert!(pending.creates_record());
        ctrl.reset();
        let outcome = pending.execute(&remote);

        assert_eq!(ctrl.finish_advance(pending, outcome), Err(WizardError::Stale));
        assert_eq!(ctrl.state(), WizardState::Step(0));
        assert!(ctrl.session().record_id().is_none());
        assert!(ctrl.session().data().is_empty());
        assert!(ctrl.store().load().is_none());
        assert!(!ctrl.is_busy());
    }

    #[test]
    fn test_abandoned_sync_frees_the_session() {
        let mut ctrl = controller();
        let remote = ScriptedRecordStore::new();

        let lost = ctrl.begin_advance(validated(&ctrl, 0, &step_input(0))).unwrap();
        ctrl.abandon_advance();
        assert!(!ctrl.is_busy());

        let retry = ctrl.begin_advance(validated(&ctrl, 0, &step_input(0))).unwrap();
        assert_eq!(retry.step(), 0);
        let outcome = lost.execute(&remote);
        assert_eq!(ctrl.finish_advance(lost, outcome), Err(WizardError::Stale));
        assert!(ctrl.is_busy());

        let outcome = retry.execute(&remote);
        let transition = ctrl.finish_advance(retry, outcome).unwrap();
        assert!(transition.record_created);
        assert_eq!(ctrl.state(), WizardState::Step(1));

        // Nothing to release when no step is in flight.
        ctrl.abandon_advance();
        assert_eq!(ctrl.state(), WizardState::Step(1));
    }

    #[test]
    fn test_restore_data_ahead_of_step_index() {
        // What an interrupted save leaves behind: the record id and the new
        // data are on disk but the step index is still the old one.
        let snapshot = SessionSnapshot {
            active_step: 1,
            data: completed_data(2),
            record_id: Some(RecordId::new("rec-1")),
        };
        let mut ctrl = WizardController::restore(
            StepSequence::loan_application().unwrap(),
            MemorySessionStore::with_snapshot(snapshot),
        );
        assert_eq!(ctrl.state(), WizardState::Step(1));

        let remote = ScriptedRecordStore::new();
        complete(&mut ctrl, &remote, 1);
        assert_eq!(remote.creates(), 0);
        assert_eq!(ctrl.session().record_id(), Some(&RecordId::new("rec-1")));
        assert_eq!(ctrl.state(), WizardState::Step(2));
    }

    #[test]
    fn test_restore_resumes_consistent_snapshot() {
        let mut source = controller();
        let remote = ScriptedRecordStore::new();
        complete(&mut source, &remote, 0);
        complete(&mut source, &remote, 1);
        let snapshot = source.store().load().unwrap();

        let restored = WizardController::restore(
            StepSequence::loan_application().unwrap(),
            MemorySessionStore::with_snapshot(snapshot.clone()),
        );
        assert_eq!(restored.state(), WizardState::Step(2));
        assert_eq!(restored.session().snapshot(), snapshot);
        assert!(!restored.session().confirmed());
    }

    #[test]
    fn test_restore_ignores_inconsistent_snapshots() {
        let mut data = FormData::new();
        data.insert("firstName", FieldValue::Text("Anna".to_string()));

        let mut text_typed_loan = completed_data(3);
        text_typed_loan.insert("loanAmount", FieldValue::Text("70000".to_string()));

        let broken = [
            SessionSnapshot {
                active_step: 9,
                data: FormData::new(),
                record_id: Some(RecordId::new("x")),
            },
            SessionSnapshot {
                active_step: 1,
                data: data.clone(),
                record_id: None,
            },
            SessionSnapshot {
                active_step: 1,
                data: data.clone(),
                record_id: Some(RecordId::new("x")),
            },
            SessionSnapshot {
                active_step: 0,
                data: [("shoeSize".to_string(), FieldValue::Number(42.0))].into_iter().collect(),
                record_id: None,
            },
            SessionSnapshot {
                active_step: 3,
                data: text_typed_loan,
                record_id: Some(RecordId::new("rec-1")),
            },
        ];

        for snapshot in broken {
            let ctrl = WizardController::restore(
                StepSequence::loan_application().unwrap(),
                MemorySessionStore::with_snapshot(snapshot),
            );
            assert_eq!(ctrl.session(), &WizardSession::new());
        }
    }
}
