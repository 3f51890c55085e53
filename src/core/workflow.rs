use crate::core::notifications::NotificationQueue;
use crate::domain::model::{
    ExecutionResult, FacultyCandidate, LectureSlot, RearrangeOption, SlotSelection, MAX_TIME_SLOTS,
};
use crate::utils::error::{ErrorCategory, ReplaceError, Result};
use std::fmt;

/// 失敗發生在哪一步
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Candidates,
    Options,
    Execute,
}

/// 可複製的失敗摘要，保存在 `WorkflowState::Failed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub stage: Stage,
    pub category: ErrorCategory,
    pub message: String,
    pub suggestion: &'static str,
}

impl Failure {
    pub fn from_error(stage: Stage, error: &ReplaceError) -> Self {
        Self {
            stage,
            category: error.category(),
            message: error.user_friendly_message(),
            suggestion: error.recovery_suggestion(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.category, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    FetchingCandidates,
    CandidatesReady,
    FetchingOptions,
    OptionsReady,
    Executing,
    Resolved(ExecutionResult),
    Failed(Failure),
}

impl WorkflowState {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::FetchingCandidates | Self::FetchingOptions | Self::Executing
        )
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::FetchingCandidates => "fetching candidates",
            Self::CandidatesReady => "candidates are ready",
            Self::FetchingOptions => "fetching rearrange options",
            Self::OptionsReady => "rearrange options are ready",
            Self::Executing => "executing",
            Self::Resolved(_) => "resolved",
            Self::Failed(_) => "failed",
        };
        f.write_str(label)
    }
}

/// 操作員選定的處理方式：直接代課或調課，二擇一
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pick {
    Candidate(FacultyCandidate),
    Option(RearrangeOption),
}

/// 發出查詢時的憑證，帶著當時的 epoch
#[derive(Debug, Clone)]
pub struct FetchTicket {
    epoch: u64,
    stage: Stage,
    slot: LectureSlot,
}

impl FetchTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn slot(&self) -> &LectureSlot {
        &self.slot
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteAction {
    Assign {
        faculty_id: String,
    },
    Rearrange {
        primary_faculty_id: String,
        secondary_faculty_id: String,
    },
}

#[derive(Debug, Clone)]
pub struct ExecuteTicket {
    epoch: u64,
    slot: LectureSlot,
    action: ExecuteAction,
}

impl ExecuteTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn slot(&self) -> &LectureSlot {
        &self.slot
    }

    pub fn action(&self) -> &ExecuteAction {
        &self.action
    }
}

/// 回應套用的結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    Applied,
    Failed(Failure),
    /// 回應屬於已被取代的選擇，直接丟棄
    Discarded,
}

/// 代課／調課流程的狀態機。
///
/// 網路呼叫分成兩段：`request_*` / `execute` 檢查前置條件並發出憑證，
/// `complete_*` 在回應抵達時套用結果。每次 `select_slot` 都會遞增 epoch，
/// 憑證的 epoch 不符就丟棄回應。
#[derive(Debug, Clone)]
pub struct ReplacementWorkflow {
    slots_per_day: u8,
    epoch: u64,
    selection: SlotSelection,
    state: WorkflowState,
    candidates: Vec<FacultyCandidate>,
    options: Vec<RearrangeOption>,
    pick: Option<Pick>,
    notifications: NotificationQueue,
}

impl Default for ReplacementWorkflow {
    fn default() -> Self {
        Self::new(MAX_TIME_SLOTS)
    }
}

impl ReplacementWorkflow {
    pub fn new(slots_per_day: u8) -> Self {
        Self {
            slots_per_day,
            epoch: 0,
            selection: SlotSelection::default(),
            state: WorkflowState::Idle,
            candidates: Vec::new(),
            options: Vec::new(),
            pick: None,
            notifications: NotificationQueue::default(),
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn selection(&self) -> &SlotSelection {
        &self.selection
    }

    pub fn candidates(&self) -> &[FacultyCandidate] {
        &self.candidates
    }

    pub fn options(&self) -> &[RearrangeOption] {
        &self.options
    }

    pub fn picked(&self) -> Option<&Pick> {
        self.pick.as_ref()
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationQueue {
        &mut self.notifications
    }

    /// 查詢按鈕是否可用
    pub fn can_request(&self) -> bool {
        self.request_state_allowed() && self.selection.complete_within(self.slots_per_day).is_ok()
    }

    /// 執行按鈕是否可用
    pub fn can_execute(&self) -> bool {
        self.execute_state_allowed() && self.pick.is_some()
    }

    /// 換一個節次：任何狀態都可以，先前的結果全部作廢
    pub fn select_slot(&mut self, selection: SlotSelection) {
        self.epoch += 1;
        self.selection = selection;
        self.clear_derived();
        tracing::info!("🗓️ Slot selected (epoch {})", self.epoch);
    }

    pub fn reset(&mut self) {
        self.select_slot(SlotSelection::default());
    }

    pub fn request_candidates(&mut self) -> Result<FetchTicket> {
        let ticket = self.begin_fetch(Stage::Candidates, "fetch candidates")?;
        self.state = WorkflowState::FetchingCandidates;
        tracing::info!("📡 Fetching available faculty for {}", ticket.slot);
        Ok(ticket)
    }

    pub fn request_options(&mut self) -> Result<FetchTicket> {
        let ticket = self.begin_fetch(Stage::Options, "fetch rearrange options")?;
        self.state = WorkflowState::FetchingOptions;
        tracing::info!("📡 Fetching rearrange options for {}", ticket.slot);
        Ok(ticket)
    }

    pub fn complete_candidates(
        &mut self,
        ticket: FetchTicket,
        response: Result<Vec<FacultyCandidate>>,
    ) -> ResponseOutcome {
        if !self.accepts(ticket.epoch, &WorkflowState::FetchingCandidates) {
            return self.discard(ticket.epoch, "candidates");
        }
        match response {
            Ok(candidates) if candidates.is_empty() => self.fail(
                Stage::Candidates,
                &ReplaceError::NoCandidates {
                    message: "No faculty available at this time slot".to_string(),
                },
            ),
            Ok(candidates) => {
                tracing::info!("✅ {} candidate(s) available", candidates.len());
                self.candidates = candidates;
                self.state = WorkflowState::CandidatesReady;
                ResponseOutcome::Applied
            }
            Err(e) => self.fail(Stage::Candidates, &e),
        }
    }

    pub fn complete_options(
        &mut self,
        ticket: FetchTicket,
        response: Result<Vec<RearrangeOption>>,
    ) -> ResponseOutcome {
        if !self.accepts(ticket.epoch, &WorkflowState::FetchingOptions) {
            return self.discard(ticket.epoch, "rearrange options");
        }
        match response {
            Ok(options) if options.is_empty() => self.fail(
                Stage::Options,
                &ReplaceError::NoOptions {
                    message: "No possible rearrangement found".to_string(),
                },
            ),
            Ok(options) => {
                tracing::info!("✅ {} rearrange option(s) found", options.len());
                self.options = options;
                self.state = WorkflowState::OptionsReady;
                ResponseOutcome::Applied
            }
            Err(e) => self.fail(Stage::Options, &e),
        }
    }

    pub fn select_candidate(&mut self, candidate: &FacultyCandidate) -> Result<()> {
        self.select_candidate_by_id(&candidate.faculty_id)
    }

    pub fn select_candidate_by_id(&mut self, faculty_id: &str) -> Result<()> {
        if !self.pick_state_allowed(Stage::Candidates) {
            return Err(self.invalid_transition("select a candidate"));
        }
        let candidate = self
            .candidates
            .iter()
            .find(|c| c.faculty_id == faculty_id)
            .cloned()
            .ok_or_else(|| {
                ReplaceError::validation(format!(
                    "Faculty '{}' is not one of the fetched candidates",
                    faculty_id
                ))
            })?;
        tracing::debug!("Candidate {} selected", candidate.faculty_id);
        self.pick = Some(Pick::Candidate(candidate));
        self.state = WorkflowState::CandidatesReady;
        Ok(())
    }

    pub fn select_option(&mut self, option: &RearrangeOption) -> Result<()> {
        self.select_option_by_id(option.option_id())
    }

    pub fn select_option_by_id(&mut self, option_id: &str) -> Result<()> {
        if !self.pick_state_allowed(Stage::Options) {
            return Err(self.invalid_transition("select a rearrange option"));
        }
        let option = self
            .options
            .iter()
            .find(|o| o.option_id() == option_id)
            .cloned()
            .ok_or_else(|| {
                ReplaceError::validation(format!(
                    "Option '{}' is not one of the fetched rearrange options",
                    option_id
                ))
            })?;
        tracing::debug!("Rearrange option {} selected", option.option_id());
        self.pick = Some(Pick::Option(option));
        self.state = WorkflowState::OptionsReady;
        Ok(())
    }

    pub fn execute(&mut self) -> Result<ExecuteTicket> {
        if !self.execute_state_allowed() {
            return Err(self.invalid_transition("execute"));
        }
        let action = match &self.pick {
            Some(Pick::Candidate(candidate)) => ExecuteAction::Assign {
                faculty_id: candidate.faculty_id.clone(),
            },
            Some(Pick::Option(option)) => ExecuteAction::Rearrange {
                primary_faculty_id: option.primary().faculty_id.clone(),
                secondary_faculty_id: option.secondary().faculty_id.clone(),
            },
            None => {
                return Err(ReplaceError::validation(
                    "Select exactly one candidate or rearrange option before executing",
                ))
            }
        };
        let slot = self.selection.complete_within(self.slots_per_day)?;

        self.state = WorkflowState::Executing;
        tracing::info!("🚀 Executing {:?} for {}", action, slot);
        Ok(ExecuteTicket {
            epoch: self.epoch,
            slot,
            action,
        })
    }

    pub fn complete_execution(
        &mut self,
        ticket: ExecuteTicket,
        response: Result<ExecutionResult>,
    ) -> ResponseOutcome {
        if !self.accepts(ticket.epoch, &WorkflowState::Executing) {
            return self.discard(ticket.epoch, "execution result");
        }
        match response {
            Ok(result) => {
                tracing::info!(
                    "✅ Resolved ({}) with {} notification(s)",
                    result.kind(),
                    result.affected_classes().len().max(1)
                );
                self.notifications = NotificationQueue::from_result(&result);
                self.candidates.clear();
                self.options.clear();
                self.pick = None;
                self.state = WorkflowState::Resolved(result);
                ResponseOutcome::Applied
            }
            // 保留候選與選擇，讓操作員可以重試或改選
            Err(e) => self.fail(Stage::Execute, &e),
        }
    }

    fn begin_fetch(&mut self, stage: Stage, action: &str) -> Result<FetchTicket> {
        if !self.request_state_allowed() {
            return Err(self.invalid_transition(action));
        }
        let slot = self.selection.complete_within(self.slots_per_day)?;

        // 兩種策略互斥：發出任一查詢就清掉另一邊的結果
        self.candidates.clear();
        self.options.clear();
        self.pick = None;

        Ok(FetchTicket {
            epoch: self.epoch,
            stage,
            slot,
        })
    }

    fn accepts(&self, epoch: u64, expected: &WorkflowState) -> bool {
        epoch == self.epoch && &self.state == expected
    }

    fn discard(&self, epoch: u64, what: &str) -> ResponseOutcome {
        tracing::debug!(
            "🗑️ Discarding {} from epoch {} (current epoch {}, state {})",
            what,
            epoch,
            self.epoch,
            self.state
        );
        ResponseOutcome::Discarded
    }

    fn fail(&mut self, stage: Stage, error: &ReplaceError) -> ResponseOutcome {
        tracing::warn!("❌ {:?} failed: {}", stage, error);
        let failure = Failure::from_error(stage, error);
        self.state = WorkflowState::Failed(failure.clone());
        ResponseOutcome::Failed(failure)
    }

    fn request_state_allowed(&self) -> bool {
        matches!(
            self.state,
            WorkflowState::Idle
                | WorkflowState::CandidatesReady
                | WorkflowState::OptionsReady
                | WorkflowState::Failed(_)
        )
    }

    fn execute_state_allowed(&self) -> bool {
        match &self.state {
            WorkflowState::CandidatesReady | WorkflowState::OptionsReady => true,
            WorkflowState::Failed(failure) => failure.stage == Stage::Execute,
            _ => false,
        }
    }

    fn pick_state_allowed(&self, stage: Stage) -> bool {
        match (&self.state, stage) {
            (WorkflowState::CandidatesReady, Stage::Candidates) => true,
            (WorkflowState::OptionsReady, Stage::Options) => true,
            (WorkflowState::Failed(failure), Stage::Candidates) => {
                failure.stage == Stage::Execute && !self.candidates.is_empty()
            }
            (WorkflowState::Failed(failure), Stage::Options) => {
                failure.stage == Stage::Execute && !self.options.is_empty()
            }
            _ => false,
        }
    }

    fn invalid_transition(&self, action: &str) -> ReplaceError {
        ReplaceError::InvalidTransition {
            action: action.to_string(),
            state: self.state.to_string(),
        }
    }

    fn clear_derived(&mut self) {
        self.state = WorkflowState::Idle;
        self.candidates.clear();
        self.options.clear();
        self.pick = None;
        self.notifications.clear();
    }
}
