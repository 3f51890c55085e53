use crate::core::workflow::{ExecuteAction, ReplacementWorkflow, ResponseOutcome};
use crate::domain::model::{ClassRef, SlotSelection};
use crate::domain::ports::ConflictResolutionClient;
use crate::domain::schedule::ScheduleGrid;
use crate::utils::error::Result;
use std::sync::Arc;
use tokio::sync::Mutex;

/// 把狀態機接上伺服器。
///
/// 鎖只在發出憑證和套用回應時持有，等待網路回應期間不持有，
/// 所以查詢進行中仍可換節次；舊回應會被 epoch 檢查丟棄。
#[derive(Clone)]
pub struct ReplacementSession {
    workflow: Arc<Mutex<ReplacementWorkflow>>,
    client: Arc<dyn ConflictResolutionClient>,
}

impl ReplacementSession {
    pub fn new(client: Arc<dyn ConflictResolutionClient>, slots_per_day: u8) -> Self {
        Self {
            workflow: Arc::new(Mutex::new(ReplacementWorkflow::new(slots_per_day))),
            client,
        }
    }

    pub async fn select_slot(&self, selection: SlotSelection) {
        self.workflow.lock().await.select_slot(selection);
    }

    pub async fn reset(&self) {
        self.workflow.lock().await.reset();
    }

    pub async fn fetch_candidates(&self) -> Result<ResponseOutcome> {
        let ticket = self.workflow.lock().await.request_candidates()?;
        let response = self.client.list_available_faculty(ticket.slot()).await;
        Ok(self
            .workflow
            .lock()
            .await
            .complete_candidates(ticket, response))
    }

    pub async fn fetch_options(&self) -> Result<ResponseOutcome> {
        let ticket = self.workflow.lock().await.request_options()?;
        let response = self.client.list_rearrange_options(ticket.slot()).await;
        Ok(self.workflow.lock().await.complete_options(ticket, response))
    }

    pub async fn select_candidate(&self, faculty_id: &str) -> Result<()> {
        self.workflow
            .lock()
            .await
            .select_candidate_by_id(faculty_id)
    }

    pub async fn select_option(&self, option_id: &str) -> Result<()> {
        self.workflow.lock().await.select_option_by_id(option_id)
    }

    pub async fn execute(&self) -> Result<ResponseOutcome> {
        let ticket = self.workflow.lock().await.execute()?;
        let response = match ticket.action() {
            ExecuteAction::Assign { faculty_id } => {
                self.client.assign_faculty(ticket.slot(), faculty_id).await
            }
            ExecuteAction::Rearrange {
                primary_faculty_id,
                secondary_faculty_id,
            } => {
                self.client
                    .execute_rearrange(ticket.slot(), primary_faculty_id, secondary_faculty_id)
                    .await
            }
        };
        Ok(self
            .workflow
            .lock()
            .await
            .complete_execution(ticket, response))
    }

    /// 班級週課表，只供顯示，不影響流程狀態
    pub async fn fetch_schedule(&self, class: &ClassRef) -> Result<ScheduleGrid> {
        class.validate()?;
        self.client.fetch_schedule(class).await
    }

    /// 目前狀態的複本
    pub async fn snapshot(&self) -> ReplacementWorkflow {
        self.workflow.lock().await.clone()
    }

    /// 在鎖內操作狀態機，例如逐則確認通知
    pub async fn with_workflow<R>(&self, f: impl FnOnce(&mut ReplacementWorkflow) -> R) -> R {
        let mut workflow = self.workflow.lock().await;
        f(&mut workflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::workflow::WorkflowState;
    use crate::domain::model::{
        ExecutionKind, ExecutionResult, FacultyCandidate, LectureSlot, RearrangeOption,
        TimeSlotIndex,
    };
    use crate::utils::error::{ErrorCategory, ReplaceError};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// 第一次查詢候選人會卡住，直到測試放行
    struct GatedClient {
        gate: Notify,
        calls: AtomicUsize,
    }

    impl GatedClient {
        fn new() -> Self {
            Self {
                gate: Notify::new(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ConflictResolutionClient for GatedClient {
        async fn list_available_faculty(&self, slot: &LectureSlot) -> Result<Vec<FacultyCandidate>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.gate.notified().await;
            }
            Ok(vec![FacultyCandidate {
                faculty_id: format!("FAC-{}", slot.class.class_name),
                name: "Dr. Rao".to_string(),
                department: "CSE".to_string(),
            }])
        }

        async fn list_rearrange_options(&self, _slot: &LectureSlot) -> Result<Vec<RearrangeOption>> {
            Err(ReplaceError::NoOptions {
                message: "No possible rearrangement found".to_string(),
            })
        }

        async fn assign_faculty(&self, _slot: &LectureSlot, faculty_id: &str) -> Result<ExecutionResult> {
            ExecutionResult::assigned(ExecutionKind::Direct, faculty_id, None, "Assigned")
        }

        async fn execute_rearrange(
            &self,
            _slot: &LectureSlot,
            _primary: &str,
            _secondary: &str,
        ) -> Result<ExecutionResult> {
            Err(ReplaceError::StaleState {
                message: "stale".to_string(),
            })
        }

        async fn fetch_schedule(&self, class: &ClassRef) -> Result<ScheduleGrid> {
            Ok(ScheduleGrid::empty(8)?.for_class(class.clone()))
        }
    }

    fn selection(class_name: &str) -> SlotSelection {
        SlotSelection::new()
            .with_date(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap())
            .with_class(&ClassRef::new("CSE", 1, class_name))
            .with_time_slot(TimeSlotIndex::new(2).unwrap())
    }

    #[tokio::test]
    async fn test_in_flight_response_is_discarded_after_reselect() {
        let client = Arc::new(GatedClient::new());
        let session = ReplacementSession::new(client.clone(), 8);
        session.select_slot(selection("D1")).await;

        let first = {
            let session = session.clone();
            tokio::spawn(async move { session.fetch_candidates().await })
        };
        // 等第一個查詢真的送出
        while client.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        session.select_slot(selection("D2")).await;
        client.gate.notify_one();

        let outcome = first.await.unwrap().unwrap();
        assert_eq!(outcome, ResponseOutcome::Discarded);

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.state(), &WorkflowState::Idle);
        assert!(snapshot.candidates().is_empty());

        let outcome = session.fetch_candidates().await.unwrap();
        assert_eq!(outcome, ResponseOutcome::Applied);
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.candidates()[0].faculty_id, "FAC-D2");
    }

    #[tokio::test]
    async fn test_direct_assignment_through_session() {
        let client = Arc::new(GatedClient::new());
        client.calls.store(1, Ordering::SeqCst);
        let session = ReplacementSession::new(client, 8);
        session.select_slot(selection("D1")).await;

        session.fetch_candidates().await.unwrap();
        session.select_candidate("FAC-D1").await.unwrap();
        let outcome = session.execute().await.unwrap();
        assert_eq!(outcome, ResponseOutcome::Applied);

        let messages = session
            .with_workflow(|wf| {
                wf.notifications()
                    .messages()
                    .into_iter()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .await;
        assert_eq!(messages, vec!["Assigned"]);
    }

    #[tokio::test]
    async fn test_options_failure_is_reported_as_outcome() {
        let session = ReplacementSession::new(Arc::new(GatedClient::new()), 8);
        session.select_slot(selection("D1")).await;

        match session.fetch_options().await.unwrap() {
            ResponseOutcome::Failed(failure) => {
                assert_eq!(failure.category, ErrorCategory::NoOptions)
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_incomplete_selection_fails_before_network() {
        let client = Arc::new(GatedClient::new());
        let session = ReplacementSession::new(client.clone(), 8);
        session.select_slot(SlotSelection::new()).await;

        assert!(session.fetch_candidates().await.is_err());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_schedule_validates_class() {
        let session = ReplacementSession::new(Arc::new(GatedClient::new()), 8);
        assert!(session
            .fetch_schedule(&ClassRef::new("", 1, "D1"))
            .await
            .is_err());
        let grid = session
            .fetch_schedule(&ClassRef::new("CSE", 1, "D1"))
            .await
            .unwrap();
        assert_eq!(grid.occupied_count(), 0);
    }
}
