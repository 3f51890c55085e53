use crate::domain::model::{ClassRef, ExecutionResult, FacultyCandidate, LectureSlot, RearrangeOption};
use crate::domain::schedule::ScheduleGrid;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// 伺服器端的衝突處理介面；每個呼叫彼此獨立、無狀態
#[async_trait]
pub trait ConflictResolutionClient: Send + Sync {
    /// 該節次可直接代課的老師。404 -> NotFound，409 或空清單 -> NoCandidates
    async fn list_available_faculty(&self, slot: &LectureSlot) -> Result<Vec<FacultyCandidate>>;

    /// 可行的調課方案。404 -> NotFound，409 或空清單 -> NoOptions
    async fn list_rearrange_options(&self, slot: &LectureSlot) -> Result<Vec<RearrangeOption>>;

    /// 403 -> NotAllowed，409 -> StaleState
    async fn assign_faculty(&self, slot: &LectureSlot, faculty_id: &str) -> Result<ExecutionResult>;

    /// 404 -> NotFound，409 -> StaleState
    async fn execute_rearrange(
        &self,
        slot: &LectureSlot,
        primary_faculty_id: &str,
        secondary_faculty_id: &str,
    ) -> Result<ExecutionResult>;

    /// 班級目前的週課表
    async fn fetch_schedule(&self, class: &ClassRef) -> Result<ScheduleGrid>;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn headers(&self) -> &HashMap<String, String>;
    fn slots_per_day(&self) -> u8;
}
