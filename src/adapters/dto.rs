//! 伺服器 JSON 格式與領域型別之間的轉換。
//!
//! 請求用借用欄位直接序列化；回應先反序列化成寬鬆的 DTO，
//! 再在 `into_domain` 裡檢查不變量，錯誤一律回報為 `ProtocolError`。

use crate::domain::assignment_key::AssignmentKey;
use crate::domain::model::{
    AffectedClass, ClassRef, ExecutionKind, ExecutionResult, FacultyCandidate, LectureSlot,
    PrimaryMove, RearrangeOption, SecondaryMove,
};
use crate::domain::schedule::ScheduleGrid;
use crate::utils::error::{ReplaceError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// 查詢與執行共用的節次欄位
#[derive(Debug, Serialize)]
pub struct SlotRequest<'a> {
    pub date: NaiveDate,
    pub day: &'static str,
    pub class: &'a str,
    pub sem: u8,
    pub branch: &'a str,
    pub lec_no: u8,
}

impl<'a> From<&'a LectureSlot> for SlotRequest<'a> {
    fn from(slot: &'a LectureSlot) -> Self {
        Self {
            date: slot.date,
            day: slot.day.code(),
            class: &slot.class.class_name,
            sem: slot.class.semester,
            branch: &slot.class.branch,
            lec_no: slot.time_slot.index(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssignRequest<'a> {
    #[serde(flatten)]
    pub slot: SlotRequest<'a>,
    pub faculty_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RearrangeRequest<'a> {
    #[serde(flatten)]
    pub slot: SlotRequest<'a>,
    pub primary_faculty_id: &'a str,
    pub secondary_faculty_id: &'a str,
}

/// 錯誤回應：替換流程用 `message`，課表查詢用 `error`
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn message_from(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        parsed
            .message
            .or(parsed.error)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
    }
}

fn default_success() -> bool {
    true
}

/// 伺服器有時把學期送成字串
fn semester_from_any<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u8),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .trim_start_matches("Sem")
            .parse()
            .map_err(serde::de::Error::custom),
    }
}

fn ensure_success(success: bool, message: Option<&str>, what: &str) -> Result<()> {
    if success {
        return Ok(());
    }
    Err(ReplaceError::protocol(format!(
        "{} returned success=false with status 200: {}",
        what,
        message.unwrap_or("no message")
    )))
}

#[derive(Debug, Deserialize)]
pub struct CandidateDto {
    pub faculty_id: String,
    pub name: Option<String>,
    pub department: Option<String>,
}

impl From<CandidateDto> for FacultyCandidate {
    fn from(dto: CandidateDto) -> Self {
        Self {
            name: dto.name.unwrap_or_else(|| dto.faculty_id.clone()),
            department: dto.department.unwrap_or_else(|| "N/A".to_string()),
            faculty_id: dto.faculty_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailableFacultyResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub available_faculty: Vec<CandidateDto>,
    pub message: Option<String>,
}

impl AvailableFacultyResponse {
    pub fn into_domain(self) -> Result<Vec<FacultyCandidate>> {
        ensure_success(self.success, self.message.as_deref(), "available-faculty")?;
        if self.available_faculty.is_empty() {
            return Err(ReplaceError::NoCandidates {
                message: self
                    .message
                    .unwrap_or_else(|| "No faculty available for this time slot".to_string()),
            });
        }
        Ok(self.available_faculty.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Deserialize)]
pub struct PrimaryFacultyDto {
    pub id: String,
    pub name: Option<String>,
    pub current_class: String,
    pub new_class: String,
}

#[derive(Debug, Deserialize)]
pub struct SecondaryFacultyDto {
    pub id: String,
    pub name: Option<String>,
    pub takes_over: String,
}

#[derive(Debug, Deserialize)]
pub struct RearrangeOptionDto {
    pub option_id: String,
    pub primary_faculty: PrimaryFacultyDto,
    pub secondary_faculty: SecondaryFacultyDto,
    #[serde(default)]
    pub description: String,
}

impl RearrangeOptionDto {
    pub fn into_domain(self) -> Result<RearrangeOption> {
        let primary = PrimaryMove {
            name: self
                .primary_faculty
                .name
                .unwrap_or_else(|| self.primary_faculty.id.clone()),
            faculty_id: self.primary_faculty.id,
            current_class: self.primary_faculty.current_class.parse::<AssignmentKey>()?,
            new_class: self.primary_faculty.new_class.parse::<AssignmentKey>()?,
        };
        let secondary = SecondaryMove {
            name: self
                .secondary_faculty
                .name
                .unwrap_or_else(|| self.secondary_faculty.id.clone()),
            faculty_id: self.secondary_faculty.id,
            takes_over: self.secondary_faculty.takes_over.parse::<AssignmentKey>()?,
        };
        RearrangeOption::new(self.option_id, primary, secondary, self.description)
    }
}

#[derive(Debug, Deserialize)]
pub struct RearrangeOptionsResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub options: Vec<RearrangeOptionDto>,
    pub message: Option<String>,
}

impl RearrangeOptionsResponse {
    /// 每個方案都必須把主要老師移進所選的班級
    pub fn into_domain(self, slot: &LectureSlot) -> Result<Vec<RearrangeOption>> {
        ensure_success(self.success, self.message.as_deref(), "rearrange-options")?;
        if self.options.is_empty() {
            return Err(ReplaceError::NoOptions {
                message: self
                    .message
                    .unwrap_or_else(|| "No possible rearrangement options found".to_string()),
            });
        }
        let target = slot.assignment_key().without_time_slot();
        self.options
            .into_iter()
            .map(|dto| {
                let option = dto.into_domain()?;
                if option.primary().new_class.without_time_slot() != target {
                    return Err(ReplaceError::protocol(format!(
                        "Rearrange option '{}' moves into {} instead of {}",
                        option.option_id(),
                        option.primary().new_class,
                        target
                    )));
                }
                Ok(option)
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct AffectedClassDto {
    pub branch: Option<String>,
    pub class: String,
    #[serde(deserialize_with = "semester_from_any")]
    pub sem: u8,
    pub message: String,
    pub new_faculty: String,
    pub previous_faculty: Option<String>,
}

impl AffectedClassDto {
    fn into_domain(self, fallback_branch: &str) -> AffectedClass {
        let branch = self
            .branch
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| fallback_branch.to_string());
        AffectedClass {
            class: ClassRef::new(branch, self.sem, self.class),
            new_faculty: self.new_faculty,
            previous_faculty: self.previous_faculty,
            message: self.message,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExecutionResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub assigned_faculty: Option<String>,
    pub faculty_name: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub affected_classes: Vec<AffectedClassDto>,
}

impl ExecutionResponse {
    /// `type` 缺省時視為手動指派。
    /// 調課回應可以不帶 `assigned_faculty`，此時用請求中的主要老師代碼。
    pub fn into_domain(self, slot: &LectureSlot, requested_faculty: &str) -> Result<ExecutionResult> {
        ensure_success(self.success, self.message.as_deref(), "execution")?;
        let kind = match self.kind.as_deref() {
            Some(raw) => raw.parse::<ExecutionKind>()?,
            None => ExecutionKind::Manual,
        };

        match kind {
            ExecutionKind::Rearranged => {
                let affected = self
                    .affected_classes
                    .into_iter()
                    .map(|a| a.into_domain(&slot.class.branch))
                    .collect();
                let assigned = self
                    .assigned_faculty
                    .unwrap_or_else(|| requested_faculty.to_string());
                ExecutionResult::rearranged(assigned, self.faculty_name, affected)
            }
            kind => {
                let assigned = self.assigned_faculty.ok_or_else(|| {
                    ReplaceError::protocol(format!(
                        "A {} result must name the assigned faculty",
                        kind
                    ))
                })?;
                let message = self.message.unwrap_or_else(|| {
                    format!(
                        "{} assigned to {}",
                        self.faculty_name.as_deref().unwrap_or(&assigned),
                        slot
                    )
                });
                ExecutionResult::assigned(kind, assigned, self.faculty_name, message)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TimetableResponse {
    #[serde(default)]
    pub schedule: BTreeMap<String, BTreeMap<String, String>>,
}

impl TimetableResponse {
    pub fn into_domain(self, slots_per_day: u8, class: &ClassRef) -> Result<ScheduleGrid> {
        Ok(ScheduleGrid::from_day_map(slots_per_day, &self.schedule)?.for_class(class.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{TimeSlotIndex, Weekday};
    use serde_json::json;

    fn slot() -> LectureSlot {
        LectureSlot {
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            day: Weekday::Monday,
            class: ClassRef::new("CSE", 1, "D1"),
            time_slot: TimeSlotIndex::new(2).unwrap(),
        }
    }

    #[test]
    fn test_slot_request_shape() {
        let slot = slot();
        let body = serde_json::to_value(AssignRequest {
            slot: SlotRequest::from(&slot),
            faculty_id: "FAC002",
        })
        .unwrap();
        assert_eq!(
            body,
            json!({
                "date": "2024-03-04",
                "day": "mon",
                "class": "D1",
                "sem": 1,
                "branch": "CSE",
                "lec_no": 2,
                "faculty_id": "FAC002"
            })
        );
    }

    #[test]
    fn test_candidates_fill_missing_details() {
        let response: AvailableFacultyResponse = serde_json::from_value(json!({
            "success": true,
            "available_faculty": [{"faculty_id": "FAC002"}],
            "count": 1
        }))
        .unwrap();
        let candidates = response.into_domain().unwrap();
        assert_eq!(candidates[0].name, "FAC002");
        assert_eq!(candidates[0].department, "N/A");
    }

    #[test]
    fn test_empty_candidate_list_is_no_candidates() {
        let response: AvailableFacultyResponse =
            serde_json::from_value(json!({"success": true, "available_faculty": []})).unwrap();
        assert!(matches!(
            response.into_domain(),
            Err(ReplaceError::NoCandidates { .. })
        ));
    }

    #[test]
    fn test_success_false_with_ok_status_is_protocol_error() {
        let response: RearrangeOptionsResponse =
            serde_json::from_value(json!({"success": false, "message": "odd"})).unwrap();
        assert!(matches!(
            response.into_domain(&slot()),
            Err(ReplaceError::ProtocolError { .. })
        ));
    }

    #[test]
    fn test_option_with_underscore_key_is_rejected() {
        let dto: RearrangeOptionDto = serde_json::from_value(json!({
            "option_id": "fac1_fac2",
            "primary_faculty": {
                "id": "fac1", "name": "Dr. A",
                "current_class": "CSE_D2_Sem1", "new_class": "CSE-D1-Sem1"
            },
            "secondary_faculty": {"id": "fac2", "name": "Dr. B", "takes_over": "CSE_D2_Sem1"},
            "description": "swap"
        }))
        .unwrap();
        assert!(dto.into_domain().is_err());
    }

    #[test]
    fn test_rearranged_response() {
        let response: ExecutionResponse = serde_json::from_value(json!({
            "success": true,
            "type": "rearranged",
            "affected_classes": [
                {"branch": "CSE", "class": "D1", "sem": 1, "message": "msg1", "new_faculty": "Dr. A", "previous_faculty": "Dr. B"},
                {"class": "D2", "sem": "1", "message": "msg2", "new_faculty": "Dr. B"}
            ]
        }))
        .unwrap();
        let result = response.into_domain(&slot(), "fac1").unwrap();
        assert_eq!(result.kind(), ExecutionKind::Rearranged);
        assert_eq!(result.assigned_faculty(), "fac1");
        assert_eq!(result.affected_classes()[1].class, ClassRef::new("CSE", 1, "D2"));
        assert_eq!(result.affected_classes()[1].previous_faculty, None);
    }

    #[test]
    fn test_rearranged_response_with_one_class_is_rejected() {
        let response: ExecutionResponse = serde_json::from_value(json!({
            "type": "rearranged",
            "assigned_faculty": "fac1",
            "affected_classes": [
                {"branch": "CSE", "class": "D1", "sem": 1, "message": "msg1", "new_faculty": "Dr. A"}
            ]
        }))
        .unwrap();
        assert!(response.into_domain(&slot(), "fac1").is_err());
    }

    #[test]
    fn test_direct_result_requires_assigned_faculty() {
        let response: ExecutionResponse = serde_json::from_value(json!({
            "success": true,
            "type": "direct",
            "message": "Assigned"
        }))
        .unwrap();
        assert!(matches!(
            response.into_domain(&slot(), "FAC002"),
            Err(ReplaceError::ProtocolError { .. })
        ));
    }

    #[test]
    fn test_option_must_move_into_selected_class() {
        let response: RearrangeOptionsResponse = serde_json::from_value(json!({
            "success": true,
            "options": [{
                "option_id": "fac1_fac2",
                "primary_faculty": {
                    "id": "fac1", "name": "Dr. A",
                    "current_class": "CSE-D2-Sem1", "new_class": "CSE-D3-Sem1"
                },
                "secondary_faculty": {"id": "fac2", "name": "Dr. B", "takes_over": "CSE-D2-Sem1"}
            }]
        }))
        .unwrap();
        assert!(matches!(
            response.into_domain(&slot()),
            Err(ReplaceError::ProtocolError { .. })
        ));
    }

    #[test]
    fn test_missing_type_defaults_to_manual() {
        let response: ExecutionResponse = serde_json::from_value(json!({
            "success": true,
            "assigned_faculty": "FAC002",
            "faculty_name": "Dr. Rao",
            "message": "Assigned"
        }))
        .unwrap();
        let result = response.into_domain(&slot(), "fac1").unwrap();
        assert_eq!(result.kind(), ExecutionKind::Manual);
        assert_eq!(result.message(), Some("Assigned"));
    }

    #[test]
    fn test_error_body_prefers_message() {
        assert_eq!(
            ErrorBody::message_from(r#"{"success": false, "message": "Class not found"}"#),
            Some("Class not found".to_string())
        );
        assert_eq!(
            ErrorBody::message_from(r#"{"error": "Missing sem, branch, or class"}"#),
            Some("Missing sem, branch, or class".to_string())
        );
        assert_eq!(ErrorBody::message_from("<html>"), None);
    }
}
