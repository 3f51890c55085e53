use crate::adapters::dto::{
    AssignRequest, AvailableFacultyResponse, ErrorBody, ExecutionResponse, RearrangeOptionsResponse,
    RearrangeRequest, SlotRequest, TimetableResponse,
};
use crate::domain::model::{ClassRef, ExecutionResult, FacultyCandidate, LectureSlot, RearrangeOption};
use crate::domain::ports::{ConfigProvider, ConflictResolutionClient};
use crate::domain::schedule::ScheduleGrid;
use crate::utils::error::{ReplaceError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

/// 伺服器端點，各自決定 HTTP 狀態碼對應的錯誤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    AvailableFaculty,
    RearrangeOptions,
    AssignFaculty,
    ExecuteRearrange,
    Timetable,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Self::AvailableFaculty => "available-faculty",
            Self::RearrangeOptions => "rearrange-options",
            Self::AssignFaculty => "assign-faculty",
            Self::ExecuteRearrange => "execute-rearrange",
            Self::Timetable => "fetchtimetable",
        }
    }

    fn fallback_message(self, status: StatusCode) -> String {
        match (self, status.as_u16()) {
            (_, 400) => "The server rejected the request as incomplete".to_string(),
            (Self::ExecuteRearrange, 404) => "Primary faculty not found".to_string(),
            (_, 404) => "Class not found".to_string(),
            (_, 403) => "Faculty not in allowed list for this class".to_string(),
            (Self::AvailableFaculty, 409) => "No faculty available for this time slot".to_string(),
            (Self::RearrangeOptions, 409) => "No possible rearrangement options found".to_string(),
            (Self::AssignFaculty, 409) => "Faculty is no longer available".to_string(),
            (Self::ExecuteRearrange, 409) => "Rearrangement is no longer possible".to_string(),
            _ => format!("Unexpected response status {}", status),
        }
    }

    fn error_for(self, status: StatusCode, message: String) -> ReplaceError {
        match status.as_u16() {
            400 => ReplaceError::ValidationError { message },
            403 => ReplaceError::NotAllowed { message },
            404 => ReplaceError::NotFound { message },
            409 => match self {
                Self::AvailableFaculty => ReplaceError::NoCandidates { message },
                Self::RearrangeOptions => ReplaceError::NoOptions { message },
                Self::AssignFaculty | Self::ExecuteRearrange => ReplaceError::StaleState { message },
                Self::Timetable => ReplaceError::protocol(message),
            },
            code if status.is_server_error() => ReplaceError::ServerError {
                status: code,
                message,
            },
            _ => ReplaceError::protocol(message),
        }
    }
}

/// 以 reqwest 實作的 `ConflictResolutionClient`
pub struct HttpConflictClient {
    client: Client,
    base_url: String,
    slots_per_day: u8,
}

impl HttpConflictClient {
    pub fn new(config: &dyn ConfigProvider) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (key, value) in config.headers() {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                ReplaceError::InvalidConfigValueError {
                    field: format!("server.headers.{}", key),
                    value: key.clone(),
                    reason: e.to_string(),
                }
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                ReplaceError::InvalidConfigValueError {
                    field: format!("server.headers.{}", key),
                    value: "<hidden>".to_string(),
                    reason: e.to_string(),
                }
            })?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .default_headers(headers)
            .build()?;

        tracing::debug!(
            "HTTP client ready for {} ({} custom headers)",
            config.base_url(),
            config.headers().len()
        );

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            slots_per_day: config.slots_per_day(),
        })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }

    async fn send<T: DeserializeOwned>(&self, endpoint: Endpoint, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("📡 {}: response status {}", endpoint.path(), status);

        let body = response.text().await?;
        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| {
                ReplaceError::protocol(format!("Malformed {} response: {}", endpoint.path(), e))
            });
        }

        let message =
            ErrorBody::message_from(&body).unwrap_or_else(|| endpoint.fallback_message(status));
        tracing::warn!("❌ {}: {} {}", endpoint.path(), status, message);
        Err(endpoint.error_for(status, message))
    }
}

#[async_trait]
impl ConflictResolutionClient for HttpConflictClient {
    async fn list_available_faculty(&self, slot: &LectureSlot) -> Result<Vec<FacultyCandidate>> {
        let endpoint = Endpoint::AvailableFaculty;
        let request = self
            .client
            .post(self.url(endpoint))
            .json(&SlotRequest::from(slot));
        let response: AvailableFacultyResponse = self.send(endpoint, request).await?;
        response.into_domain()
    }

    async fn list_rearrange_options(&self, slot: &LectureSlot) -> Result<Vec<RearrangeOption>> {
        let endpoint = Endpoint::RearrangeOptions;
        let request = self
            .client
            .post(self.url(endpoint))
            .json(&SlotRequest::from(slot));
        let response: RearrangeOptionsResponse = self.send(endpoint, request).await?;
        response.into_domain(slot)
    }

    async fn assign_faculty(&self, slot: &LectureSlot, faculty_id: &str) -> Result<ExecutionResult> {
        let endpoint = Endpoint::AssignFaculty;
        let body = AssignRequest {
            slot: SlotRequest::from(slot),
            faculty_id,
        };
        let request = self.client.post(self.url(endpoint)).json(&body);
        let response: ExecutionResponse = self.send(endpoint, request).await?;
        response.into_domain(slot, faculty_id)
    }

    async fn execute_rearrange(
        &self,
        slot: &LectureSlot,
        primary_faculty_id: &str,
        secondary_faculty_id: &str,
    ) -> Result<ExecutionResult> {
        let endpoint = Endpoint::ExecuteRearrange;
        let body = RearrangeRequest {
            slot: SlotRequest::from(slot),
            primary_faculty_id,
            secondary_faculty_id,
        };
        let request = self.client.post(self.url(endpoint)).json(&body);
        let response: ExecutionResponse = self.send(endpoint, request).await?;
        response.into_domain(slot, primary_faculty_id)
    }

    async fn fetch_schedule(&self, class: &ClassRef) -> Result<ScheduleGrid> {
        let endpoint = Endpoint::Timetable;
        let sem = class.semester.to_string();
        let request = self.client.get(self.url(endpoint)).query(&[
            ("sem", sem.as_str()),
            ("branch", class.branch.as_str()),
            ("class", class.class_name.as_str()),
        ]);
        let response: TimetableResponse = self.send(endpoint, request).await?;
        response.into_domain(self.slots_per_day, class)
    }
}
