use anyhow::Result;
use chrono::NaiveDate;
use httpmock::prelude::*;
use lecture_replace::domain::model::{LectureSlot, TimeSlotIndex, Weekday};
use lecture_replace::domain::ports::ConflictResolutionClient;
use lecture_replace::utils::error::ReplaceError;
use lecture_replace::{ClassRef, ClientConfig, HttpConflictClient};
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

fn slot() -> LectureSlot {
    LectureSlot {
        date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
        day: Weekday::Monday,
        class: ClassRef::new("CSE", 1, "D1"),
        time_slot: TimeSlotIndex::new(0).unwrap(),
    }
}

#[tokio::test]
async fn test_fetch_schedule_builds_grid() -> Result<()> {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/fetchtimetable")
                .query_param("sem", "1")
                .query_param("branch", "CSE")
                .query_param("class", "D1");
            then.status(200).json_body(json!({
                "sem": 1,
                "branch": "CSE",
                "class": "D1",
                "schedule": {
                    "Monday": {"Time Slot 1": "FAC001", "Time Slot 2": "free"},
                    "Tuesday": {"Time Slot 3": "FAC002"}
                }
            }));
        })
        .await;

    let client = HttpConflictClient::new(&ClientConfig::new(server.url("/api")))?;
    let grid = client.fetch_schedule(&ClassRef::new("CSE", 1, "D1")).await?;

    let first = TimeSlotIndex::new(0)?;
    assert_eq!(grid.faculty_at(Weekday::Monday, first), Some("FAC001"));
    assert!(grid.is_free(Weekday::Monday, TimeSlotIndex::new(1)?));
    assert_eq!(grid.occupied_count(), 2);
    assert_eq!(grid.class(), Some(&ClassRef::new("CSE", 1, "D1")));

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_fetch_schedule_not_found_uses_error_field() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/fetchtimetable");
            then.status(404).json_body(json!({"error": "Class not found"}));
        })
        .await;

    let client = HttpConflictClient::new(&ClientConfig::new(server.url("/api")))?;
    let err = client
        .fetch_schedule(&ClassRef::new("CSE", 1, "Z9"))
        .await
        .unwrap_err();
    match err {
        ReplaceError::NotFound { message } => assert_eq!(message, "Class not found"),
        other => panic!("unexpected error {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_configured_headers_are_sent() -> Result<()> {
    std::env::set_var("LECTURE_REPLACE_IT_TOKEN", "token-123");

    let mut config_file = NamedTempFile::new()?;
    write!(
        config_file,
        r#"
[server]
base_url = "{}"
timeout_seconds = 5

[server.headers]
Authorization = "Bearer ${{LECTURE_REPLACE_IT_TOKEN}}"
"#,
        "http://placeholder"
    )?;

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/available-faculty")
                .header("Authorization", "Bearer token-123");
            then.status(200).json_body(json!({
                "success": true,
                "available_faculty": [{"faculty_id": "FAC002", "name": "Dr. Rao", "department": "CSE"}]
            }));
        })
        .await;

    let config = ClientConfig::from_file(config_file.path())?.with_base_url(Some(server.url("/api")));
    let client = HttpConflictClient::new(&config)?;
    let candidates = client.list_available_faculty(&slot()).await?;
    assert_eq!(candidates.len(), 1);

    mock.assert_async().await;
    std::env::remove_var("LECTURE_REPLACE_IT_TOKEN");
    Ok(())
}

#[tokio::test]
async fn test_malformed_success_body_is_protocol_error() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/rearrange-options");
            then.status(200).body("not json");
        })
        .await;

    let client = HttpConflictClient::new(&ClientConfig::new(server.url("/api")))?;
    let err = client.list_rearrange_options(&slot()).await.unwrap_err();
    assert!(matches!(err, ReplaceError::ProtocolError { .. }));
    Ok(())
}

#[tokio::test]
async fn test_underscore_keys_in_options_are_rejected() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/rearrange-options");
            then.status(200).json_body(json!({
                "success": true,
                "options": [{
                    "option_id": "fac1_fac2",
                    "primary_faculty": {"id": "fac1", "name": "Dr. A", "current_class": "CSE_D2_Sem1", "new_class": "CSE_D1_Sem1"},
                    "secondary_faculty": {"id": "fac2", "name": "Dr. B", "takes_over": "CSE_D2_Sem1"}
                }]
            }));
        })
        .await;

    let client = HttpConflictClient::new(&ClientConfig::new(server.url("/api")))?;
    let err = client.list_rearrange_options(&slot()).await.unwrap_err();
    assert!(matches!(err, ReplaceError::ProtocolError { .. }));
    Ok(())
}

#[tokio::test]
async fn test_rearrange_conflict_is_stale_state() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/execute-rearrange");
            then.status(409).json_body(json!({
                "success": false,
                "message": "Secondary faculty is no longer available"
            }));
        })
        .await;

    let client = HttpConflictClient::new(&ClientConfig::new(server.url("/api/")))?;
    let err = client
        .execute_rearrange(&slot(), "fac1", "fac2")
        .await
        .unwrap_err();
    match err {
        ReplaceError::StaleState { message } => {
            assert_eq!(message, "Secondary faculty is no longer available")
        }
        other => panic!("unexpected error {:?}", other),
    }
    Ok(())
}

#[test]
fn test_invalid_header_name_is_config_error() {
    let mut config = ClientConfig::new("http://localhost:5000/api");
    config
        .server
        .headers
        .insert("bad header".to_string(), "x".to_string());
    assert!(matches!(
        HttpConflictClient::new(&config),
        Err(ReplaceError::InvalidConfigValueError { .. })
    ));
}
