pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::HttpConflictClient;
pub use crate::config::ClientConfig;
pub use crate::core::{NotificationQueue, ReplacementSession, ReplacementWorkflow, WorkflowState};
pub use crate::domain::model::{ClassRef, LectureSlot, SlotSelection, TimeSlotIndex, Weekday};
pub use crate::utils::error::{ReplaceError, Result};
