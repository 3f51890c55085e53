pub mod notifications;
pub mod session;
pub mod workflow;

pub use crate::domain::model::{ExecutionResult, FacultyCandidate, LectureSlot, RearrangeOption};
pub use crate::domain::ports::{ConfigProvider, ConflictResolutionClient};
pub use crate::utils::error::Result;
pub use notifications::{Notification, NotificationQueue};
pub use session::ReplacementSession;
pub use workflow::{Failure, Pick, ReplacementWorkflow, ResponseOutcome, Stage, WorkflowState};
