//! 班級節次的組合鍵：`branch-class-SemN[-Time Slot M]`。
//!
//! 只接受 `-` 作為分隔符；`_` 一律拒絕，讓伺服器格式問題在邊界就被發現。

use crate::domain::model::{ClassRef, TimeSlotIndex};
use crate::utils::error::{ReplaceError, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const SEPARATOR: char = '-';
const SEMESTER_PREFIX: &str = "Sem";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssignmentKey {
    pub class: ClassRef,
    pub time_slot: Option<TimeSlotIndex>,
}

impl AssignmentKey {
    pub fn new(class: ClassRef, time_slot: Option<TimeSlotIndex>) -> Self {
        Self { class, time_slot }
    }

    /// 去掉節次，只留班級部分
    pub fn without_time_slot(&self) -> Self {
        Self {
            class: self.class.clone(),
            time_slot: None,
        }
    }
}

impl FromStr for AssignmentKey {
    type Err = ReplaceError;

    fn from_str(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            ReplaceError::protocol(format!("Invalid assignment key '{}': {}", raw, reason))
        };

        if raw.contains('_') {
            return Err(invalid("'_' is not a valid separator, expected '-'"));
        }

        let parts: Vec<&str> = raw.trim().split(SEPARATOR).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return Err(invalid("expected branch-class-SemN[-Time Slot M]"));
        }

        let branch = parts[0].trim();
        let class_name = parts[1].trim();
        if branch.is_empty() || class_name.is_empty() {
            return Err(invalid("branch and class must not be empty"));
        }

        let semester = parts[2]
            .trim()
            .strip_prefix(SEMESTER_PREFIX)
            .and_then(|n| n.parse::<u8>().ok())
            .ok_or_else(|| invalid("semester must look like 'Sem3'"))?;

        let time_slot = match parts.get(3) {
            Some(slot) => Some(TimeSlotIndex::from_slot_key(slot)?),
            None => None,
        };

        let class = ClassRef::new(branch, semester, class_name);
        class
            .validate()
            .map_err(|e| invalid(&e.user_friendly_message()))?;

        Ok(Self { class, time_slot })
    }
}

impl fmt::Display for AssignmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}{}",
            self.class.branch,
            self.class.class_name,
            SEMESTER_PREFIX,
            self.class.semester,
            sep = SEPARATOR
        )?;
        if let Some(slot) = self.time_slot {
            write!(f, "{}{}", SEPARATOR, slot.slot_key())?;
        }
        Ok(())
    }
}

impl Serialize for AssignmentKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
