use crate::domain::model::{ClassRef, ExecutionKind, ExecutionResult};
use std::fmt;

/// 一則結果通知；調課時每個受影響班級各一則
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub class: Option<ClassRef>,
    pub headline: String,
    pub message: String,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.headline)?;
        write!(f, "{}", self.message)
    }
}

/// 依序逐則確認的通知佇列。
///
/// 關閉後即為終態，之後 `advance` 恆回傳 false；
/// 只有 `clear` 或新的執行結果會重建佇列。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationQueue {
    items: Vec<Notification>,
    index: usize,
    dismissed: bool,
}

impl NotificationQueue {
    pub fn new(items: Vec<Notification>) -> Self {
        Self {
            items,
            index: 0,
            dismissed: false,
        }
    }

    /// 由執行結果產生：調課為每班一則，其餘為單一則
    pub fn from_result(result: &ExecutionResult) -> Self {
        let items = match result.kind() {
            ExecutionKind::Rearranged => result
                .affected_classes()
                .iter()
                .map(|affected| Notification {
                    class: Some(affected.class.clone()),
                    headline: format!(
                        "{}: lecture now taken by {}",
                        affected.class, affected.new_faculty
                    ),
                    message: affected.message.clone(),
                })
                .collect(),
            kind => {
                let who = result
                    .faculty_name()
                    .unwrap_or_else(|| result.assigned_faculty());
                vec![Notification {
                    class: None,
                    headline: format!("Lecture assigned to {} ({})", who, kind),
                    message: result.message().unwrap_or_default().to_string(),
                }]
            }
        };
        Self::new(items)
    }

    pub fn current(&self) -> Option<&Notification> {
        if self.dismissed {
            return None;
        }
        self.items.get(self.index)
    }

    /// 前進一則；已在最後一則時回傳 false 並關閉佇列
    pub fn advance(&mut self) -> bool {
        if self.dismissed || self.items.is_empty() {
            return false;
        }
        if self.index + 1 < self.items.len() {
            self.index += 1;
            true
        } else {
            self.dismissed = true;
            false
        }
    }

    /// 後退一則；在第一則時不動
    pub fn retreat(&mut self) {
        if !self.dismissed && self.index > 0 {
            self.index -= 1;
        }
    }

    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed
    }

    pub fn messages(&self) -> Vec<&str> {
        self.items.iter().map(|n| n.message.as_str()).collect()
    }
}
