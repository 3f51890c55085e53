use crate::domain::assignment_key::AssignmentKey;
use crate::domain::calendar::{date_from_day, day_from_date};
use crate::utils::error::{ReplaceError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_required_field};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 一天最多的節數（9:00 AM - 5:00 PM，每節一小時）
pub const MAX_TIME_SLOTS: u8 = 8;

/// 空堂的保留代碼
pub const FREE_SLOT: &str = "free";

pub const MIN_SEMESTER: u8 = 1;
pub const MAX_SEMESTER: u8 = 8;

/// 上課日（不含星期日）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    #[serde(rename = "mon")]
    Monday,
    #[serde(rename = "tue")]
    Tuesday,
    #[serde(rename = "wed")]
    Wednesday,
    #[serde(rename = "thu")]
    Thursday,
    #[serde(rename = "fri")]
    Friday,
    #[serde(rename = "sat")]
    Saturday,
}

impl Weekday {
    pub const ALL: [Weekday; 6] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    /// 伺服器使用的短代碼
    pub fn code(self) -> &'static str {
        match self {
            Weekday::Monday => "mon",
            Weekday::Tuesday => "tue",
            Weekday::Wednesday => "wed",
            Weekday::Thursday => "thu",
            Weekday::Friday => "fri",
            Weekday::Saturday => "sat",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }

    pub fn num_days_from_monday(self) -> u32 {
        self.to_chrono().num_days_from_monday()
    }

    pub fn to_chrono(self) -> chrono::Weekday {
        match self {
            Weekday::Monday => chrono::Weekday::Mon,
            Weekday::Tuesday => chrono::Weekday::Tue,
            Weekday::Wednesday => chrono::Weekday::Wed,
            Weekday::Thursday => chrono::Weekday::Thu,
            Weekday::Friday => chrono::Weekday::Fri,
            Weekday::Saturday => chrono::Weekday::Sat,
        }
    }

    /// 星期日不是上課日，回傳 None
    pub fn from_chrono(weekday: chrono::Weekday) -> Option<Self> {
        match weekday {
            chrono::Weekday::Mon => Some(Weekday::Monday),
            chrono::Weekday::Tue => Some(Weekday::Tuesday),
            chrono::Weekday::Wed => Some(Weekday::Wednesday),
            chrono::Weekday::Thu => Some(Weekday::Thursday),
            chrono::Weekday::Fri => Some(Weekday::Friday),
            chrono::Weekday::Sat => Some(Weekday::Saturday),
            chrono::Weekday::Sun => None,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Weekday {
    type Err = ReplaceError;

    /// 接受 "mon" 或 "Monday"（不分大小寫）
    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_ascii_lowercase();
        Weekday::ALL
            .into_iter()
            .find(|day| day.code() == needle || day.label().to_ascii_lowercase() == needle)
            .ok_or_else(|| {
                ReplaceError::validation(format!(
                    "Unknown day '{}': expected one of mon, tue, wed, thu, fri, sat",
                    s
                ))
            })
    }
}

/// 節次索引，0 為當天第一節
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TimeSlotIndex(u8);

impl TimeSlotIndex {
    pub fn new(index: u8) -> Result<Self> {
        if index >= MAX_TIME_SLOTS {
            return Err(ReplaceError::validation(format!(
                "Time slot {} is out of range (0-{})",
                index,
                MAX_TIME_SLOTS - 1
            )));
        }
        Ok(Self(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// 給人看的節次編號（從 1 開始）
    pub fn lecture_number(self) -> u8 {
        self.0 + 1
    }

    /// 例如 "9:00 AM - 10:00 AM"
    pub fn label(self) -> String {
        let start = 9 + u32::from(self.0);
        format!("{} - {}", clock_label(start), clock_label(start + 1))
    }

    /// 解析伺服器課表用的 "Time Slot 3" 鍵（1-based）
    pub fn from_slot_key(key: &str) -> Result<Self> {
        let number = key
            .trim()
            .strip_prefix("Time Slot")
            .map(str::trim)
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| *n >= 1)
            .ok_or_else(|| ReplaceError::protocol(format!("Invalid time slot key '{}'", key)))?;
        Self::new(number - 1).map_err(|_| {
            ReplaceError::protocol(format!("Time slot key '{}' is out of range", key))
        })
    }

    pub fn slot_key(self) -> String {
        format!("Time Slot {}", self.lecture_number())
    }
}

fn clock_label(hour: u32) -> String {
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:00 {}", display, suffix)
}

impl fmt::Display for TimeSlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 一個班級（分部 + 學期 + 班別）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassRef {
    pub branch: String,
    pub semester: u8,
    pub class_name: String,
}

impl ClassRef {
    pub fn new(branch: impl Into<String>, semester: u8, class_name: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            semester,
            class_name: class_name.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_non_empty_string("branch", &self.branch)?;
        validate_non_empty_string("class", &self.class_name)?;
        if !(MIN_SEMESTER..=MAX_SEMESTER).contains(&self.semester) {
            return Err(ReplaceError::validation(format!(
                "Semester {} is out of range ({}-{})",
                self.semester, MIN_SEMESTER, MAX_SEMESTER
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (Sem {})", self.branch, self.class_name, self.semester)
    }
}

/// 操作員正在填寫的節次選擇；日期與星期永遠保持一致
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotSelection {
    date: Option<NaiveDate>,
    day: Option<Weekday>,
    branch: Option<String>,
    semester: Option<u8>,
    class_name: Option<String>,
    time_slot: Option<TimeSlotIndex>,
}

impl SlotSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接改日期：星期跟著日期走（星期日會清空星期）
    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = Some(date);
        self.day = day_from_date(date);
    }

    /// 直接改星期：日期改為 `today` 當天或之後最近的那一天；
    /// 算不出日期時清空日期，讓選擇保持未完成
    pub fn set_day(&mut self, day: Weekday, today: NaiveDate) {
        self.day = Some(day);
        self.date = date_from_day(day, today);
    }

    pub fn set_branch(&mut self, branch: impl Into<String>) {
        self.branch = Some(branch.into());
    }

    pub fn set_semester(&mut self, semester: u8) {
        self.semester = Some(semester);
    }

    pub fn set_class_name(&mut self, class_name: impl Into<String>) {
        self.class_name = Some(class_name.into());
    }

    pub fn set_time_slot(&mut self, time_slot: TimeSlotIndex) {
        self.time_slot = Some(time_slot);
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.set_date(date);
        self
    }

    pub fn with_day(mut self, day: Weekday, today: NaiveDate) -> Self {
        self.set_day(day, today);
        self
    }

    pub fn with_class(mut self, class: &ClassRef) -> Self {
        self.branch = Some(class.branch.clone());
        self.semester = Some(class.semester);
        self.class_name = Some(class.class_name.clone());
        self
    }

    pub fn with_time_slot(mut self, time_slot: TimeSlotIndex) -> Self {
        self.time_slot = Some(time_slot);
        self
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn day(&self) -> Option<Weekday> {
        self.day
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn semester(&self) -> Option<u8> {
        self.semester
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn time_slot(&self) -> Option<TimeSlotIndex> {
        self.time_slot
    }

    pub fn is_complete(&self) -> bool {
        self.complete().is_ok()
    }

    pub fn complete(&self) -> Result<LectureSlot> {
        self.complete_within(MAX_TIME_SLOTS)
    }

    /// 所有欄位齊全才轉成 LectureSlot；`slots_per_day` 為畫面上的節數
    pub fn complete_within(&self, slots_per_day: u8) -> Result<LectureSlot> {
        let date = *validate_required_field("date", &self.date)?;
        let day = match self.day {
            Some(day) => day,
            None => {
                return Err(ReplaceError::validation(format!(
                    "{} is a Sunday, which is not an operational day",
                    date
                )))
            }
        };
        if day_from_date(date) != Some(day) {
            return Err(ReplaceError::validation(format!(
                "Date {} does not fall on {}",
                date, day
            )));
        }

        let class = ClassRef {
            branch: validate_required_field("branch", &self.branch)?.clone(),
            semester: *validate_required_field("sem", &self.semester)?,
            class_name: validate_required_field("class", &self.class_name)?.clone(),
        };
        class.validate()?;

        let time_slot = *validate_required_field("lec_no", &self.time_slot)?;
        if time_slot.index() >= slots_per_day {
            return Err(ReplaceError::validation(format!(
                "Time slot {} is out of range for a {}-slot day",
                time_slot, slots_per_day
            )));
        }

        Ok(LectureSlot {
            date,
            day,
            class,
            time_slot,
        })
    }
}

/// 已驗證、完整的節次選擇
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LectureSlot {
    pub date: NaiveDate,
    pub day: Weekday,
    pub class: ClassRef,
    pub time_slot: TimeSlotIndex,
}

impl LectureSlot {
    pub fn assignment_key(&self) -> AssignmentKey {
        AssignmentKey::new(self.class.clone(), Some(self.time_slot))
    }
}

impl fmt::Display for LectureSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}), lecture {}",
            self.class,
            self.day,
            self.date,
            self.time_slot.lecture_number()
        )
    }
}

/// 伺服器提供的代課候選人
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacultyCandidate {
    pub faculty_id: String,
    pub name: String,
    pub department: String,
}

/// 調課方案中移到衝突節次的老師
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimaryMove {
    pub faculty_id: String,
    pub name: String,
    pub current_class: AssignmentKey,
    pub new_class: AssignmentKey,
}

/// 接手空出來那一節的老師
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecondaryMove {
    pub faculty_id: String,
    pub name: String,
    pub takes_over: AssignmentKey,
}

/// 一個調課方案：兩位老師、兩個班級節次
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RearrangeOption {
    option_id: String,
    primary: PrimaryMove,
    secondary: SecondaryMove,
    description: String,
}

impl RearrangeOption {
    pub fn new(
        option_id: impl Into<String>,
        primary: PrimaryMove,
        secondary: SecondaryMove,
        description: impl Into<String>,
    ) -> Result<Self> {
        let option_id = option_id.into();
        if primary.faculty_id == secondary.faculty_id {
            return Err(ReplaceError::protocol(format!(
                "Rearrange option '{}' moves the same faculty '{}' twice",
                option_id, primary.faculty_id
            )));
        }
        if primary.current_class.class != secondary.takes_over.class {
            return Err(ReplaceError::protocol(format!(
                "Rearrange option '{}' vacates {} but hands over {}",
                option_id, primary.current_class, secondary.takes_over
            )));
        }
        Ok(Self {
            option_id,
            primary,
            secondary,
            description: description.into(),
        })
    }

    pub fn option_id(&self) -> &str {
        &self.option_id
    }

    pub fn primary(&self) -> &PrimaryMove {
        &self.primary
    }

    pub fn secondary(&self) -> &SecondaryMove {
        &self.secondary
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionKind {
    Direct,
    Manual,
    Rearranged,
}

impl FromStr for ExecutionKind {
    type Err = ReplaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "direct" => Ok(Self::Direct),
            "manual" => Ok(Self::Manual),
            "rearranged" => Ok(Self::Rearranged),
            other => Err(ReplaceError::protocol(format!(
                "Unknown result type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ExecutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Direct => "direct",
            Self::Manual => "manual",
            Self::Rearranged => "rearranged",
        };
        f.write_str(label)
    }
}

/// 調課後受影響的班級，每個班級各有一則通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffectedClass {
    pub class: ClassRef,
    pub new_faculty: String,
    pub previous_faculty: Option<String>,
    pub message: String,
}

/// 執行結果。`Rearranged` 一定有兩個受影響班級，其他類型則沒有
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    kind: ExecutionKind,
    assigned_faculty: String,
    faculty_name: Option<String>,
    message: Option<String>,
    affected_classes: Vec<AffectedClass>,
}

impl ExecutionResult {
    pub fn assigned(
        kind: ExecutionKind,
        assigned_faculty: impl Into<String>,
        faculty_name: Option<String>,
        message: impl Into<String>,
    ) -> Result<Self> {
        if kind == ExecutionKind::Rearranged {
            return Err(ReplaceError::protocol(
                "A rearranged result must list the affected classes",
            ));
        }
        Ok(Self {
            kind,
            assigned_faculty: assigned_faculty.into(),
            faculty_name,
            message: Some(message.into()),
            affected_classes: Vec::new(),
        })
    }

    pub fn rearranged(
        assigned_faculty: impl Into<String>,
        faculty_name: Option<String>,
        affected_classes: Vec<AffectedClass>,
    ) -> Result<Self> {
        if affected_classes.len() != 2 {
            return Err(ReplaceError::protocol(format!(
                "A rearranged result must affect exactly 2 classes, got {}",
                affected_classes.len()
            )));
        }
        Ok(Self {
            kind: ExecutionKind::Rearranged,
            assigned_faculty: assigned_faculty.into(),
            faculty_name,
            message: None,
            affected_classes,
        })
    }

    pub fn kind(&self) -> ExecutionKind {
        self.kind
    }

    pub fn assigned_faculty(&self) -> &str {
        &self.assigned_faculty
    }

    pub fn faculty_name(&self) -> Option<&str> {
        self.faculty_name.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn affected_classes(&self) -> &[AffectedClass] {
        &self.affected_classes
    }
}
