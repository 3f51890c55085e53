use crate::domain::model::{ClassRef, TimeSlotIndex, Weekday, FREE_SLOT, MAX_TIME_SLOTS};
use crate::utils::error::{ReplaceError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// 畫面支援的每日節數
pub const SUPPORTED_SLOTS_PER_DAY: [u8; 2] = [5, 8];

/// 單一班級的週課表：(星期, 節次) -> 老師代碼。
///
/// 建立後不可修改；課表的變更走伺服器端的儲存流程，這裡只讀。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleGrid {
    class: Option<ClassRef>,
    slots_per_day: u8,
    // 只存有人的格子，其餘視為 "free"
    cells: BTreeMap<(Weekday, TimeSlotIndex), String>,
}

impl ScheduleGrid {
    pub fn new<I>(slots_per_day: u8, cells: I) -> Result<Self>
    where
        I: IntoIterator<Item = ((Weekday, TimeSlotIndex), String)>,
    {
        if !SUPPORTED_SLOTS_PER_DAY.contains(&slots_per_day) {
            return Err(ReplaceError::validation(format!(
                "A schedule grid has 5 or 8 slots per day, not {}",
                slots_per_day
            )));
        }

        let mut stored = BTreeMap::new();
        for ((day, slot), code) in cells {
            let code = code.trim();
            if code.is_empty() || code == FREE_SLOT {
                continue;
            }
            if slot.index() >= slots_per_day {
                return Err(ReplaceError::validation(format!(
                    "{} slot {} is outside a {}-slot day",
                    day, slot, slots_per_day
                )));
            }
            stored.insert((day, slot), code.to_string());
        }

        Ok(Self {
            class: None,
            slots_per_day,
            cells: stored,
        })
    }

    pub fn empty(slots_per_day: u8) -> Result<Self> {
        Self::new(slots_per_day, std::iter::empty())
    }

    pub fn for_class(mut self, class: ClassRef) -> Self {
        self.class = Some(class);
        self
    }

    /// 由伺服器的 `{"Monday": {"Time Slot 1": "fac1", ...}}` 格式建立。
    /// 缺少的格子補成 "free"；超出節數的格子只能是 "free"。
    pub fn from_day_map(
        slots_per_day: u8,
        days: &BTreeMap<String, BTreeMap<String, String>>,
    ) -> Result<Self> {
        let mut cells = Vec::new();
        for (day_key, slots) in days {
            let day: Weekday = day_key.parse().map_err(|_| {
                ReplaceError::protocol(format!("Unknown day '{}' in timetable", day_key))
            })?;
            for (slot_key, code) in slots {
                let slot = TimeSlotIndex::from_slot_key(slot_key)?;
                if slot.index() >= slots_per_day {
                    if code.trim() != FREE_SLOT {
                        return Err(ReplaceError::protocol(format!(
                            "{} {} is assigned to '{}' but the day only has {} slots",
                            day, slot_key, code, slots_per_day
                        )));
                    }
                    continue;
                }
                cells.push(((day, slot), code.clone()));
            }
        }
        Self::new(slots_per_day, cells)
    }

    pub fn class(&self) -> Option<&ClassRef> {
        self.class.as_ref()
    }

    pub fn slots_per_day(&self) -> u8 {
        self.slots_per_day
    }

    fn in_range(&self, slot: TimeSlotIndex) -> bool {
        slot.index() < self.slots_per_day
    }

    /// 超出當日節數的格子不存在，回傳 `None`
    pub fn faculty_at(&self, day: Weekday, slot: TimeSlotIndex) -> Option<&str> {
        if !self.in_range(slot) {
            return None;
        }
        Some(
            self.cells
                .get(&(day, slot))
                .map(String::as_str)
                .unwrap_or(FREE_SLOT),
        )
    }

    pub fn is_free(&self, day: Weekday, slot: TimeSlotIndex) -> bool {
        self.in_range(slot) && !self.cells.contains_key(&(day, slot))
    }

    pub fn time_slots(&self) -> impl Iterator<Item = TimeSlotIndex> {
        (0..self.slots_per_day.min(MAX_TIME_SLOTS)).filter_map(|i| TimeSlotIndex::new(i).ok())
    }

    pub fn free_slots(&self, day: Weekday) -> Vec<TimeSlotIndex> {
        self.time_slots().filter(|slot| self.is_free(day, *slot)).collect()
    }

    pub fn faculty_codes(&self) -> BTreeSet<&str> {
        self.cells.values().map(String::as_str).collect()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.len()
    }
}

impl fmt::Display for ScheduleGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(class) = &self.class {
            writeln!(f, "{}", class)?;
        }
        write!(f, "{:<10}", "")?;
        for slot in self.time_slots() {
            write!(f, " {:>10}", format!("L{}", slot.lecture_number()))?;
        }
        writeln!(f)?;
        for day in Weekday::ALL {
            write!(f, "{:<10}", day.label())?;
            for slot in self.time_slots() {
                write!(f, " {:>10}", self.faculty_at(day, slot).unwrap_or(FREE_SLOT))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
