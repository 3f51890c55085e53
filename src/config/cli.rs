use crate::domain::model::{ClassRef, SlotSelection, TimeSlotIndex, Weekday, MAX_TIME_SLOTS};
use crate::utils::error::{ReplaceError, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "lecture-replace")]
#[command(about = "Resolve a lecture conflict by direct replacement or rearrangement")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override server.base_url from the config file
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the weekly timetable of a class
    Timetable(ClassArgs),
    /// List faculty who are free to take the lecture
    Candidates(SlotArgs),
    /// List possible two-faculty rearrangements for the lecture
    Options(SlotArgs),
    /// Assign a free faculty member to the lecture
    Assign {
        #[command(flatten)]
        slot: SlotArgs,
        /// Faculty id, as listed by `candidates`
        #[arg(long)]
        faculty: String,
    },
    /// Execute one of the listed rearrangements
    Rearrange {
        #[command(flatten)]
        slot: SlotArgs,
        /// Option id, as listed by `options`
        #[arg(long)]
        option: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ClassArgs {
    /// Branch, falls back to defaults.branch
    #[arg(long)]
    pub branch: Option<String>,

    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=8))]
    pub sem: u8,

    #[arg(long = "class")]
    pub class_name: String,
}

impl ClassArgs {
    pub fn class_ref(&self, default_branch: Option<&str>) -> Result<ClassRef> {
        let branch = self
            .branch
            .as_deref()
            .or(default_branch)
            .ok_or_else(|| ReplaceError::validation("Missing required field: branch"))?;
        let class = ClassRef::new(branch, self.sem, self.class_name.clone());
        class.validate()?;
        Ok(class)
    }
}

#[derive(Debug, Clone, Args)]
pub struct SlotArgs {
    #[command(flatten)]
    pub class: ClassArgs,

    /// Lecture date (YYYY-MM-DD); defaults to today
    #[arg(long, conflicts_with = "day")]
    pub date: Option<NaiveDate>,

    /// Day of the week (mon..sat); resolved to its next date
    #[arg(long)]
    pub day: Option<Weekday>,

    /// Lecture number, starting at 1
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=(MAX_TIME_SLOTS as i64)))]
    pub slot: u8,
}

impl SlotArgs {
    pub fn to_selection(&self, default_branch: Option<&str>, today: NaiveDate) -> Result<SlotSelection> {
        let class = self.class.class_ref(default_branch)?;
        let time_slot = TimeSlotIndex::new(self.slot.saturating_sub(1))?;

        let selection = SlotSelection::new().with_class(&class).with_time_slot(time_slot);
        let selection = match (self.date, self.day) {
            (Some(date), _) => selection.with_date(date),
            (None, Some(day)) => selection.with_day(day, today),
            (None, None) => selection.with_date(today),
        };
        Ok(selection)
    }
}
