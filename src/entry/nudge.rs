use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::data::Row;
use crate::entity::{Entity, FromRow, ToRow};
use crate::errors::Result;
use crate::value::{ToValue, Value};

/// One logged "nudge" (poke) event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NudgeRecord {
    pub id: i64,
    pub bot: i64,
    pub from_id: i64,
    pub target_id: i64,
    /// Chat the nudge happened in.
    pub subject_id: i64,
    pub action: String,
    pub suffix: String,
    /// Epoch seconds.
    pub time: i32,
}

impl NudgeRecord {
    pub fn new<A: Into<String>, S: Into<String>>(
        bot: i64,
        from_id: i64,
        target_id: i64,
        subject_id: i64,
        action: A,
        suffix: S,
    ) -> Self {
        NudgeRecord {
            id: 0,
            bot,
            from_id,
            target_id,
            subject_id,
            action: action.into(),
            suffix: suffix.into(),
            time: Local::now().timestamp() as i32,
        }
    }
}

impl Entity for NudgeRecord {
    fn table_name() -> &'static str {
        "nudge_record"
    }

    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "bot",
            "from_id",
            "target_id",
            "subject_id",
            "action",
            "suffix",
            "time",
        ]
    }

    fn insert_columns() -> &'static [&'static str] {
        &[
            "bot",
            "from_id",
            "target_id",
            "subject_id",
            "action",
            "suffix",
            "time",
        ]
    }

    fn create_table_sql() -> &'static str {
        "create table if not exists nudge_record (\
         `id` integer primary key autoincrement, \
         `bot` integer not null, \
         `from_id` integer not null, \
         `target_id` integer not null, \
         `subject_id` integer not null, \
         `action` text not null, \
         `suffix` text not null, \
         `time` integer not null)"
    }
}

impl FromRow for NudgeRecord {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(NudgeRecord {
            id: row.get("id")?,
            bot: row.get("bot")?,
            from_id: row.get("from_id")?,
            target_id: row.get("target_id")?,
            subject_id: row.get("subject_id")?,
            action: row.get("action")?,
            suffix: row.get("suffix")?,
            time: row.get("time")?,
        })
    }
}

impl ToRow for NudgeRecord {
    fn to_row(&self) -> Vec<Value> {
        vec![
            self.bot.to_value(),
            self.from_id.to_value(),
            self.target_id.to_value(),
            self.subject_id.to_value(),
            self.action.to_value(),
            self.suffix.to_value(),
            self.time.to_value(),
        ]
    }
}
