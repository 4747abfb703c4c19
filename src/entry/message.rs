use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::data::Row;
use crate::entity::{Entity, FromRow, ToRow};
use crate::errors::Result;
use crate::value::{ToValue, Value};

/// Where a logged message came from. Stored as its integer ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Group,
    Friend,
    Temp,
    Stranger,
}

impl MessageKind {
    pub fn ordinal(&self) -> i32 {
        match self {
            MessageKind::Group => 0,
            MessageKind::Friend => 1,
            MessageKind::Temp => 2,
            MessageKind::Stranger => 3,
        }
    }

    pub fn from_ordinal(ordinal: i32) -> Option<MessageKind> {
        match ordinal {
            0 => Some(MessageKind::Group),
            1 => Some(MessageKind::Friend),
            2 => Some(MessageKind::Temp),
            3 => Some(MessageKind::Stranger),
            _ => None,
        }
    }
}

/// One logged message. Append-only, except for the `recall` flag flip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    pub bot: i64,
    pub from_id: i64,
    pub target_id: i64,
    /// Message ids, comma joined.
    pub ids: String,
    /// Internal message ids, comma joined.
    pub internal_ids: String,
    /// Epoch seconds at send time.
    pub time: i32,
    pub kind: i32,
    /// Serialized message chain.
    pub code: String,
    pub recall: bool,
}

impl MessageRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new<S: Into<String>, I: Into<String>, C: Into<String>>(
        bot: i64,
        from_id: i64,
        target_id: i64,
        ids: S,
        internal_ids: I,
        kind: MessageKind,
        code: C,
    ) -> Self {
        MessageRecord {
            id: 0,
            bot,
            from_id,
            target_id,
            ids: ids.into(),
            internal_ids: internal_ids.into(),
            time: Local::now().timestamp() as i32,
            kind: kind.ordinal(),
            code: code.into(),
            recall: false,
        }
    }

    pub fn kind(&self) -> Option<MessageKind> {
        MessageKind::from_ordinal(self.kind)
    }
}

impl Entity for MessageRecord {
    fn table_name() -> &'static str {
        "message_record"
    }

    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "bot",
            "from_id",
            "target_id",
            "ids",
            "internal_ids",
            "time",
            "kind",
            "code",
            "recall",
        ]
    }

    fn insert_columns() -> &'static [&'static str] {
        &[
            "bot",
            "from_id",
            "target_id",
            "ids",
            "internal_ids",
            "time",
            "kind",
            "code",
            "recall",
        ]
    }

    fn create_table_sql() -> &'static str {
        "create table if not exists message_record (\
         `id` integer primary key autoincrement, \
         `bot` integer not null, \
         `from_id` integer not null, \
         `target_id` integer, \
         `ids` text, \
         `internal_ids` text, \
         `time` integer not null, \
         `kind` integer not null, \
         `code` text not null, \
         `recall` integer not null default 0)"
    }
}

impl FromRow for MessageRecord {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(MessageRecord {
            id: row.get("id")?,
            bot: row.get("bot")?,
            from_id: row.get("from_id")?,
            target_id: row.get("target_id")?,
            ids: row.get("ids")?,
            internal_ids: row.get("internal_ids")?,
            time: row.get("time")?,
            kind: row.get("kind")?,
            code: row.get("code")?,
            recall: row.get("recall")?,
        })
    }
}

impl ToRow for MessageRecord {
    fn to_row(&self) -> Vec<Value> {
        vec![
            self.bot.to_value(),
            self.from_id.to_value(),
            self.target_id.to_value(),
            self.ids.to_value(),
            self.internal_ids.to_value(),
            self.time.to_value(),
            self.kind.to_value(),
            self.code.to_value(),
            self.recall.to_value(),
        ]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kind_round_trip() {
        for kind in [
            MessageKind::Group,
            MessageKind::Friend,
            MessageKind::Temp,
            MessageKind::Stranger,
        ] {
            assert_eq!(MessageKind::from_ordinal(kind.ordinal()), Some(kind));
        }
        assert_eq!(MessageKind::from_ordinal(9), None);
    }
}
