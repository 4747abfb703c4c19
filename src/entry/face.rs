use serde::{Deserialize, Serialize};

use crate::data::Row;
use crate::entity::{Entity, FromRow, ToRow};
use crate::errors::Result;
use crate::query::Order;
use crate::session::Session;
use crate::value::{ToValue, Value};

/// A cached custom face / sticker.
///
/// `md5` is the natural key: globally unique, never mutated after creation.
/// `code` holds the serialized message content the face was captured from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRecord {
    pub md5: String,
    pub code: String,
    pub content: String,
    pub url: String,
    pub height: i32,
    pub width: i32,
    pub disable: bool,
}

impl FaceRecord {
    /// The serialized message content as JSON.
    pub fn content_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.code)
    }

    /// Tags attached to this face, looked up by the shared `md5` value.
    /// A back-reference only: the tag records own the foreign key.
    pub fn tags(&self, session: &Session) -> Result<Vec<FaceTagRecord>> {
        let md5 = self.md5.clone();
        session
            .select_query::<FaceTagRecord, _>(|builder, query| {
                let root = query.root();
                let tag_md5 = root.get::<String>("md5");
                let predicate = builder.eq(tag_md5, builder.text(&md5));
                query.filter(predicate);
                query.order_by(root.get::<i64>("id"), Order::Asc);
            })
            .fetch()
    }
}

impl Entity for FaceRecord {
    fn table_name() -> &'static str {
        "face_record"
    }

    fn columns() -> &'static [&'static str] {
        &["md5", "code", "content", "url", "height", "width", "disable"]
    }

    fn create_table_sql() -> &'static str {
        "create table if not exists face_record (\
         `md5` text not null primary key, \
         `code` text not null, \
         `content` text not null, \
         `url` text not null, \
         `height` integer not null, \
         `width` integer not null, \
         `disable` integer not null default 0)"
    }
}

impl FromRow for FaceRecord {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(FaceRecord {
            md5: row.get("md5")?,
            code: row.get("code")?,
            content: row.get("content")?,
            url: row.get("url")?,
            height: row.get("height")?,
            width: row.get("width")?,
            disable: row.get("disable")?,
        })
    }
}

impl ToRow for FaceRecord {
    fn to_row(&self) -> Vec<Value> {
        vec![
            self.md5.to_value(),
            self.code.to_value(),
            self.content.to_value(),
            self.url.to_value(),
            self.height.to_value(),
            self.width.to_value(),
            self.disable.to_value(),
        ]
    }
}

/// One tag attached to a face, keyed back to it by `md5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceTagRecord {
    pub id: i64,
    pub md5: String,
    pub tag: String,
}

impl FaceTagRecord {
    pub fn new<S: Into<String>, T: Into<String>>(md5: S, tag: T) -> Self {
        FaceTagRecord {
            id: 0,
            md5: md5.into(),
            tag: tag.into(),
        }
    }
}

impl Entity for FaceTagRecord {
    fn table_name() -> &'static str {
        "face_tag_record"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "md5", "tag"]
    }

    fn insert_columns() -> &'static [&'static str] {
        &["md5", "tag"]
    }

    fn create_table_sql() -> &'static str {
        "create table if not exists face_tag_record (\
         `id` integer primary key autoincrement, \
         `md5` text not null, \
         `tag` text not null)"
    }
}

impl FromRow for FaceTagRecord {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(FaceTagRecord {
            id: row.get("id")?,
            md5: row.get("md5")?,
            tag: row.get("tag")?,
        })
    }
}

impl ToRow for FaceTagRecord {
    fn to_row(&self) -> Vec<Value> {
        vec![self.md5.to_value(), self.tag.to_value()]
    }
}
