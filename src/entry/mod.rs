//!
//! Entity records persisted by the plugin: the face/sticker cache and its
//! per-tag association, the message log, and the nudge log.
//!
mod face;
mod message;
mod nudge;

pub use face::{FaceRecord, FaceTagRecord};
pub use message::{MessageKind, MessageRecord};
pub use nudge::NudgeRecord;
