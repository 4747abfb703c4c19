// Copyright (c) 2026 chatstore contributors
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! This crate offers:
//!
//! *   A persistence layer for chat-bot plugins backed by a pooled
//!     relational-database connection;
//! *   Dialect auto-detection from a `jdbc:`-style connection URL with
//!     backend-specific pool tuning;
//! *   Two injected SQL functions, `rand` and `dice`, reachable from a
//!     typed query builder;
//! *   Entity records for the face/sticker cache, the message log and the
//!     nudge log.
//!
//! ## Example
//!
//! ```no_run
//! use chatstore::{Configuration, Loader, Order};
//! use chatstore::entry::{FaceRecord, FaceTagRecord, MessageRecord, NudgeRecord};
//!
//! fn main() -> chatstore::Result<()> {
//!     let loader = Loader::new("data/chatstore.properties", chatstore::DEFAULT_SETTINGS);
//!     let mut configuration = Configuration::from_loader(&loader)?;
//!     configuration
//!         .entity::<FaceRecord>()
//!         .entity::<FaceTagRecord>()
//!         .entity::<MessageRecord>()
//!         .entity::<NudgeRecord>();
//!     let factory = configuration.build()?;
//!
//!     let session = factory.open_session()?;
//!     let faces = session
//!         .select_query::<FaceRecord, _>(|builder, query| {
//!             query.order_by(builder.rand(), Order::Asc);
//!             query.limit(3);
//!         })
//!         .fetch()?;
//!     println!("drew {} faces", faces.len());
//!     Ok(())
//! }
//! ```
mod config;
mod data;
mod dialect;
mod entity;
mod errors;
mod functions;
mod platform;
mod query;
mod session;
mod value;

pub mod entry;

#[doc(inline)]
pub use config::{
    Configuration, Loader, CONNECTION_DIALECT, CONNECTION_URL, DEFAULT_SETTINGS,
    POOL_CONNECTION_TIMEOUT, POOL_MAXIMUM_SIZE, POOL_MINIMUM_IDLE, POOL_PROVIDER,
};
#[doc(inline)]
pub use data::{Row, Rows};
#[doc(inline)]
pub use dialect::{ConnectionSettings, Dialect};
#[doc(inline)]
pub use entity::{Entity, EntityDescriptor, FromRow, ToRow};
#[doc(inline)]
pub use errors::{Result, StoreError};
#[doc(inline)]
pub use functions::{FunctionDescriptor, FunctionRegistry, ReturnKind};
#[doc(inline)]
pub use query::{ExecutableQuery, Expr, Order, Predicate, QueryBuilder, Root, SelectQuery, UpdateQuery};
#[doc(inline)]
pub use session::{Session, SessionFactory, Transaction};
#[doc(inline)]
pub use value::{FromValue, ToValue, Value};
