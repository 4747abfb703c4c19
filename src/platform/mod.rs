//!
//! Backend drivers. Only the single-file sqlite backend ships with one;
//! the remaining dialects resolve and register functions but cannot open
//! sessions.
//!
pub mod sqlite;
