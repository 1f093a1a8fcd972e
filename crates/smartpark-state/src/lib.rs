//! smartpark-state — embedded state store for SmartPark.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! state for floors, parking slots, parking records, hourly charges, and the
//! admin audit trail.
//!
//! # Architecture
//!
//! All domain types are JSON-serialized into redb's `&[u8]` value columns.
//! Keys are zero-padded (`{floor:010}/{slot:010}`, `{id:020}`) so that table
//! iteration order matches numeric order.
//!
//! An active [`ParkingRecord`] (no exit time) is the single source of truth
//! for slot occupancy; slots themselves carry no occupied flag.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
