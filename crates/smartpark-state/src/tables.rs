//! redb table definitions for the SmartPark state store.
//!
//! Record tables use `&str` keys and `&[u8]` values (JSON-serialized domain
//! types). Numeric key parts are zero-padded so lexical order is numeric order.

use redb::TableDefinition;

/// Table shape shared by every JSON-valued table.
pub type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Floors keyed by `{floor_number:010}`.
pub const FLOORS: JsonTable = TableDefinition::new("floors");

/// Slots keyed by `{floor_number:010}/{slot_number:010}`.
pub const SLOTS: JsonTable = TableDefinition::new("slots");

/// Parking records keyed by `{id:020}`.
pub const RECORDS: JsonTable = TableDefinition::new("records");

/// Hourly charges keyed by vehicle type wire name (`CAR`, `BIKE`, ...).
pub const CHARGES: JsonTable = TableDefinition::new("charges");

/// Audit entries keyed by `{id:020}`.
pub const AUDIT: JsonTable = TableDefinition::new("audit");

/// Monotonic counters (`record_seq`, `audit_seq`).
pub const META: TableDefinition<&str, u64> = TableDefinition::new("meta");
