//! StateStore — redb-backed state persistence for SmartPark.
//!
//! Provides typed CRUD operations over floors, slots, parking records,
//! charges, and audit entries. All values are JSON-serialized into redb's
//! `&[u8]` value columns. The store supports both on-disk and in-memory
//! backends.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

const RECORD_SEQ: &str = "record_seq";
const AUDIT_SEQ: &str = "audit_seq";

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store.
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(FLOORS).map_err(map_err!(Table))?;
        txn.open_table(SLOTS).map_err(map_err!(Table))?;
        txn.open_table(RECORDS).map_err(map_err!(Table))?;
        txn.open_table(CHARGES).map_err(map_err!(Table))?;
        txn.open_table(AUDIT).map_err(map_err!(Table))?;
        txn.open_table(META).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Generic JSON access ────────────────────────────────────────

    fn put_json<T: Serialize>(&self, table: JsonTable, key: &str, value: &T) -> StateResult<()> {
        let bytes = serde_json::to_vec(value).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(table).map_err(map_err!(Table))?;
            table
                .insert(key, bytes.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> StateResult<Option<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let value: T =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// List values in key order, keeping only keys starting with `prefix`.
    fn list_json<T: DeserializeOwned>(&self, table: JsonTable, prefix: &str) -> StateResult<Vec<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(prefix) {
                let item: T =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                results.push(item);
            }
        }
        Ok(results)
    }

    fn delete_key(&self, table: JsonTable, key: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(table).map_err(map_err!(Table))?;
            existed = table.remove(key).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(existed)
    }

    /// Atomically bump a counter in the meta table and return the new value.
    fn next_seq(&self, name: &str) -> StateResult<u64> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let next;
        {
            let mut table = txn.open_table(META).map_err(map_err!(Table))?;
            let current = table
                .get(name)
                .map_err(map_err!(Read))?
                .map(|guard| guard.value())
                .unwrap_or(0);
            next = current + 1;
            table.insert(name, next).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(next)
    }

    // ── Floors ─────────────────────────────────────────────────────

    /// Insert or update a floor.
    pub fn put_floor(&self, floor: &Floor) -> StateResult<()> {
        let key = floor.table_key();
        self.put_json(FLOORS, &key, floor)?;
        debug!(%key, "floor stored");
        Ok(())
    }

    pub fn get_floor(&self, floor_number: FloorNumber) -> StateResult<Option<Floor>> {
        self.get_json(FLOORS, &floor_key(floor_number))
    }

    /// List all floors, ascending by number.
    pub fn list_floors(&self) -> StateResult<Vec<Floor>> {
        self.list_json(FLOORS, "")
    }

    // ── Slots ──────────────────────────────────────────────────────

    /// Insert or update a slot.
    pub fn put_slot(&self, slot: &ParkingSlot) -> StateResult<()> {
        let key = slot.table_key();
        self.put_json(SLOTS, &key, slot)?;
        debug!(%key, vehicle_type = %slot.vehicle_type, "slot stored");
        Ok(())
    }

    /// Insert a batch of slots in one transaction; none are written on failure.
    pub fn put_slots(&self, slots: &[ParkingSlot]) -> StateResult<()> {
        let mut encoded = Vec::with_capacity(slots.len());
        for slot in slots {
            let bytes = serde_json::to_vec(slot).map_err(map_err!(Serialize))?;
            encoded.push((slot.table_key(), bytes));
        }

        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SLOTS).map_err(map_err!(Table))?;
            for (key, bytes) in &encoded {
                table
                    .insert(key.as_str(), bytes.as_slice())
                    .map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(count = slots.len(), "slots stored");
        Ok(())
    }

    pub fn get_slot(
        &self,
        floor_number: FloorNumber,
        slot_number: SlotNumber,
    ) -> StateResult<Option<ParkingSlot>> {
        self.get_json(SLOTS, &slot_key(floor_number, slot_number))
    }

    /// List all slots ordered by floor, then slot number.
    pub fn list_slots(&self) -> StateResult<Vec<ParkingSlot>> {
        self.list_json(SLOTS, "")
    }

    /// List the slots of one floor, ascending by slot number.
    pub fn list_slots_for_floor(&self, floor_number: FloorNumber) -> StateResult<Vec<ParkingSlot>> {
        let prefix = format!("{}/", floor_key(floor_number));
        self.list_json(SLOTS, &prefix)
    }

    /// Delete a slot. Returns true if it existed.
    pub fn delete_slot(&self, floor_number: FloorNumber, slot_number: SlotNumber) -> StateResult<bool> {
        let key = slot_key(floor_number, slot_number);
        let existed = self.delete_key(SLOTS, &key)?;
        debug!(%key, existed, "slot deleted");
        Ok(existed)
    }

    // ── Records ────────────────────────────────────────────────────

    /// Allocate the next record id.
    pub fn next_record_id(&self) -> StateResult<u64> {
        self.next_seq(RECORD_SEQ)
    }

    /// Insert or update a parking record.
    pub fn put_record(&self, record: &ParkingRecord) -> StateResult<()> {
        let key = record.table_key();
        self.put_json(RECORDS, &key, record)?;
        debug!(%key, plate = %record.license_plate, active = record.is_active(), "record stored");
        Ok(())
    }

    pub fn get_record(&self, id: u64) -> StateResult<Option<ParkingRecord>> {
        self.get_json(RECORDS, &record_key(id))
    }

    /// List every record, oldest first.
    pub fn list_records(&self) -> StateResult<Vec<ParkingRecord>> {
        self.list_json(RECORDS, "")
    }

    /// Records without an exit time, oldest first.
    pub fn list_active_records(&self) -> StateResult<Vec<ParkingRecord>> {
        let mut records = self.list_records()?;
        records.retain(ParkingRecord::is_active);
        Ok(records)
    }

    // ── Charges ────────────────────────────────────────────────────

    /// Insert or update the charge for a vehicle type.
    pub fn put_charge(&self, charge: &ParkingCharge) -> StateResult<()> {
        let key = charge.vehicle_type.as_str().to_string();
        self.put_json(CHARGES, &key, charge)?;
        debug!(%key, rate = charge.hourly_rate, "charge stored");
        Ok(())
    }

    pub fn get_charge(&self, vehicle_type: &VehicleType) -> StateResult<Option<ParkingCharge>> {
        self.get_json(CHARGES, vehicle_type.as_str())
    }

    pub fn list_charges(&self) -> StateResult<Vec<ParkingCharge>> {
        self.list_json(CHARGES, "")
    }

    // ── Audit ──────────────────────────────────────────────────────

    /// Append an audit entry, assigning its id. Returns the stored entry.
    pub fn append_audit(&self, mut entry: AuditEntry) -> StateResult<AuditEntry> {
        entry.id = self.next_seq(AUDIT_SEQ)?;
        self.put_json(AUDIT, &entry.table_key(), &entry)?;
        debug!(id = entry.id, action = ?entry.action, admin = %entry.admin, "audit entry appended");
        Ok(entry)
    }

    /// List audit entries, oldest first.
    pub fn list_audit(&self) -> StateResult<Vec<AuditEntry>> {
        self.list_json(AUDIT, "")
    }
}
