//! Domain types for the SmartPark state store.
//!
//! These types represent the persisted state of floors, slots, parking
//! records, charges, and audit entries. All types are serializable
//! to/from JSON for storage in redb tables and for the REST API.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Floor number (1-based).
pub type FloorNumber = u32;

/// Slot number, unique within a floor.
pub type SlotNumber = u32;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

// ── Vehicle type ───────────────────────────────────────────────────

/// Kind of vehicle a slot is designated for, or a parked vehicle's kind.
///
/// Parsed case-insensitively from its wire name. Anything else is kept
/// verbatim in [`VehicleType::Other`] so loosely-typed input never fails
/// to deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VehicleType {
    Car,
    Bike,
    Microbus,
    Truck,
    Other(String),
}

impl VehicleType {
    /// The four vehicle types the lot is built for.
    pub const KNOWN: [VehicleType; 4] = [
        VehicleType::Bike,
        VehicleType::Car,
        VehicleType::Microbus,
        VehicleType::Truck,
    ];

    /// Wire name (`CAR`, `BIKE`, `MICROBUS`, `TRUCK`) or the raw text.
    pub fn as_str(&self) -> &str {
        match self {
            VehicleType::Car => "CAR",
            VehicleType::Bike => "BIKE",
            VehicleType::Microbus => "MICROBUS",
            VehicleType::Truck => "TRUCK",
            VehicleType::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, VehicleType::Other(_))
    }

    /// Trucks and microbuses.
    pub fn is_large(&self) -> bool {
        matches!(self, VehicleType::Truck | VehicleType::Microbus)
    }
}

impl From<&str> for VehicleType {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "CAR" => VehicleType::Car,
            "BIKE" => VehicleType::Bike,
            "MICROBUS" => VehicleType::Microbus,
            "TRUCK" => VehicleType::Truck,
            _ => VehicleType::Other(trimmed.to_string()),
        }
    }
}

impl From<String> for VehicleType {
    fn from(value: String) -> Self {
        VehicleType::from(value.as_str())
    }
}

impl From<VehicleType> for String {
    fn from(value: VehicleType) -> Self {
        match value {
            VehicleType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Floor ──────────────────────────────────────────────────────────

/// A floor of the parking structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    pub floor_number: FloorNumber,
    pub description: String,
    /// Unix timestamp (seconds) when the floor was created.
    pub created_at: Timestamp,
}

impl Floor {
    /// Build the key for the floors table.
    pub fn table_key(&self) -> String {
        floor_key(self.floor_number)
    }
}

// ── Slot ───────────────────────────────────────────────────────────

/// A physical parking space, designated for one vehicle type.
///
/// Occupancy is not stored here; see [`ParkingRecord::is_active`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParkingSlot {
    pub floor_number: FloorNumber,
    pub slot_number: SlotNumber,
    pub vehicle_type: VehicleType,
}

impl ParkingSlot {
    /// Build the composite key for the slots table.
    pub fn table_key(&self) -> String {
        slot_key(self.floor_number, self.slot_number)
    }
}

// ── Parking record ─────────────────────────────────────────────────

/// Entry/exit slip for one stay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParkingRecord {
    pub id: u64,
    pub license_plate: String,
    pub vehicle_type: VehicleType,
    pub slot_number: SlotNumber,
    pub floor_number: FloorNumber,
    pub entry_time: Timestamp,
    /// `None` while the vehicle is still parked.
    pub exit_time: Option<Timestamp>,
    #[serde(default)]
    pub duration_minutes: u64,
    /// Minimum 1, rounded up to the next hour.
    #[serde(default)]
    pub billable_hours: u32,
    #[serde(default)]
    pub charge: f64,
}

impl ParkingRecord {
    /// Build the key for the records table.
    pub fn table_key(&self) -> String {
        record_key(self.id)
    }

    /// An active record holds its slot.
    pub fn is_active(&self) -> bool {
        self.exit_time.is_none()
    }

    pub fn occupies(&self, floor_number: FloorNumber, slot_number: SlotNumber) -> bool {
        self.is_active() && self.floor_number == floor_number && self.slot_number == slot_number
    }
}

// ── Charges ────────────────────────────────────────────────────────

/// Configured hourly rate for a vehicle type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParkingCharge {
    pub vehicle_type: VehicleType,
    pub hourly_rate: f64,
    pub active: bool,
}

// ── Audit ──────────────────────────────────────────────────────────

/// Kind of admin action recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    ForceExit,
    UpdateLicensePlate,
    ChangeSlot,
    MarkSlotAvailable,
    UpdateCharge,
    CreateFloor,
    AddSlots,
    DeleteSlot,
}

/// One admin action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: u64,
    pub admin: String,
    pub action: AuditAction,
    pub description: String,
    /// Structured action parameters.
    pub details: serde_json::Value,
    pub timestamp: Timestamp,
}

impl AuditEntry {
    /// Build the key for the audit table.
    pub fn table_key(&self) -> String {
        record_key(self.id)
    }
}

// ── Keys ───────────────────────────────────────────────────────────
//
// Padded to the full width of the integer type so lexical order is numeric
// order for every value.

pub fn floor_key(floor_number: FloorNumber) -> String {
    format!("{floor_number:010}")
}

pub fn slot_key(floor_number: FloorNumber, slot_number: SlotNumber) -> String {
    format!("{floor_number:010}/{slot_number:010}")
}

pub fn record_key(id: u64) -> String {
    format!("{id:020}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_type_parses_case_insensitively() {
        assert_eq!(VehicleType::from("car"), VehicleType::Car);
        assert_eq!(VehicleType::from(" Truck "), VehicleType::Truck);
        assert_eq!(VehicleType::from("MICROBUS"), VehicleType::Microbus);
        assert_eq!(
            VehicleType::from("hovercraft"),
            VehicleType::Other("hovercraft".to_string())
        );
    }

    #[test]
    fn vehicle_type_serializes_as_wire_name() {
        let json = serde_json::to_string(&VehicleType::Bike).unwrap();
        assert_eq!(json, "\"BIKE\"");

        let parsed: VehicleType = serde_json::from_str("\"bike\"").unwrap();
        assert_eq!(parsed, VehicleType::Bike);

        let other: VehicleType = serde_json::from_str("\"tank\"").unwrap();
        assert_eq!(serde_json::to_string(&other).unwrap(), "\"tank\"");
    }

    #[test]
    fn keys_sort_numerically() {
        assert!(slot_key(1, 9) < slot_key(1, 10));
        assert!(slot_key(1, 20) < slot_key(2, 1));
        assert!(record_key(99) < record_key(100));
        assert!(slot_key(1, 9_999) < slot_key(1, 10_000));
        assert!(slot_key(1, u32::MAX) < slot_key(2, 1));
        assert!(floor_key(9_999) < floor_key(10_000));
        assert!(record_key(u64::MAX - 1) < record_key(u64::MAX));
    }

    #[test]
    fn record_occupancy() {
        let mut record = ParkingRecord {
            id: 1,
            license_plate: "DHK-1".to_string(),
            vehicle_type: VehicleType::Car,
            slot_number: 7,
            floor_number: 1,
            entry_time: 1000,
            exit_time: None,
            duration_minutes: 0,
            billable_hours: 0,
            charge: 0.0,
        };
        assert!(record.occupies(1, 7));
        assert!(!record.occupies(2, 7));

        record.exit_time = Some(2000);
        assert!(!record.occupies(1, 7));
    }
}
