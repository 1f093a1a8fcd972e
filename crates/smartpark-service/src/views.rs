//! Read models and request filters exchanged with the API layer.
//!
//! Wire names are camelCase to match what the kiosk and admin pages expect.

use serde::{Deserialize, Serialize};
use smartpark_state::{FloorNumber, SlotNumber, Timestamp, VehicleType};

/// Addresses a slot by number, optionally pinned to a floor.
///
/// Without a floor the lowest floor holding that slot number is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRef {
    pub slot_number: SlotNumber,
    #[serde(default)]
    pub floor_number: Option<FloorNumber>,
}

impl SlotRef {
    pub fn new(slot_number: SlotNumber, floor_number: Option<FloorNumber>) -> Self {
        Self {
            slot_number,
            floor_number,
        }
    }
}

/// Current state of one slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub floor_number: FloorNumber,
    pub slot_number: SlotNumber,
    /// Vehicle type the slot is designated for.
    pub slot_type: VehicleType,
    pub occupied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    /// Type of the parked vehicle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<VehicleType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_time: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_minutes: Option<u32>,
}

/// Slot state plus the running charge of the current stay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDetail {
    pub floor_number: FloorNumber,
    pub slot_number: SlotNumber,
    pub occupied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<VehicleType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_time: Option<Timestamp>,
    pub duration_minutes: u64,
    pub current_charge: f64,
    pub overdue: bool,
}

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_slots: u32,
    pub available_slots: u32,
    pub occupied_slots: u32,
    /// Stays that started during the current UTC day.
    pub vehicles_parked_today: u32,
    /// Charges of stays that ended during the current UTC day.
    pub today_revenue: f64,
    pub currently_parked_vehicles: u32,
}

/// Filter for completed-stay history.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryFilter {
    /// Inclusive lower bound on entry time.
    pub start: Option<Timestamp>,
    /// Inclusive upper bound on entry time.
    pub end: Option<Timestamp>,
    pub vehicle_type: Option<VehicleType>,
    pub slot_number: Option<SlotNumber>,
}

/// Filter for the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditFilter {
    pub admin: Option<String>,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}
