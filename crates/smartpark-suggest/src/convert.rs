//! Type conversions between state store types and engine snapshots.
//!
//! Bridges `smartpark_state::{ParkingSlot, ParkingRecord}` to the engine's
//! [`SlotSnapshot`]. Occupancy comes from active records, never the slot.

use smartpark_state::{ParkingRecord, ParkingSlot};

use crate::scorer::SlotSnapshot;

/// Convert a [`ParkingSlot`] to a [`SlotSnapshot`] given its active record, if any.
pub fn slot_to_snapshot(slot: &ParkingSlot, active: Option<&ParkingRecord>) -> SlotSnapshot {
    match active {
        Some(record) => SlotSnapshot {
            slot_number: slot.slot_number,
            occupied: true,
            vehicle_type: Some(record.vehicle_type.clone()),
            license_plate: Some(record.license_plate.clone()),
        },
        None => SlotSnapshot::available(slot.slot_number),
    }
}

/// Build the snapshot for a set of slots from the lot's active records.
///
/// Output order follows `slots`, which decides tie-breaks in the engine.
pub fn snapshot_from_state(slots: &[ParkingSlot], active: &[ParkingRecord]) -> Vec<SlotSnapshot> {
    slots
        .iter()
        .map(|slot| {
            let record = active
                .iter()
                .find(|r| r.occupies(slot.floor_number, slot.slot_number));
            slot_to_snapshot(slot, record)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartpark_state::VehicleType;

    fn slot(floor: u32, number: u32) -> ParkingSlot {
        ParkingSlot {
            floor_number: floor,
            slot_number: number,
            vehicle_type: VehicleType::Car,
        }
    }

    fn active_record(floor: u32, number: u32, plate: &str) -> ParkingRecord {
        ParkingRecord {
            id: 1,
            license_plate: plate.to_string(),
            vehicle_type: VehicleType::Bike,
            slot_number: number,
            floor_number: floor,
            entry_time: 0,
            exit_time: None,
            duration_minutes: 0,
            billable_hours: 0,
            charge: 0.0,
        }
    }

    #[test]
    fn active_record_marks_slot_occupied() {
        let slots = vec![slot(1, 1), slot(1, 2)];
        let active = vec![active_record(1, 2, "DHK-22")];

        let snapshot = snapshot_from_state(&slots, &active);
        assert!(!snapshot[0].occupied);
        assert!(snapshot[1].occupied);
        assert_eq!(snapshot[1].vehicle_type, Some(VehicleType::Bike));
        assert_eq!(snapshot[1].license_plate.as_deref(), Some("DHK-22"));
    }

    #[test]
    fn records_on_other_floors_are_ignored() {
        let slots = vec![slot(1, 4)];
        let active = vec![active_record(2, 4, "X")];

        let snapshot = snapshot_from_state(&slots, &active);
        assert!(!snapshot[0].occupied);
        assert!(snapshot[0].vehicle_type.is_none());
    }

    #[test]
    fn completed_records_free_the_slot() {
        let slots = vec![slot(1, 4)];
        let mut done = active_record(1, 4, "X");
        done.exit_time = Some(100);

        assert!(!snapshot_from_state(&slots, &[done])[0].occupied);
    }
}
