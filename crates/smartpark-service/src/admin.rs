//! Admin operations: charges, overrides, floor and slot management.
//!
//! Every mutation here appends an entry to the audit trail.

use serde_json::json;
use smartpark_state::*;
use tracing::info;

use crate::billing::default_hourly_rate;
use crate::error::{ServiceError, ServiceResult};
use crate::service::{ParkingService, normalize_plate, require_known};
use crate::views::{AuditFilter, SlotRef};

/// Most slots a single `add_slots` call may create.
pub const MAX_SLOTS_PER_BATCH: u32 = 500;

impl ParkingService {
    // ── Charges ────────────────────────────────────────────────────

    /// Effective charge for each known vehicle type.
    pub fn list_charges(&self) -> ServiceResult<Vec<ParkingCharge>> {
        VehicleType::KNOWN
            .iter()
            .map(|vt| self.get_charge(vt))
            .collect()
    }

    /// The stored charge, or an active default when none is configured.
    pub fn get_charge(&self, vehicle_type: &VehicleType) -> ServiceResult<ParkingCharge> {
        Ok(self
            .store
            .get_charge(vehicle_type)?
            .unwrap_or_else(|| ParkingCharge {
                vehicle_type: vehicle_type.clone(),
                hourly_rate: default_hourly_rate(vehicle_type),
                active: true,
            }))
    }

    pub async fn update_charge(
        &self,
        vehicle_type: &VehicleType,
        hourly_rate: f64,
        admin: &str,
    ) -> ServiceResult<ParkingCharge> {
        require_known(vehicle_type)?;
        if !hourly_rate.is_finite() || hourly_rate < 0.0 {
            return Err(ServiceError::InvalidRequest(format!(
                "hourly rate must be a non-negative number, got {hourly_rate}"
            )));
        }

        let _guard = self.write_lock.lock().await;
        let previous = self.store.get_charge(vehicle_type)?.map(|c| c.hourly_rate);
        let charge = ParkingCharge {
            vehicle_type: vehicle_type.clone(),
            hourly_rate,
            active: true,
        };
        self.store.put_charge(&charge)?;

        self.audit(
            admin,
            AuditAction::UpdateCharge,
            format!("Updated {vehicle_type} hourly rate to {hourly_rate}"),
            json!({
                "vehicleType": vehicle_type.as_str(),
                "previousRate": previous,
                "hourlyRate": hourly_rate,
            }),
        )?;
        Ok(charge)
    }

    // ── Overrides ──────────────────────────────────────────────────

    /// Complete and bill the stay in a slot regardless of the driver.
    pub async fn force_exit(&self, slot_ref: SlotRef, admin: &str) -> ServiceResult<ParkingRecord> {
        let _guard = self.write_lock.lock().await;
        let record = self.exit_slot_locked(slot_ref)?;

        self.audit(
            admin,
            AuditAction::ForceExit,
            format!(
                "Force exit of {} from slot {} on floor {}",
                record.license_plate, record.slot_number, record.floor_number
            ),
            json!({
                "recordId": record.id,
                "licensePlate": record.license_plate,
                "floorNumber": record.floor_number,
                "slotNumber": record.slot_number,
                "charge": record.charge,
            }),
        )?;
        info!(admin, plate = %record.license_plate, slot = record.slot_number, "forced exit");
        Ok(record)
    }

    /// Correct the plate of the vehicle parked in a slot.
    pub async fn update_license_plate(
        &self,
        slot_ref: SlotRef,
        new_plate: &str,
        admin: &str,
    ) -> ServiceResult<ParkingRecord> {
        let new_plate = normalize_plate(new_plate)?;

        let _guard = self.write_lock.lock().await;
        let slot = self.find_slot(slot_ref)?;
        let mut record = self
            .active_record_for(&slot)?
            .ok_or(ServiceError::SlotEmpty(slot.slot_number))?;

        let clash = self
            .store
            .list_active_records()?
            .into_iter()
            .any(|r| r.id != record.id && r.license_plate.eq_ignore_ascii_case(&new_plate));
        if clash {
            return Err(ServiceError::AlreadyParked(new_plate));
        }

        let old_plate = std::mem::replace(&mut record.license_plate, new_plate);
        self.store.put_record(&record)?;

        self.audit(
            admin,
            AuditAction::UpdateLicensePlate,
            format!(
                "Changed plate in slot {} from {old_plate} to {}",
                record.slot_number, record.license_plate
            ),
            json!({
                "recordId": record.id,
                "floorNumber": record.floor_number,
                "slotNumber": record.slot_number,
                "oldPlate": old_plate,
                "newPlate": record.license_plate,
            }),
        )?;
        info!(admin, old = %old_plate, new = %record.license_plate, "license plate updated");
        Ok(record)
    }

    /// Move a parked vehicle to another free slot on the same floor.
    ///
    /// The target's designation is not checked.
    pub async fn change_slot(
        &self,
        slot_ref: SlotRef,
        new_slot_number: SlotNumber,
        admin: &str,
    ) -> ServiceResult<ParkingRecord> {
        let _guard = self.write_lock.lock().await;
        let slot = self.find_slot(slot_ref)?;
        let mut record = self
            .active_record_for(&slot)?
            .ok_or(ServiceError::SlotEmpty(slot.slot_number))?;

        if new_slot_number == slot.slot_number {
            return Err(ServiceError::InvalidRequest(format!(
                "vehicle is already in slot {new_slot_number}"
            )));
        }
        let target = self.find_slot(SlotRef::new(new_slot_number, Some(slot.floor_number)))?;
        if self.active_record_for(&target)?.is_some() {
            return Err(ServiceError::SlotOccupied(target.slot_number));
        }

        record.slot_number = target.slot_number;
        self.store.put_record(&record)?;

        self.audit(
            admin,
            AuditAction::ChangeSlot,
            format!(
                "Moved {} from slot {} to slot {} on floor {}",
                record.license_plate, slot.slot_number, target.slot_number, slot.floor_number
            ),
            json!({
                "recordId": record.id,
                "licensePlate": record.license_plate,
                "floorNumber": slot.floor_number,
                "fromSlot": slot.slot_number,
                "toSlot": target.slot_number,
            }),
        )?;
        info!(
            admin,
            plate = %record.license_plate,
            from = slot.slot_number,
            to = target.slot_number,
            "vehicle moved"
        );
        Ok(record)
    }

    /// Confirm a slot is clear and log the check.
    ///
    /// Occupancy follows the parking records, so a slot with a vehicle in it
    /// must be cleared through `force_exit` instead.
    pub async fn mark_slot_available(&self, slot_ref: SlotRef, admin: &str) -> ServiceResult<ParkingSlot> {
        let _guard = self.write_lock.lock().await;
        let slot = self.find_slot(slot_ref)?;
        if self.active_record_for(&slot)?.is_some() {
            return Err(ServiceError::SlotOccupied(slot.slot_number));
        }

        self.audit(
            admin,
            AuditAction::MarkSlotAvailable,
            format!("Marked slot {} on floor {} available", slot.slot_number, slot.floor_number),
            json!({
                "floorNumber": slot.floor_number,
                "slotNumber": slot.slot_number,
            }),
        )?;
        Ok(slot)
    }

    // ── Floors and slots ───────────────────────────────────────────

    pub fn list_floors(&self) -> ServiceResult<Vec<Floor>> {
        Ok(self.store.list_floors()?)
    }

    pub fn get_floor(&self, floor_number: FloorNumber) -> ServiceResult<Floor> {
        self.store
            .get_floor(floor_number)?
            .ok_or(ServiceError::FloorNotFound(floor_number))
    }

    pub async fn create_floor(
        &self,
        floor_number: FloorNumber,
        description: &str,
        admin: &str,
    ) -> ServiceResult<Floor> {
        if floor_number == 0 {
            return Err(ServiceError::InvalidRequest("floor number must be at least 1".to_string()));
        }

        let _guard = self.write_lock.lock().await;
        if self.store.get_floor(floor_number)?.is_some() {
            return Err(ServiceError::FloorExists(floor_number));
        }
        let floor = Floor {
            floor_number,
            description: description.trim().to_string(),
            created_at: self.clock.now(),
        };
        self.store.put_floor(&floor)?;

        self.audit(
            admin,
            AuditAction::CreateFloor,
            format!("Created floor {floor_number}"),
            json!({
                "floorNumber": floor_number,
                "description": floor.description,
            }),
        )?;
        info!(admin, floor = floor_number, "floor created");
        Ok(floor)
    }

    /// Add `count` consecutive slots starting at `start`.
    ///
    /// All-or-nothing: any number already taken on the floor rejects the batch,
    /// and the batch is written in a single transaction.
    pub async fn add_slots(
        &self,
        floor_number: FloorNumber,
        vehicle_type: &VehicleType,
        start: SlotNumber,
        count: u32,
        admin: &str,
    ) -> ServiceResult<Vec<ParkingSlot>> {
        require_known(vehicle_type)?;
        if start == 0 || count == 0 {
            return Err(ServiceError::InvalidRequest(
                "start slot and count must be at least 1".to_string(),
            ));
        }
        if count > MAX_SLOTS_PER_BATCH {
            return Err(ServiceError::InvalidRequest(format!(
                "at most {MAX_SLOTS_PER_BATCH} slots can be added at once, got {count}"
            )));
        }
        let end = start
            .checked_add(count - 1)
            .ok_or_else(|| ServiceError::InvalidRequest("slot range overflows".to_string()))?;

        let _guard = self.write_lock.lock().await;
        if self.store.get_floor(floor_number)?.is_none() {
            return Err(ServiceError::FloorNotFound(floor_number));
        }
        let existing = self.store.list_slots_for_floor(floor_number)?;
        if let Some(taken) = existing
            .iter()
            .find(|s| (start..=end).contains(&s.slot_number))
        {
            return Err(ServiceError::SlotExists {
                slot: taken.slot_number,
                floor: floor_number,
            });
        }

        let slots: Vec<ParkingSlot> = (start..=end)
            .map(|slot_number| ParkingSlot {
                floor_number,
                slot_number,
                vehicle_type: vehicle_type.clone(),
            })
            .collect();
        self.store.put_slots(&slots)?;

        self.audit(
            admin,
            AuditAction::AddSlots,
            format!("Added {count} {vehicle_type} slots ({start}-{end}) to floor {floor_number}"),
            json!({
                "floorNumber": floor_number,
                "vehicleType": vehicle_type.as_str(),
                "start": start,
                "count": count,
            }),
        )?;
        info!(admin, floor = floor_number, start, count, "slots added");
        Ok(slots)
    }

    pub async fn delete_slot(
        &self,
        floor_number: FloorNumber,
        slot_number: SlotNumber,
        admin: &str,
    ) -> ServiceResult<()> {
        let _guard = self.write_lock.lock().await;
        let slot = self.find_slot(SlotRef::new(slot_number, Some(floor_number)))?;
        if self.active_record_for(&slot)?.is_some() {
            return Err(ServiceError::SlotOccupied(slot_number));
        }
        self.store.delete_slot(floor_number, slot_number)?;

        self.audit(
            admin,
            AuditAction::DeleteSlot,
            format!("Deleted slot {slot_number} from floor {floor_number}"),
            json!({
                "floorNumber": floor_number,
                "slotNumber": slot_number,
                "vehicleType": slot.vehicle_type.as_str(),
            }),
        )?;
        info!(admin, floor = floor_number, slot = slot_number, "slot deleted");
        Ok(())
    }

    // ── Audit ──────────────────────────────────────────────────────

    /// Audit entries matching the filter, newest first.
    pub fn audit_log(&self, filter: &AuditFilter) -> ServiceResult<Vec<AuditEntry>> {
        let mut entries: Vec<AuditEntry> = self
            .store
            .list_audit()?
            .into_iter()
            .filter(|e| filter.admin.as_deref().is_none_or(|a| e.admin == a))
            .filter(|e| filter.start.is_none_or(|start| e.timestamp >= start))
            .filter(|e| filter.end.is_none_or(|end| e.timestamp <= end))
            .collect();
        entries.reverse();
        Ok(entries)
    }

    fn audit(
        &self,
        admin: &str,
        action: AuditAction,
        description: String,
        details: serde_json::Value,
    ) -> ServiceResult<AuditEntry> {
        let admin = match admin.trim() {
            "" => "admin",
            name => name,
        };
        Ok(self.store.append_audit(AuditEntry {
            id: 0,
            admin: admin.to_string(),
            action,
            description,
            details,
            timestamp: self.clock.now(),
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::MAX_SLOTS_PER_BATCH;
    use crate::service::tests::{NOON, seeded};
    use crate::views::SlotRef;
    use crate::{AuditFilter, ServiceError};
    use smartpark_state::{AuditAction, VehicleType};

    #[tokio::test]
    async fn charges_default_then_update() {
        let (service, _) = seeded().await;

        let charges = service.list_charges().unwrap();
        assert_eq!(charges.len(), 4);
        assert_eq!(service.get_charge(&VehicleType::Bike).unwrap().hourly_rate, 50.0);

        let updated = service
            .update_charge(&VehicleType::Bike, 60.0, "alice")
            .await
            .unwrap();
        assert_eq!(updated.hourly_rate, 60.0);
        assert_eq!(service.hourly_rate(&VehicleType::Bike).unwrap(), 60.0);

        let entries = service.audit_log(&AuditFilter::default()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::UpdateCharge);
        assert_eq!(entries[0].details["previousRate"], 50.0);
    }

    #[tokio::test]
    async fn update_charge_rejects_bad_input() {
        let (service, _) = seeded().await;

        let err = service
            .update_charge(&VehicleType::Car, -5.0, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));

        let err = service
            .update_charge(&VehicleType::from("hovercraft"), 10.0, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UnknownVehicleType(_)));
    }

    #[tokio::test]
    async fn force_exit_bills_and_audits() {
        let (service, clock) = seeded().await;
        service.park("C-1", &VehicleType::Car, None).await.unwrap();
        clock.advance_minutes(200);

        let record = service.force_exit(SlotRef::new(6, None), "bob").await.unwrap();
        assert_eq!(record.billable_hours, 4);
        assert_eq!(record.charge, 400.0);
        assert!(!service.slot_detail(SlotRef::new(6, None)).unwrap().occupied);

        let entries = service.audit_log(&AuditFilter::default()).unwrap();
        assert_eq!(entries[0].action, AuditAction::ForceExit);
        assert_eq!(entries[0].admin, "bob");
        assert_eq!(entries[0].details["licensePlate"], "C-1");
    }

    #[tokio::test]
    async fn update_license_plate() {
        let (service, _) = seeded().await;
        service.park("C-1", &VehicleType::Car, None).await.unwrap();
        service.park("C-2", &VehicleType::Car, None).await.unwrap();

        let record = service
            .update_license_plate(SlotRef::new(6, Some(1)), "c-9", "alice")
            .await
            .unwrap();
        assert_eq!(record.license_plate, "C-9");
        assert!(service.exit_by_plate("C-1").await.is_err());

        let err = service
            .update_license_plate(SlotRef::new(6, None), "C-2", "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyParked(_)));

        let err = service
            .update_license_plate(SlotRef::new(8, None), "C-3", "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::SlotEmpty(8)));
    }

    #[tokio::test]
    async fn change_slot_moves_vehicle() {
        let (service, _) = seeded().await;
        service.park("C-1", &VehicleType::Car, None).await.unwrap();
        service.park("C-2", &VehicleType::Car, None).await.unwrap();

        let record = service
            .change_slot(SlotRef::new(6, None), 12, "alice")
            .await
            .unwrap();
        assert_eq!(record.slot_number, 12);

        let slots = service.list_slots(Some(1)).unwrap();
        assert!(!slots[5].occupied);
        assert!(slots[11].occupied);

        let err = service
            .change_slot(SlotRef::new(12, None), 7, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::SlotOccupied(7)));

        let err = service
            .change_slot(SlotRef::new(12, None), 77, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::SlotNotFound { slot: 77, floor: Some(1) }));
    }

    #[tokio::test]
    async fn mark_available_refused_while_parked() {
        let (service, _) = seeded().await;
        service.park("B-1", &VehicleType::Bike, None).await.unwrap();

        let err = service
            .mark_slot_available(SlotRef::new(1, None), "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::SlotOccupied(1)));

        service
            .mark_slot_available(SlotRef::new(2, None), "alice")
            .await
            .unwrap();
        let entries = service.audit_log(&AuditFilter::default()).unwrap();
        assert_eq!(entries[0].action, AuditAction::MarkSlotAvailable);
    }

    #[tokio::test]
    async fn floors_and_slots() {
        let (service, _) = seeded().await;

        let err = service.create_floor(1, "dup", "alice").await.unwrap_err();
        assert!(matches!(err, ServiceError::FloorExists(1)));
        assert!(service.create_floor(0, "bad", "alice").await.is_err());

        service.create_floor(2, "Level 2", "alice").await.unwrap();
        assert_eq!(service.list_floors().unwrap().len(), 2);
        assert_eq!(service.get_floor(2).unwrap().description, "Level 2");
        assert!(matches!(
            service.get_floor(5).unwrap_err(),
            ServiceError::FloorNotFound(5)
        ));

        let added = service
            .add_slots(2, &VehicleType::Car, 1, 4, "alice")
            .await
            .unwrap();
        assert_eq!(added.len(), 4);
        assert_eq!(service.list_slots(Some(2)).unwrap().len(), 4);

        let err = service
            .add_slots(2, &VehicleType::Bike, 4, 2, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::SlotExists { slot: 4, floor: 2 }));

        let err = service
            .add_slots(9, &VehicleType::Bike, 1, 1, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::FloorNotFound(9)));

        service.delete_slot(2, 4, "alice").await.unwrap();
        assert_eq!(service.list_slots(Some(2)).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn add_slots_caps_batch_size() {
        let (service, _) = seeded().await;

        let err = service
            .add_slots(1, &VehicleType::Car, 100, MAX_SLOTS_PER_BATCH + 1, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));

        let err = service
            .add_slots(1, &VehicleType::Car, u32::MAX, 2, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));

        assert_eq!(service.list_slots(Some(1)).unwrap().len(), 20);
        assert!(service.audit_log(&AuditFilter::default()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn slots_past_four_digits_stay_in_numeric_order() {
        let (service, _) = seeded().await;
        service
            .add_slots(1, &VehicleType::Car, 9_998, 4, "alice")
            .await
            .unwrap();

        let numbers: Vec<u32> = service
            .list_slots(Some(1))
            .unwrap()
            .iter()
            .map(|s| s.slot_number)
            .collect();
        let mut sorted = numbers.clone();
        sorted.sort_unstable();
        assert_eq!(numbers, sorted);
        assert_eq!(&numbers[18..], &[19, 20, 9_998, 9_999, 10_000, 10_001]);

        // Fill the seeded car bays; the next car goes to the lowest new number.
        for n in 0..10 {
            service
                .park(&format!("C-{n}"), &VehicleType::Car, None)
                .await
                .unwrap();
        }
        let record = service.park("C-X", &VehicleType::Car, None).await.unwrap();
        assert_eq!(record.slot_number, 9_998);
    }

    #[tokio::test]
    async fn delete_occupied_slot_refused() {
        let (service, _) = seeded().await;
        service.park("T-1", &VehicleType::Truck, None).await.unwrap();

        let err = service.delete_slot(1, 19, "alice").await.unwrap_err();
        assert!(matches!(err, ServiceError::SlotOccupied(19)));

        let err = service.delete_slot(1, 99, "alice").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn audit_log_filters_newest_first() {
        let (service, clock) = seeded().await;
        service.create_floor(2, "Level 2", "alice").await.unwrap();
        clock.advance_minutes(5);
        service.create_floor(3, "Level 3", "bob").await.unwrap();

        let all = service.audit_log(&AuditFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].admin, "bob");

        let alice = service
            .audit_log(&AuditFilter {
                admin: Some("alice".to_string()),
                ..AuditFilter::default()
            })
            .unwrap();
        assert_eq!(alice.len(), 1);

        let later = service
            .audit_log(&AuditFilter {
                start: Some(NOON + 1),
                ..AuditFilter::default()
            })
            .unwrap();
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].details["floorNumber"], 3);
    }
}
