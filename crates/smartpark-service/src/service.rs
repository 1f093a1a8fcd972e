//! ParkingService — parking, exit, and read queries over the state store.
//!
//! Occupancy is derived from active parking records on every call; the
//! service keeps no in-memory copy of the lot.

use std::sync::Arc;

use smartpark_state::*;
use smartpark_suggest::{Suggestion, rank_slots, snapshot_from_state};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::billing::{charge_for, default_hourly_rate};
use crate::clock::{Clock, SystemClock, minutes_between, utc_day_bounds};
use crate::config::{LotConfig, SmartparkConfig};
use crate::error::{ServiceError, ServiceResult};
use crate::views::*;

/// The parking service owns all lot operations.
pub struct ParkingService {
    pub(crate) store: StateStore,
    pub(crate) lot: LotConfig,
    pub(crate) clock: Arc<dyn Clock>,
    /// Held across check-then-write sequences so two requests cannot claim
    /// the same slot.
    pub(crate) write_lock: Mutex<()>,
}

impl ParkingService {
    /// Create a service on the wall clock.
    pub fn new(store: StateStore, lot: LotConfig) -> Self {
        Self::with_clock(store, lot, Arc::new(SystemClock))
    }

    pub fn with_clock(store: StateStore, lot: LotConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            lot,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn lot_config(&self) -> &LotConfig {
        &self.lot
    }

    /// Populate an empty store with the ground floor layout and hourly charges.
    ///
    /// Does nothing for parts of the store that already hold data.
    pub async fn seed_defaults(&self, config: &SmartparkConfig) -> ServiceResult<()> {
        let _guard = self.write_lock.lock().await;
        let now = self.clock.now();

        if self.store.list_floors()?.is_empty() && self.store.list_slots()?.is_empty() {
            self.store.put_floor(&Floor {
                floor_number: 1,
                description: self.lot.ground_floor_description.clone(),
                created_at: now,
            })?;
            let slots: Vec<ParkingSlot> = self
                .lot
                .layout
                .iter()
                .flat_map(|block| (0..block.count).map(|_| block.vehicle_type.clone()))
                .zip(1..)
                .map(|(vehicle_type, slot_number)| ParkingSlot {
                    floor_number: 1,
                    slot_number,
                    vehicle_type,
                })
                .collect();
            self.store.put_slots(&slots)?;
            info!(slots = slots.len(), "seeded ground floor");
        }

        if self.store.list_charges()?.is_empty() {
            for (vehicle_type, hourly_rate) in config.hourly_rates() {
                self.store.put_charge(&ParkingCharge {
                    vehicle_type,
                    hourly_rate,
                    active: true,
                })?;
            }
            info!("seeded default parking charges");
        }

        Ok(())
    }

    // ── Park ───────────────────────────────────────────────────────

    /// Park a vehicle.
    ///
    /// With a preferred slot (typically the engine's suggestion) the vehicle
    /// goes there if it is free; an occupied preference falls back to the
    /// first free slot of the vehicle's type.
    pub async fn park(
        &self,
        license_plate: &str,
        vehicle_type: &VehicleType,
        preferred: Option<SlotRef>,
    ) -> ServiceResult<ParkingRecord> {
        let plate = normalize_plate(license_plate)?;
        require_known(vehicle_type)?;

        let _guard = self.write_lock.lock().await;
        let active = self.store.list_active_records()?;
        if active.iter().any(|r| r.license_plate.eq_ignore_ascii_case(&plate)) {
            return Err(ServiceError::AlreadyParked(plate));
        }

        let preferred_slot = match preferred {
            Some(slot_ref) => self.preferred_slot(slot_ref, vehicle_type, &active)?,
            None => None,
        };
        let slot = match preferred_slot {
            Some(slot) => slot,
            None => self.first_free_slot(vehicle_type, &active)?,
        };

        let record = ParkingRecord {
            id: self.store.next_record_id()?,
            license_plate: plate,
            vehicle_type: vehicle_type.clone(),
            slot_number: slot.slot_number,
            floor_number: slot.floor_number,
            entry_time: self.clock.now(),
            exit_time: None,
            duration_minutes: 0,
            billable_hours: 0,
            charge: 0.0,
        };
        self.store.put_record(&record)?;

        info!(
            plate = %record.license_plate,
            vehicle_type = %record.vehicle_type,
            floor = record.floor_number,
            slot = record.slot_number,
            "vehicle parked"
        );
        Ok(record)
    }

    /// Resolve a preferred slot. `Ok(None)` means it is taken and the caller
    /// should fall back.
    fn preferred_slot(
        &self,
        slot_ref: SlotRef,
        vehicle_type: &VehicleType,
        active: &[ParkingRecord],
    ) -> ServiceResult<Option<ParkingSlot>> {
        let slot = self.find_slot(slot_ref)?;

        if active.iter().any(|r| r.occupies(slot.floor_number, slot.slot_number)) {
            warn!(
                floor = slot.floor_number,
                slot = slot.slot_number,
                "preferred slot occupied, falling back to first free slot"
            );
            return Ok(None);
        }

        if slot.vehicle_type != *vehicle_type {
            return Err(ServiceError::SlotTypeMismatch {
                slot: slot.slot_number,
                designated: slot.vehicle_type,
                requested: vehicle_type.clone(),
            });
        }

        Ok(Some(slot))
    }

    fn first_free_slot(
        &self,
        vehicle_type: &VehicleType,
        active: &[ParkingRecord],
    ) -> ServiceResult<ParkingSlot> {
        self.store
            .list_slots()?
            .into_iter()
            .find(|s| {
                s.vehicle_type == *vehicle_type
                    && !active.iter().any(|r| r.occupies(s.floor_number, s.slot_number))
            })
            .ok_or_else(|| ServiceError::NoSlotAvailable(vehicle_type.clone()))
    }

    /// Look up a slot by number, on the given floor or the lowest floor that has it.
    pub(crate) fn find_slot(&self, slot_ref: SlotRef) -> ServiceResult<ParkingSlot> {
        let found = match slot_ref.floor_number {
            Some(floor) => self.store.get_slot(floor, slot_ref.slot_number)?,
            None => self
                .store
                .list_slots()?
                .into_iter()
                .find(|s| s.slot_number == slot_ref.slot_number),
        };
        found.ok_or(ServiceError::SlotNotFound {
            slot: slot_ref.slot_number,
            floor: slot_ref.floor_number,
        })
    }

    // ── Exit ───────────────────────────────────────────────────────

    /// Complete the stay in the given slot and bill it.
    pub async fn exit_by_slot(&self, slot_ref: SlotRef) -> ServiceResult<ParkingRecord> {
        let _guard = self.write_lock.lock().await;
        self.exit_slot_locked(slot_ref)
    }

    /// Complete the stay of the vehicle with the given plate and bill it.
    pub async fn exit_by_plate(&self, license_plate: &str) -> ServiceResult<ParkingRecord> {
        let plate = normalize_plate(license_plate)?;
        let _guard = self.write_lock.lock().await;
        let record = self
            .store
            .list_active_records()?
            .into_iter()
            .find(|r| r.license_plate.eq_ignore_ascii_case(&plate))
            .ok_or(ServiceError::VehicleNotFound(plate))?;
        self.complete_stay(record)
    }

    /// Exit with the write lock already held.
    pub(crate) fn exit_slot_locked(&self, slot_ref: SlotRef) -> ServiceResult<ParkingRecord> {
        let slot = self.find_slot(slot_ref)?;
        let record = self
            .active_record_for(&slot)?
            .ok_or(ServiceError::SlotEmpty(slot.slot_number))?;
        self.complete_stay(record)
    }

    fn complete_stay(&self, mut record: ParkingRecord) -> ServiceResult<ParkingRecord> {
        let now = self.clock.now();
        let duration_minutes = minutes_between(record.entry_time, now);
        let rate = self.hourly_rate(&record.vehicle_type)?;

        record.exit_time = Some(now);
        record.duration_minutes = duration_minutes;
        record.billable_hours = crate::billing::billable_hours(duration_minutes);
        record.charge = charge_for(duration_minutes, rate);
        self.store.put_record(&record)?;

        info!(
            plate = %record.license_plate,
            floor = record.floor_number,
            slot = record.slot_number,
            minutes = duration_minutes,
            hours = record.billable_hours,
            charge = record.charge,
            "vehicle exited"
        );
        Ok(record)
    }

    pub(crate) fn active_record_for(&self, slot: &ParkingSlot) -> ServiceResult<Option<ParkingRecord>> {
        Ok(self
            .store
            .list_active_records()?
            .into_iter()
            .find(|r| r.occupies(slot.floor_number, slot.slot_number)))
    }

    /// Effective hourly rate: the active configured charge, else the default.
    pub fn hourly_rate(&self, vehicle_type: &VehicleType) -> ServiceResult<f64> {
        let configured = self
            .store
            .get_charge(vehicle_type)?
            .filter(|c| c.active)
            .map(|c| c.hourly_rate);
        Ok(configured.unwrap_or_else(|| default_hourly_rate(vehicle_type)))
    }

    // ── Queries ────────────────────────────────────────────────────

    /// All slots (or one floor's), ordered by floor then slot number.
    ///
    /// An unknown floor yields an empty list.
    pub fn list_slots(&self, floor: Option<FloorNumber>) -> ServiceResult<Vec<SlotView>> {
        let slots = match floor {
            Some(f) => self.store.list_slots_for_floor(f)?,
            None => self.store.list_slots()?,
        };
        let active = self.store.list_active_records()?;
        let now = self.clock.now();

        let views: Vec<SlotView> = slots
            .into_iter()
            .map(|slot| {
                let record = active
                    .iter()
                    .find(|r| r.occupies(slot.floor_number, slot.slot_number));
                match record {
                    Some(r) => SlotView {
                        floor_number: slot.floor_number,
                        slot_number: slot.slot_number,
                        slot_type: slot.vehicle_type,
                        occupied: true,
                        license_plate: Some(r.license_plate.clone()),
                        vehicle_type: Some(r.vehicle_type.clone()),
                        entry_time: Some(r.entry_time),
                        duration_minutes: Some(minutes_between(r.entry_time, now)),
                        allowed_minutes: Some(self.lot.allowed_minutes),
                    },
                    None => SlotView {
                        floor_number: slot.floor_number,
                        slot_number: slot.slot_number,
                        slot_type: slot.vehicle_type,
                        occupied: false,
                        license_plate: None,
                        vehicle_type: None,
                        entry_time: None,
                        duration_minutes: None,
                        allowed_minutes: None,
                    },
                }
            })
            .collect();

        debug!(
            total = views.len(),
            occupied = views.iter().filter(|v| v.occupied).count(),
            "slots listed"
        );
        Ok(views)
    }

    /// One slot with the running charge of its current stay.
    pub fn slot_detail(&self, slot_ref: SlotRef) -> ServiceResult<SlotDetail> {
        let slot = self.find_slot(slot_ref)?;
        let detail = match self.active_record_for(&slot)? {
            Some(record) => {
                let duration_minutes = minutes_between(record.entry_time, self.clock.now());
                let rate = self.hourly_rate(&record.vehicle_type)?;
                SlotDetail {
                    floor_number: slot.floor_number,
                    slot_number: slot.slot_number,
                    occupied: true,
                    license_plate: Some(record.license_plate),
                    vehicle_type: Some(record.vehicle_type),
                    entry_time: Some(record.entry_time),
                    duration_minutes,
                    current_charge: charge_for(duration_minutes, rate),
                    overdue: duration_minutes > self.lot.overdue_minutes,
                }
            }
            None => SlotDetail {
                floor_number: slot.floor_number,
                slot_number: slot.slot_number,
                occupied: false,
                license_plate: None,
                vehicle_type: None,
                entry_time: None,
                duration_minutes: 0,
                current_charge: 0.0,
                overdue: false,
            },
        };
        Ok(detail)
    }

    /// Suggest a slot for the vehicle on a floor (default: the lowest floor).
    ///
    /// The whole floor is scored so congestion sees every neighbour; the
    /// best-ranked slot designated for the vehicle type wins. `None` when no
    /// such slot is free.
    pub fn suggest_slot(
        &self,
        vehicle_type: &VehicleType,
        floor: Option<FloorNumber>,
    ) -> ServiceResult<Option<Suggestion>> {
        require_known(vehicle_type)?;

        let floor = match floor {
            Some(f) => f,
            None => match self.store.list_slots()?.first() {
                Some(slot) => slot.floor_number,
                None => return Ok(None),
            },
        };
        let slots = self.store.list_slots_for_floor(floor)?;
        let active = self.store.list_active_records()?;
        let snapshot = snapshot_from_state(&slots, &active);

        let best = rank_slots(vehicle_type, &snapshot).into_iter().find(|scored| {
            slots
                .iter()
                .any(|s| s.slot_number == scored.slot_number && s.vehicle_type == *vehicle_type)
        });

        if let Some(scored) = &best {
            debug!(
                vehicle_type = %vehicle_type,
                floor,
                slot = scored.slot_number,
                score = scored.score,
                "slot suggested"
            );
        }
        Ok(best.map(Suggestion::from))
    }

    /// Headline numbers for the current UTC day.
    pub fn dashboard_stats(&self) -> ServiceResult<DashboardStats> {
        let slots = self.store.list_slots()?;
        let records = self.store.list_records()?;
        let (day_start, day_end) = utc_day_bounds(self.clock.now());
        let in_today = |ts: Timestamp| ts >= day_start && ts < day_end;

        let occupied = slots
            .iter()
            .filter(|s| records.iter().any(|r| r.occupies(s.floor_number, s.slot_number)))
            .count() as u32;
        let total = slots.len() as u32;

        let parked_today = records.iter().filter(|r| in_today(r.entry_time)).count() as u32;
        let revenue = records
            .iter()
            .filter(|r| r.exit_time.is_some_and(in_today))
            .map(|r| r.charge)
            .sum();

        Ok(DashboardStats {
            total_slots: total,
            available_slots: total - occupied,
            occupied_slots: occupied,
            vehicles_parked_today: parked_today,
            today_revenue: revenue,
            currently_parked_vehicles: occupied,
        })
    }

    /// Completed stays, most recent exit first.
    pub fn history(&self, filter: &HistoryFilter) -> ServiceResult<Vec<ParkingRecord>> {
        let mut records: Vec<ParkingRecord> = self
            .store
            .list_records()?
            .into_iter()
            .filter(|r| !r.is_active())
            .filter(|r| filter.start.is_none_or(|start| r.entry_time >= start))
            .filter(|r| filter.end.is_none_or(|end| r.entry_time <= end))
            .filter(|r| filter.vehicle_type.as_ref().is_none_or(|vt| r.vehicle_type == *vt))
            .filter(|r| filter.slot_number.is_none_or(|n| r.slot_number == n))
            .collect();
        sort_by_exit_desc(&mut records);
        Ok(records)
    }

    /// The most recent completed stays in a slot.
    pub fn slot_history(&self, slot_number: SlotNumber, limit: usize) -> ServiceResult<Vec<ParkingRecord>> {
        let mut records = self.history(&HistoryFilter {
            slot_number: Some(slot_number),
            ..HistoryFilter::default()
        })?;
        records.truncate(limit);
        Ok(records)
    }

    /// The entry slip: the active record of the vehicle parked in a slot.
    pub fn entry_slip(&self, slot_ref: SlotRef) -> ServiceResult<ParkingRecord> {
        let slot = self.find_slot(slot_ref)?;
        self.active_record_for(&slot)?
            .ok_or(ServiceError::SlotEmpty(slot.slot_number))
    }

    /// The exit slip: a completed record by id.
    pub fn exit_slip(&self, record_id: u64) -> ServiceResult<ParkingRecord> {
        let record = self
            .store
            .get_record(record_id)?
            .ok_or(ServiceError::RecordNotFound(record_id))?;
        if record.is_active() {
            return Err(ServiceError::StayInProgress(record_id));
        }
        Ok(record)
    }
}

pub(crate) fn sort_by_exit_desc(records: &mut [ParkingRecord]) {
    records.sort_by(|a, b| b.exit_time.cmp(&a.exit_time).then(b.id.cmp(&a.id)));
}

pub(crate) fn normalize_plate(plate: &str) -> ServiceResult<String> {
    let trimmed = plate.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidRequest("license plate must not be empty".to_string()));
    }
    Ok(trimmed.to_uppercase())
}

pub(crate) fn require_known(vehicle_type: &VehicleType) -> ServiceResult<()> {
    if vehicle_type.is_known() {
        Ok(())
    } else {
        Err(ServiceError::UnknownVehicleType(vehicle_type.to_string()))
    }
}
