//! Slot scoring for suggestion decisions.
//!
//! Evaluates each available slot using the sum of four components:
//! - **Proximity**: prefer low slot numbers (closest to the entrance)
//! - **Congestion**: prefer slots with few occupied neighbours
//! - **Vehicle fit**: large vehicles prefer the far end, cars the middle band
//! - **Position**: prefer the centre of each row of five
//!
//! Scoring every slot is O(n²) because of the neighbour scan; lots hold tens
//! of slots, so no indexing is attempted.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use smartpark_state::{SlotNumber, VehicleType};
use tracing::debug;

/// Slots at or below this number are nearest to the entrance.
const NEAR_ENTRANCE_MAX: SlotNumber = 5;
/// Slots at or below this number are a medium walk.
const MID_DISTANCE_MAX: SlotNumber = 10;
/// Neighbour window (inclusive) for the congestion count.
const CONGESTION_RADIUS: SlotNumber = 2;
/// Large vehicles fit best from this slot number up.
const LARGE_VEHICLE_MIN: SlotNumber = 15;
/// Cars fit best in this band (inclusive).
const CAR_BAND: (SlotNumber, SlotNumber) = (10, 15);
/// Slots per row; position 3 is the row centre.
const ROW_LEN: SlotNumber = 5;
const ROW_CENTRE: SlotNumber = 3;

/// One slot as seen by the engine.
///
/// Mirrors the wire shape `{slotNumber, occupied, vehicleType?, licensePlate?}`.
/// Missing or `null` fields deserialize to their falsy defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlotSnapshot {
    #[serde(deserialize_with = "null_as_default")]
    pub slot_number: SlotNumber,
    #[serde(deserialize_with = "null_as_default")]
    pub occupied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<VehicleType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
}

impl SlotSnapshot {
    pub fn available(slot_number: SlotNumber) -> Self {
        Self {
            slot_number,
            ..Self::default()
        }
    }

    pub fn occupied_by(slot_number: SlotNumber, vehicle_type: VehicleType, plate: &str) -> Self {
        Self {
            slot_number,
            occupied: true,
            vehicle_type: Some(vehicle_type),
            license_plate: Some(plate.to_string()),
        }
    }
}

/// Deserialize `null` as the type's default instead of rejecting it.
///
/// Pair with `#[serde(default)]` so an absent field behaves the same way.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Justification tag attached to a scored slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reason {
    #[serde(rename = "nearest to entrance")]
    NearestToEntrance,
    #[serde(rename = "isolated area")]
    IsolatedArea,
    #[serde(rename = "low congestion")]
    LowCongestion,
    #[serde(rename = "optimal for large vehicle")]
    OptimalForLargeVehicle,
    #[serde(rename = "suitable for bike")]
    SuitableForBike,
    #[serde(rename = "optimal for car")]
    OptimalForCar,
    #[serde(rename = "central position")]
    CentralPosition,
    /// Used when no other tag applies.
    #[serde(rename = "available slot")]
    AvailableSlot,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::NearestToEntrance => "nearest to entrance",
            Reason::IsolatedArea => "isolated area",
            Reason::LowCongestion => "low congestion",
            Reason::OptimalForLargeVehicle => "optimal for large vehicle",
            Reason::SuitableForBike => "suitable for bike",
            Reason::OptimalForCar => "optimal for car",
            Reason::CentralPosition => "central position",
            Reason::AvailableSlot => "available slot",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Individual score components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub proximity: u32,
    pub congestion: u32,
    pub vehicle_fit: u32,
    pub position: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.proximity + self.congestion + self.vehicle_fit + self.position
    }
}

/// Scored result for a single available slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotScore {
    pub slot_number: SlotNumber,
    pub score: u32,
    /// Tags in component order; never empty.
    pub reasons: Vec<Reason>,
    pub breakdown: ScoreBreakdown,
}

/// The engine's recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub slot_number: SlotNumber,
    /// Informational only.
    pub score: u32,
    pub reasons: Vec<Reason>,
    pub reason_text: String,
}

impl From<SlotScore> for Suggestion {
    fn from(scored: SlotScore) -> Self {
        let primary = scored.reasons.first().copied().unwrap_or(Reason::AvailableSlot);
        Self {
            slot_number: scored.slot_number,
            score: scored.score,
            reason_text: format!("Suggested because {primary}"),
            reasons: scored.reasons,
        }
    }
}

/// Score a single slot for the given vehicle type, relative to the whole lot.
///
/// Returns `None` for occupied slots.
pub fn score_slot(
    vehicle_type: &VehicleType,
    slot: &SlotSnapshot,
    slots: &[SlotSnapshot],
) -> Option<SlotScore> {
    if slot.occupied {
        return None;
    }

    let n = slot.slot_number;
    let mut reasons = Vec::new();

    let proximity = if n <= NEAR_ENTRANCE_MAX {
        reasons.push(Reason::NearestToEntrance);
        30
    } else if n <= MID_DISTANCE_MAX {
        20
    } else {
        10
    };

    let nearby_occupied = slots
        .iter()
        .filter(|s| s.occupied && s.slot_number != n && s.slot_number.abs_diff(n) <= CONGESTION_RADIUS)
        .count() as u32;
    let congestion = 25u32.saturating_sub(nearby_occupied * 5);
    if nearby_occupied == 0 {
        reasons.push(Reason::IsolatedArea);
    } else if nearby_occupied <= 1 {
        reasons.push(Reason::LowCongestion);
    }

    let vehicle_fit = match vehicle_type {
        t if t.is_large() && n >= LARGE_VEHICLE_MIN => {
            reasons.push(Reason::OptimalForLargeVehicle);
            25
        }
        VehicleType::Bike => {
            reasons.push(Reason::SuitableForBike);
            20
        }
        VehicleType::Car if (CAR_BAND.0..=CAR_BAND.1).contains(&n) => {
            reasons.push(Reason::OptimalForCar);
            25
        }
        // Cars outside the band, large vehicles near the entrance, and unknown types.
        _ => 15,
    };

    let row_position = match n % ROW_LEN {
        0 => ROW_LEN,
        p => p,
    };
    let position = if row_position == ROW_CENTRE {
        reasons.push(Reason::CentralPosition);
        10
    } else {
        0
    };

    if reasons.is_empty() {
        reasons.push(Reason::AvailableSlot);
    }

    let breakdown = ScoreBreakdown {
        proximity,
        congestion,
        vehicle_fit,
        position,
    };

    Some(SlotScore {
        slot_number: n,
        score: breakdown.total(),
        reasons,
        breakdown,
    })
}

/// Score all available slots and return them best first.
///
/// The sort is stable, so slots with equal scores keep their input order.
pub fn rank_slots(vehicle_type: &VehicleType, slots: &[SlotSnapshot]) -> Vec<SlotScore> {
    let mut scores: Vec<SlotScore> = slots
        .iter()
        .filter_map(|s| score_slot(vehicle_type, s, slots))
        .collect();

    scores.sort_by(|a, b| b.score.cmp(&a.score));
    scores
}

/// Recommend the best available slot, or `None` when the lot is empty or full.
pub fn suggest(vehicle_type: &VehicleType, slots: &[SlotSnapshot]) -> Option<Suggestion> {
    let best = rank_slots(vehicle_type, slots).into_iter().next()?;
    debug!(
        vehicle_type = %vehicle_type,
        slot = best.slot_number,
        score = best.score,
        "slot suggested"
    );
    Some(best.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_available(count: u32) -> Vec<SlotSnapshot> {
        (1..=count).map(SlotSnapshot::available).collect()
    }

    #[test]
    fn empty_lot_has_no_suggestion() {
        for vt in VehicleType::KNOWN {
            assert!(suggest(&vt, &[]).is_none());
        }
    }

    #[test]
    fn full_lot_has_no_suggestion() {
        let slots: Vec<SlotSnapshot> = (1..=6)
            .map(|n| SlotSnapshot::occupied_by(n, VehicleType::Car, &format!("P-{n}")))
            .collect();
        assert!(suggest(&VehicleType::Truck, &slots).is_none());
    }

    #[test]
    fn single_slot_near_entrance() {
        let slots = vec![SlotSnapshot::available(1)];
        let s = suggest(&VehicleType::Car, &slots).unwrap();

        assert_eq!(s.slot_number, 1);
        assert!(s.reasons.contains(&Reason::NearestToEntrance));
        assert_eq!(s.reasons, vec![Reason::NearestToEntrance, Reason::IsolatedArea]);
        assert_eq!(s.score, 30 + 25 + 15);
    }

    #[test]
    fn neighbour_occupied_gives_low_congestion() {
        let slots = vec![
            SlotSnapshot::occupied_by(1, VehicleType::Car, "X-1"),
            SlotSnapshot::available(2),
        ];
        let s = suggest(&VehicleType::Car, &slots).unwrap();

        assert_eq!(s.slot_number, 2);
        assert_eq!(s.score, 65);
        assert_eq!(s.reasons, vec![Reason::NearestToEntrance, Reason::LowCongestion]);
        assert_eq!(s.reason_text, "Suggested because nearest to entrance");
    }

    #[test]
    fn truck_prefers_far_end_central_slot_among_large_bays() {
        let slots = all_available(20);

        let slot_18 = score_slot(&VehicleType::Truck, &slots[17], &slots).unwrap();
        assert_eq!(
            slot_18.breakdown,
            ScoreBreakdown {
                proximity: 10,
                congestion: 25,
                vehicle_fit: 25,
                position: 10,
            }
        );
        assert_eq!(slot_18.score, 70);

        let ranked = rank_slots(&VehicleType::Truck, &slots);
        let best_large = ranked.iter().find(|s| s.slot_number >= 15).unwrap();
        assert_eq!(best_large.slot_number, 18);
        for other in ranked.iter().filter(|s| s.slot_number >= 15 && s.slot_number != 18) {
            assert!(other.score < 70);
        }
    }

    #[test]
    fn entrance_centre_outscores_far_end_for_trucks() {
        // Slot 3: proximity 30 + isolated 25 + base 15 + centre 10 = 80 > 70.
        let slots = all_available(20);
        let s = suggest(&VehicleType::Truck, &slots).unwrap();
        assert_eq!(s.slot_number, 3);
        assert_eq!(s.score, 80);
    }

    #[test]
    fn bike_is_tagged_everywhere() {
        let slots = vec![SlotSnapshot::available(12)];
        let s = suggest(&VehicleType::Bike, &slots).unwrap();
        assert_eq!(s.reasons, vec![Reason::IsolatedArea, Reason::SuitableForBike]);
        assert_eq!(s.score, 10 + 25 + 20);
    }

    #[test]
    fn car_band_bonus() {
        let slots = vec![SlotSnapshot::available(13)];
        let s = suggest(&VehicleType::Car, &slots).unwrap();
        assert_eq!(
            s.reasons,
            vec![Reason::IsolatedArea, Reason::OptimalForCar, Reason::CentralPosition]
        );
        assert_eq!(s.score, 10 + 25 + 25 + 10);
    }

    #[test]
    fn congestion_floors_at_zero() {
        let mut slots: Vec<SlotSnapshot> = [6, 7, 9, 10]
            .into_iter()
            .map(|n| SlotSnapshot::occupied_by(n, VehicleType::Car, "P"))
            .collect();
        slots.push(SlotSnapshot::available(8));

        let s = score_slot(&VehicleType::Car, &slots[4], &slots).unwrap();
        assert_eq!(s.breakdown.congestion, 5);
        assert_eq!(s.reasons, vec![Reason::CentralPosition]);

        // Six occupied neighbours cannot happen within radius 2 of distinct
        // numbers, but duplicate numbers in malformed input can.
        let mut crowded: Vec<SlotSnapshot> = (0..6)
            .map(|_| SlotSnapshot::occupied_by(7, VehicleType::Car, "P"))
            .collect();
        crowded.push(SlotSnapshot::available(8));
        let s = score_slot(&VehicleType::Car, &crowded[6], &crowded).unwrap();
        assert_eq!(s.breakdown.congestion, 0);
    }

    #[test]
    fn no_tag_falls_back_to_available_slot() {
        // Slot 9: proximity 20, two occupied neighbours, car outside band, row 4.
        let slots = vec![
            SlotSnapshot::occupied_by(8, VehicleType::Car, "A"),
            SlotSnapshot::available(9),
            SlotSnapshot::occupied_by(11, VehicleType::Car, "B"),
        ];
        let s = suggest(&VehicleType::Car, &slots).unwrap();
        assert_eq!(s.reasons, vec![Reason::AvailableSlot]);
        assert_eq!(s.reason_text, "Suggested because available slot");
    }

    #[test]
    fn ties_keep_input_order() {
        // 11 and 14 both score 10 + 25 + 15 + 0 for a microbus.
        let slots = vec![SlotSnapshot::available(14), SlotSnapshot::available(11)];
        let s = suggest(&VehicleType::Microbus, &slots).unwrap();
        assert_eq!(s.slot_number, 14);

        let reversed = vec![SlotSnapshot::available(11), SlotSnapshot::available(14)];
        let s = suggest(&VehicleType::Microbus, &reversed).unwrap();
        assert_eq!(s.slot_number, 11);
    }

    #[test]
    fn suggestion_is_deterministic() {
        let mut slots = all_available(20);
        slots[4].occupied = true;
        slots[11].occupied = true;

        let first = suggest(&VehicleType::Car, &slots);
        let second = suggest(&VehicleType::Car, &slots);
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_vehicle_type_is_neutral() {
        let other = VehicleType::Other("HOVERCRAFT".to_string());
        let slots = vec![SlotSnapshot::available(12)];

        let s = suggest(&other, &slots).unwrap();
        assert_eq!(s.slot_number, 12);
        assert_eq!(s.score, 10 + 25 + 15);
        assert!(!s.reasons.contains(&Reason::OptimalForCar));
    }

    #[test]
    fn malformed_snapshot_entries_are_tolerated() {
        let slots: Vec<SlotSnapshot> =
            serde_json::from_str(r#"[{"slotNumber": 4}, {"occupied": true}, {}]"#).unwrap();
        assert_eq!(slots.len(), 3);
        assert!(!slots[0].occupied);

        let s = suggest(&VehicleType::from("van"), &slots).unwrap();
        assert_eq!(s.slot_number, 4);
    }

    #[test]
    fn null_snapshot_fields_are_falsy() {
        let slots: Vec<SlotSnapshot> = serde_json::from_str(
            r#"[{"slotNumber": 3, "occupied": null, "vehicleType": null, "licensePlate": null},
                {"slotNumber": null, "occupied": true}]"#,
        )
        .unwrap();
        assert_eq!(slots[0], SlotSnapshot::available(3));
        assert_eq!(slots[1].slot_number, 0);

        let s = suggest(&VehicleType::Car, &slots).unwrap();
        assert_eq!(s.slot_number, 3);
    }

    #[test]
    fn suggestion_wire_shape() {
        let s = suggest(&VehicleType::Car, &[SlotSnapshot::available(1)]).unwrap();
        let json = serde_json::to_value(&s).unwrap();

        assert_eq!(json["slotNumber"], 1);
        assert_eq!(json["score"], 70);
        assert_eq!(json["reasons"][0], "nearest to entrance");
        assert_eq!(json["reasonText"], "Suggested because nearest to entrance");
    }
}
