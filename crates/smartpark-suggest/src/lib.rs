//! SmartPark slot suggestion engine.
//!
//! Given a vehicle type and a snapshot of the lot's slots, scores every
//! available slot and recommends the best one with a short justification.
//! The engine is a pure function of its inputs: it holds no state between
//! calls and the caller owns the returned [`Suggestion`].
//!
//! # Components
//!
//! - **`scorer`** — Slot scoring (proximity, congestion, vehicle fit, position)
//! - **`convert`** — Snapshot construction from state store types

pub mod convert;
pub mod scorer;

pub use convert::{slot_to_snapshot, snapshot_from_state};
pub use scorer::{
    Reason, ScoreBreakdown, SlotScore, SlotSnapshot, Suggestion, null_as_default, rank_slots,
    score_slot, suggest,
};
pub use smartpark_state::VehicleType;
