//! Parking service error types.

use smartpark_state::{FloorNumber, SlotNumber, StateError, VehicleType};
use thiserror::Error;

/// Errors that can occur during parking operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown vehicle type: {0}")]
    UnknownVehicleType(String),

    #[error("vehicle {0} is already parked")]
    AlreadyParked(String),

    #[error("no slot available for vehicle type: {0}")]
    NoSlotAvailable(VehicleType),

    #[error("slot {slot}{} not found", on_floor(.floor))]
    SlotNotFound {
        slot: SlotNumber,
        floor: Option<FloorNumber>,
    },

    #[error("no vehicle found in slot {0}")]
    SlotEmpty(SlotNumber),

    #[error("slot {0} is occupied")]
    SlotOccupied(SlotNumber),

    #[error("slot {slot} already exists on floor {floor}")]
    SlotExists { slot: SlotNumber, floor: FloorNumber },

    #[error("slot {slot} is for {designated}, not {requested}")]
    SlotTypeMismatch {
        slot: SlotNumber,
        designated: VehicleType,
        requested: VehicleType,
    },

    #[error("vehicle not found: {0}")]
    VehicleNotFound(String),

    #[error("parking record {0} not found")]
    RecordNotFound(u64),

    /// The record has no exit yet, so there is no exit slip to show.
    #[error("parking record {0} is still active")]
    StayInProgress(u64),

    #[error("floor {0} not found")]
    FloorNotFound(FloorNumber),

    #[error("floor {0} already exists")]
    FloorExists(FloorNumber),

    #[error("state store error: {0}")]
    State(#[from] StateError),
}

impl ServiceError {
    /// The addressed slot, vehicle, or floor does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ServiceError::SlotNotFound { .. }
                | ServiceError::SlotEmpty(_)
                | ServiceError::VehicleNotFound(_)
                | ServiceError::RecordNotFound(_)
                | ServiceError::FloorNotFound(_)
        )
    }

    /// The request clashes with the lot's current state.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ServiceError::AlreadyParked(_)
                | ServiceError::NoSlotAvailable(_)
                | ServiceError::SlotOccupied(_)
                | ServiceError::SlotExists { .. }
                | ServiceError::FloorExists(_)
                | ServiceError::StayInProgress(_)
        )
    }

    /// Failure inside the store rather than in the request.
    pub fn is_internal(&self) -> bool {
        matches!(self, ServiceError::State(_))
    }
}

fn on_floor(floor: &Option<FloorNumber>) -> String {
    floor.map(|f| format!(" on floor {f}")).unwrap_or_default()
}

pub type ServiceResult<T> = Result<T, ServiceError>;
