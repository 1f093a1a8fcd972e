//! REST API handlers for lot administration.
//!
//! Provides endpoints for charges, overrides, floors and slots, and the
//! audit trail. The acting admin is read from the `x-smartpark-admin` header.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use smartpark_service::{AuditFilter, ServiceError, SlotRef};
use smartpark_state::{FloorNumber, SlotNumber, VehicleType};

use crate::ApiState;
use crate::handlers::{ApiResponse, FloorQuery, JsonOrForm, service_error};

/// Header naming the admin performing the request.
pub const ADMIN_HEADER: &str = "x-smartpark-admin";

fn admin_name(headers: &HeaderMap) -> String {
    headers
        .get(ADMIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("admin")
        .to_string()
}

// ── Request types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChargeRequest {
    pub hourly_rate: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLicenseRequest {
    pub slot_number: SlotNumber,
    pub floor_number: Option<FloorNumber>,
    pub new_license_plate: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSlotRequest {
    pub slot_number: SlotNumber,
    pub floor_number: Option<FloorNumber>,
    pub new_slot_number: SlotNumber,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFloorRequest {
    pub floor_number: FloorNumber,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSlotsRequest {
    pub vehicle_type: VehicleType,
    pub start_slot: SlotNumber,
    pub count: u32,
}

// ── Charges ────────────────────────────────────────────────────

/// GET /api/v1/charges
pub async fn list_charges(State(state): State<ApiState>) -> Response {
    match state.service.list_charges() {
        Ok(charges) => ApiResponse::ok(charges).into_response(),
        Err(e) => service_error(e),
    }
}

/// GET /api/v1/charges/{vehicleType}
pub async fn get_charge(
    State(state): State<ApiState>,
    Path(vehicle_type): Path<String>,
) -> Response {
    let vehicle_type = VehicleType::from(vehicle_type);
    if !vehicle_type.is_known() {
        return service_error(ServiceError::UnknownVehicleType(vehicle_type.to_string()));
    }
    match state.service.get_charge(&vehicle_type) {
        Ok(charge) => ApiResponse::ok(charge).into_response(),
        Err(e) => service_error(e),
    }
}

/// PUT /api/v1/charges/{vehicleType}
pub async fn update_charge(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(vehicle_type): Path<String>,
    JsonOrForm(req): JsonOrForm<UpdateChargeRequest>,
) -> Response {
    let vehicle_type = VehicleType::from(vehicle_type);
    match state
        .service
        .update_charge(&vehicle_type, req.hourly_rate, &admin_name(&headers))
        .await
    {
        Ok(charge) => ApiResponse::ok(charge).into_response(),
        Err(e) => service_error(e),
    }
}

// ── Overrides ──────────────────────────────────────────────────

/// POST /api/v1/override/force-exit
pub async fn force_exit(
    State(state): State<ApiState>,
    headers: HeaderMap,
    JsonOrForm(slot_ref): JsonOrForm<SlotRef>,
) -> Response {
    match state.service.force_exit(slot_ref, &admin_name(&headers)).await {
        Ok(record) => ApiResponse::ok(record).into_response(),
        Err(e) => service_error(e),
    }
}

/// POST /api/v1/override/update-license
pub async fn update_license(
    State(state): State<ApiState>,
    headers: HeaderMap,
    JsonOrForm(req): JsonOrForm<UpdateLicenseRequest>,
) -> Response {
    let slot_ref = SlotRef::new(req.slot_number, req.floor_number);
    match state
        .service
        .update_license_plate(slot_ref, &req.new_license_plate, &admin_name(&headers))
        .await
    {
        Ok(record) => ApiResponse::ok(record).into_response(),
        Err(e) => service_error(e),
    }
}

/// POST /api/v1/override/change-slot
pub async fn change_slot(
    State(state): State<ApiState>,
    headers: HeaderMap,
    JsonOrForm(req): JsonOrForm<ChangeSlotRequest>,
) -> Response {
    let slot_ref = SlotRef::new(req.slot_number, req.floor_number);
    match state
        .service
        .change_slot(slot_ref, req.new_slot_number, &admin_name(&headers))
        .await
    {
        Ok(record) => ApiResponse::ok(record).into_response(),
        Err(e) => service_error(e),
    }
}

/// POST /api/v1/slots/{slot}/mark-available
pub async fn mark_available(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(slot): Path<SlotNumber>,
    Query(query): Query<FloorQuery>,
) -> Response {
    match state
        .service
        .mark_slot_available(SlotRef::new(slot, query.floor), &admin_name(&headers))
        .await
    {
        Ok(slot) => ApiResponse::ok(slot).into_response(),
        Err(e) => service_error(e),
    }
}

// ── Floors and slots ───────────────────────────────────────────

/// GET /api/v1/floors
pub async fn list_floors(State(state): State<ApiState>) -> Response {
    match state.service.list_floors() {
        Ok(floors) => ApiResponse::ok(floors).into_response(),
        Err(e) => service_error(e),
    }
}

/// GET /api/v1/floors/{floor}
pub async fn get_floor(
    State(state): State<ApiState>,
    Path(floor): Path<FloorNumber>,
) -> Response {
    match state.service.get_floor(floor) {
        Ok(floor) => ApiResponse::ok(floor).into_response(),
        Err(e) => service_error(e),
    }
}

/// POST /api/v1/floors
pub async fn create_floor(
    State(state): State<ApiState>,
    headers: HeaderMap,
    JsonOrForm(req): JsonOrForm<CreateFloorRequest>,
) -> Response {
    match state
        .service
        .create_floor(req.floor_number, &req.description, &admin_name(&headers))
        .await
    {
        Ok(floor) => (StatusCode::CREATED, ApiResponse::ok(floor)).into_response(),
        Err(e) => service_error(e),
    }
}

/// GET /api/v1/floors/{floor}/slots
pub async fn list_floor_slots(
    State(state): State<ApiState>,
    Path(floor): Path<FloorNumber>,
) -> Response {
    match state.service.list_slots(Some(floor)) {
        Ok(slots) => ApiResponse::ok(slots).into_response(),
        Err(e) => service_error(e),
    }
}

/// POST /api/v1/floors/{floor}/slots
pub async fn add_slots(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(floor): Path<FloorNumber>,
    JsonOrForm(req): JsonOrForm<AddSlotsRequest>,
) -> Response {
    match state
        .service
        .add_slots(floor, &req.vehicle_type, req.start_slot, req.count, &admin_name(&headers))
        .await
    {
        Ok(slots) => (StatusCode::CREATED, ApiResponse::ok(slots)).into_response(),
        Err(e) => service_error(e),
    }
}

/// DELETE /api/v1/floors/{floor}/slots/{slot}
pub async fn delete_slot(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path((floor, slot)): Path<(FloorNumber, SlotNumber)>,
) -> Response {
    match state
        .service
        .delete_slot(floor, slot, &admin_name(&headers))
        .await
    {
        Ok(()) => ApiResponse::ok("deleted").into_response(),
        Err(e) => service_error(e),
    }
}

// ── Audit ──────────────────────────────────────────────────────

/// GET /api/v1/audit-logs
pub async fn audit_logs(
    State(state): State<ApiState>,
    Query(filter): Query<AuditFilter>,
) -> Response {
    match state.service.audit_log(&filter) {
        Ok(entries) => ApiResponse::ok(entries).into_response(),
        Err(e) => service_error(e),
    }
}
