//! REST API handlers for the entrance kiosk.
//!
//! Each handler calls into `ParkingService` and returns the JSON envelope.

use axum::Json;
use axum::extract::{Form, FromRequest, Path, Query, Request, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use smartpark_service::{HistoryFilter, ServiceError, SlotRef};
use smartpark_state::{FloorNumber, SlotNumber, VehicleType};
use smartpark_suggest::{SlotSnapshot, null_as_default, suggest};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
pub(crate) struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    pub(crate) fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

pub(crate) fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

/// Map a service error onto its HTTP status.
pub(crate) fn service_error(err: ServiceError) -> Response {
    let status = if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if err.is_conflict() {
        StatusCode::CONFLICT
    } else if err.is_internal() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::BAD_REQUEST
    };

    if status.is_server_error() {
        error!(error = %err, "request failed");
    } else {
        debug!(error = %err, status = status.as_u16(), "request rejected");
    }
    error_response(&err.to_string(), status).into_response()
}

/// Body extractor accepting either JSON or an urlencoded form.
///
/// The kiosk page submits forms; scripted clients send JSON. Both failures
/// come back as a 400 envelope.
pub struct JsonOrForm<T>(pub T);

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| error_response(&e.body_text(), StatusCode::BAD_REQUEST).into_response())?;
            Ok(Self(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| error_response(&e.body_text(), StatusCode::BAD_REQUEST).into_response())?;
            Ok(Self(value))
        }
    }
}

// ── Request types ──────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct FloorQuery {
    pub floor: Option<FloorNumber>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

const DEFAULT_SLOT_HISTORY: usize = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestQuery {
    pub vehicle_type: VehicleType,
    pub floor: Option<FloorNumber>,
}

/// Offline scoring request: a vehicle type and a lot snapshot.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    pub vehicle_type: VehicleType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slots: Vec<SlotSnapshot>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkRequest {
    pub license_plate: String,
    pub vehicle_type: VehicleType,
    /// Preferred slot, usually the one suggested to the driver.
    pub slot_number: Option<SlotNumber>,
    pub floor_number: Option<FloorNumber>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitByPlateRequest {
    pub license_plate: String,
}

// ── Health ─────────────────────────────────────────────────────

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    ApiResponse::ok("ok")
}

// ── Slots ──────────────────────────────────────────────────────

/// GET /api/v1/slots
pub async fn list_slots(
    State(state): State<ApiState>,
    Query(query): Query<FloorQuery>,
) -> Response {
    match state.service.list_slots(query.floor) {
        Ok(slots) => ApiResponse::ok(slots).into_response(),
        Err(e) => service_error(e),
    }
}

/// GET /api/v1/slots/{slot}
pub async fn get_slot(
    State(state): State<ApiState>,
    Path(slot): Path<SlotNumber>,
    Query(query): Query<FloorQuery>,
) -> Response {
    match state.service.slot_detail(SlotRef::new(slot, query.floor)) {
        Ok(detail) => ApiResponse::ok(detail).into_response(),
        Err(e) => service_error(e),
    }
}

/// GET /api/v1/slots/{slot}/history
pub async fn slot_history(
    State(state): State<ApiState>,
    Path(slot): Path<SlotNumber>,
    Query(query): Query<LimitQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_SLOT_HISTORY);
    match state.service.slot_history(slot, limit) {
        Ok(records) => ApiResponse::ok(records).into_response(),
        Err(e) => service_error(e),
    }
}

// ── Suggestions ────────────────────────────────────────────────

/// GET /api/v1/suggest
///
/// A full lot is not an error: `data` is null.
pub async fn suggest_live(
    State(state): State<ApiState>,
    Query(query): Query<SuggestQuery>,
) -> Response {
    match state.service.suggest_slot(&query.vehicle_type, query.floor) {
        Ok(suggestion) => ApiResponse::ok(suggestion).into_response(),
        Err(e) => service_error(e),
    }
}

/// POST /api/v1/suggest
pub async fn suggest_snapshot(JsonOrForm(req): JsonOrForm<SuggestRequest>) -> Response {
    ApiResponse::ok(suggest(&req.vehicle_type, &req.slots)).into_response()
}

// ── Park and exit ──────────────────────────────────────────────

/// GET /api/v1/slots/{slot}/entry-slip
pub async fn entry_slip(
    State(state): State<ApiState>,
    Path(slot): Path<SlotNumber>,
    Query(query): Query<FloorQuery>,
) -> Response {
    match state.service.entry_slip(SlotRef::new(slot, query.floor)) {
        Ok(record) => ApiResponse::ok(record).into_response(),
        Err(e) => service_error(e),
    }
}

/// GET /api/v1/records/{id}/exit-slip
///
/// Only completed stays have an exit slip; an active one is a 409.
pub async fn exit_slip(State(state): State<ApiState>, Path(id): Path<u64>) -> Response {
    match state.service.exit_slip(id) {
        Ok(record) => ApiResponse::ok(record).into_response(),
        Err(e) => service_error(e),
    }
}

/// POST /api/v1/park
pub async fn park(
    State(state): State<ApiState>,
    JsonOrForm(req): JsonOrForm<ParkRequest>,
) -> Response {
    let preferred = req
        .slot_number
        .map(|slot| SlotRef::new(slot, req.floor_number));
    match state
        .service
        .park(&req.license_plate, &req.vehicle_type, preferred)
        .await
    {
        Ok(record) => (StatusCode::CREATED, ApiResponse::ok(record)).into_response(),
        Err(e) => service_error(e),
    }
}

/// POST /api/v1/exit-by-slot
pub async fn exit_by_slot(
    State(state): State<ApiState>,
    JsonOrForm(slot_ref): JsonOrForm<SlotRef>,
) -> Response {
    match state.service.exit_by_slot(slot_ref).await {
        Ok(record) => ApiResponse::ok(record).into_response(),
        Err(e) => service_error(e),
    }
}

/// POST /api/v1/exit-by-plate
pub async fn exit_by_plate(
    State(state): State<ApiState>,
    JsonOrForm(req): JsonOrForm<ExitByPlateRequest>,
) -> Response {
    match state.service.exit_by_plate(&req.license_plate).await {
        Ok(record) => ApiResponse::ok(record).into_response(),
        Err(e) => service_error(e),
    }
}

// ── Reporting ──────────────────────────────────────────────────

/// GET /api/v1/dashboard/stats
pub async fn dashboard_stats(State(state): State<ApiState>) -> Response {
    match state.service.dashboard_stats() {
        Ok(stats) => ApiResponse::ok(stats).into_response(),
        Err(e) => service_error(e),
    }
}

/// GET /api/v1/history
pub async fn history(
    State(state): State<ApiState>,
    Query(filter): Query<HistoryFilter>,
) -> Response {
    match state.service.history(&filter) {
        Ok(records) => ApiResponse::ok(records).into_response(),
        Err(e) => service_error(e),
    }
}
