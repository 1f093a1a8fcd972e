//! smartpark-api — REST API for SmartPark.
//!
//! Provides axum route handlers for the entrance kiosk (slots, suggestions,
//! park and exit) and for lot administration (charges, overrides, floors,
//! audit trail).
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/healthz` | Liveness check |
//! | GET | `/api/v1/slots?floor=` | List slots with occupancy |
//! | GET | `/api/v1/slots/{slot}?floor=` | Slot detail with running charge |
//! | GET | `/api/v1/slots/{slot}/history?limit=` | Recent stays in a slot |
//! | GET | `/api/v1/slots/{slot}/entry-slip?floor=` | Active stay in a slot |
//! | GET | `/api/v1/records/{id}/exit-slip` | Completed stay by record id |
//! | POST | `/api/v1/slots/{slot}/mark-available?floor=` | Confirm a slot is clear |
//! | POST | `/api/v1/suggest` | Score a posted snapshot |
//! | GET | `/api/v1/suggest?vehicleType=&floor=` | Suggest a slot on live state |
//! | POST | `/api/v1/park` | Park a vehicle (JSON or form) |
//! | POST | `/api/v1/exit-by-slot` | Exit and bill by slot |
//! | POST | `/api/v1/exit-by-plate` | Exit and bill by plate |
//! | GET | `/api/v1/dashboard/stats` | Today's headline numbers |
//! | GET | `/api/v1/history` | Completed stays |
//! | GET | `/api/v1/charges` | Hourly charges |
//! | GET/PUT | `/api/v1/charges/{vehicleType}` | Read or set one charge |
//! | POST | `/api/v1/override/force-exit` | Admin force exit |
//! | POST | `/api/v1/override/update-license` | Admin plate correction |
//! | POST | `/api/v1/override/change-slot` | Admin slot move |
//! | GET/POST | `/api/v1/floors` | List or create floors |
//! | GET | `/api/v1/floors/{n}` | One floor |
//! | GET/POST | `/api/v1/floors/{n}/slots` | List or add slots on a floor |
//! | DELETE | `/api/v1/floors/{n}/slots/{slot}` | Remove a free slot |
//! | GET | `/api/v1/audit-logs` | Admin audit trail |
//!
//! Admin routes take the acting admin's name from the `x-smartpark-admin`
//! header.

pub mod admin_handlers;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use smartpark_service::ParkingService;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<ParkingService>,
}

/// Build the complete API router.
pub fn build_router(service: Arc<ParkingService>) -> Router {
    let api_state = ApiState { service };

    let api_routes = Router::new()
        .route("/slots", get(handlers::list_slots))
        .route("/slots/{slot}", get(handlers::get_slot))
        .route("/slots/{slot}/history", get(handlers::slot_history))
        .route("/slots/{slot}/entry-slip", get(handlers::entry_slip))
        .route("/records/{id}/exit-slip", get(handlers::exit_slip))
        .route("/slots/{slot}/mark-available", post(admin_handlers::mark_available))
        .route("/suggest", get(handlers::suggest_live).post(handlers::suggest_snapshot))
        .route("/park", post(handlers::park))
        .route("/exit-by-slot", post(handlers::exit_by_slot))
        .route("/exit-by-plate", post(handlers::exit_by_plate))
        .route("/dashboard/stats", get(handlers::dashboard_stats))
        .route("/history", get(handlers::history))
        .route("/charges", get(admin_handlers::list_charges))
        .route(
            "/charges/{vehicle_type}",
            get(admin_handlers::get_charge).put(admin_handlers::update_charge),
        )
        .route("/override/force-exit", post(admin_handlers::force_exit))
        .route("/override/update-license", post(admin_handlers::update_license))
        .route("/override/change-slot", post(admin_handlers::change_slot))
        .route("/floors", get(admin_handlers::list_floors).post(admin_handlers::create_floor))
        .route("/floors/{floor}", get(admin_handlers::get_floor))
        .route(
            "/floors/{floor}/slots",
            get(admin_handlers::list_floor_slots).post(admin_handlers::add_slots),
        )
        .route("/floors/{floor}/slots/{slot}", delete(admin_handlers::delete_slot))
        .route("/audit-logs", get(admin_handlers::audit_logs))
        .with_state(api_state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/healthz", get(handlers::healthz))
}
