//! smartpark-service — parking operations over the state store.
//!
//! The `ParkingService` owns every state-changing operation of the lot:
//!
//! - Parks vehicles (first free slot, or a preferred/suggested slot)
//! - Completes stays on exit and bills them by the started hour
//! - Applies admin overrides and records them in the audit trail
//! - Manages floors, slots, and hourly charges
//! - Answers read queries: slot listings, details, statistics, history
//!
//! # Architecture
//!
//! ```text
//! ParkingService
//!   ├── StateStore (floors, slots, records, charges, audit)
//!   ├── LotConfig (layout, allowed/overdue minutes)
//!   ├── Clock (system time, or manual in tests)
//!   └── write lock (serialises check-then-write operations)
//! ```

pub mod admin;
pub mod billing;
pub mod clock;
pub mod config;
pub mod error;
pub mod service;
pub mod views;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LotConfig, ServerConfig, SlotBlock, SmartparkConfig};
pub use error::{ServiceError, ServiceResult};
pub use service::ParkingService;
pub use views::*;
