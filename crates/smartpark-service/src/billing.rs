//! Billing rules.
//!
//! A stay is billed per started hour with a one-hour minimum:
//! 15 min → 1 h, 60 min → 1 h, 61 min → 2 h, 121 min → 3 h.

use smartpark_state::VehicleType;

/// Hourly rate used for a vehicle type with no active configured charge.
pub fn default_hourly_rate(vehicle_type: &VehicleType) -> f64 {
    match vehicle_type {
        VehicleType::Bike => 50.0,
        VehicleType::Car => 100.0,
        VehicleType::Microbus => 150.0,
        VehicleType::Truck => 200.0,
        VehicleType::Other(_) => 100.0,
    }
}

/// Hours to bill for a stay of `duration_minutes`.
pub fn billable_hours(duration_minutes: u64) -> u32 {
    if duration_minutes < 60 {
        return 1;
    }
    duration_minutes.div_ceil(60).min(u64::from(u32::MAX)) as u32
}

/// Total charge for a stay at `hourly_rate`.
pub fn charge_for(duration_minutes: u64, hourly_rate: f64) -> f64 {
    f64::from(billable_hours(duration_minutes)) * hourly_rate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_hour_minimum() {
        assert_eq!(billable_hours(0), 1);
        assert_eq!(billable_hours(15), 1);
        assert_eq!(billable_hours(45), 1);
        assert_eq!(billable_hours(60), 1);
    }

    #[test]
    fn rounds_up_to_next_hour() {
        assert_eq!(billable_hours(61), 2);
        assert_eq!(billable_hours(120), 2);
        assert_eq!(billable_hours(121), 3);
        assert_eq!(billable_hours(24 * 60 + 1), 25);
    }

    #[test]
    fn default_rates() {
        assert_eq!(default_hourly_rate(&VehicleType::Bike), 50.0);
        assert_eq!(default_hourly_rate(&VehicleType::Car), 100.0);
        assert_eq!(default_hourly_rate(&VehicleType::Microbus), 150.0);
        assert_eq!(default_hourly_rate(&VehicleType::Truck), 200.0);
        assert_eq!(default_hourly_rate(&VehicleType::from("van")), 100.0);
    }

    #[test]
    fn charge_is_hours_times_rate() {
        assert_eq!(charge_for(61, 150.0), 300.0);
        assert_eq!(charge_for(5, 50.0), 50.0);
    }
}
