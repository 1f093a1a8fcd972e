//! smartpark.toml configuration parser.
//!
//! Every section is optional; missing values fall back to the defaults of
//! a single 20-slot ground floor.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use smartpark_state::VehicleType;

use crate::billing::default_hourly_rate;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartparkConfig {
    pub server: ServerConfig,
    pub lot: LotConfig,
    /// Hourly rate per vehicle type wire name, seeded into an empty store.
    pub charges: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory for the on-disk store. In-memory when absent.
    pub data_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            data_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LotConfig {
    /// Parking time shown as allowed on occupied slots.
    pub allowed_minutes: u32,
    /// A stay longer than this is flagged overdue.
    pub overdue_minutes: u64,
    /// Description of the floor created when seeding an empty store.
    pub ground_floor_description: String,
    /// Slot designations of the seeded ground floor, numbered from 1 in order.
    pub layout: Vec<SlotBlock>,
}

impl Default for LotConfig {
    fn default() -> Self {
        Self {
            allowed_minutes: 120,
            overdue_minutes: 24 * 60,
            ground_floor_description: "Ground Floor".to_string(),
            layout: vec![
                SlotBlock::new(VehicleType::Bike, 5),
                SlotBlock::new(VehicleType::Car, 10),
                SlotBlock::new(VehicleType::Microbus, 3),
                SlotBlock::new(VehicleType::Truck, 2),
            ],
        }
    }
}

/// A run of consecutive slots designated for one vehicle type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotBlock {
    pub vehicle_type: VehicleType,
    pub count: u32,
}

impl SlotBlock {
    pub fn new(vehicle_type: VehicleType, count: u32) -> Self {
        Self { vehicle_type, count }
    }
}

impl SmartparkConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SmartparkConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Scaffold a config with every default spelled out.
    pub fn scaffold() -> Self {
        let charges = VehicleType::KNOWN
            .iter()
            .map(|vt| (vt.as_str().to_string(), default_hourly_rate(vt)))
            .collect();
        Self {
            charges,
            ..Self::default()
        }
    }

    /// Reject layouts and rates the service could not honour.
    pub fn validate(&self) -> anyhow::Result<()> {
        for block in &self.lot.layout {
            if !block.vehicle_type.is_known() {
                anyhow::bail!("unknown vehicle type in lot layout: {}", block.vehicle_type);
            }
        }
        for (name, rate) in &self.charges {
            if !VehicleType::from(name.as_str()).is_known() {
                anyhow::bail!("unknown vehicle type in charges: {name}");
            }
            if !rate.is_finite() || *rate < 0.0 {
                anyhow::bail!("invalid hourly rate for {name}: {rate}");
            }
        }
        Ok(())
    }

    /// Configured charges, falling back to the default rate for types not listed.
    pub fn hourly_rates(&self) -> Vec<(VehicleType, f64)> {
        VehicleType::KNOWN
            .iter()
            .map(|vt| {
                let rate = self
                    .charges
                    .iter()
                    .find(|(name, _)| VehicleType::from(name.as_str()) == *vt)
                    .map(|(_, rate)| *rate)
                    .unwrap_or_else(|| default_hourly_rate(vt));
                (vt.clone(), rate)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaffold_round_trips() {
        let config = SmartparkConfig::scaffold();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("MICROBUS"));
        assert!(toml_str.contains("allowed_minutes"));

        let parsed: SmartparkConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.lot.layout.len(), 4);
        assert_eq!(parsed.charges.get("TRUCK"), Some(&200.0));
    }

    #[test]
    fn test_parse_empty() {
        let config: SmartparkConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.server.data_dir.is_none());
        assert_eq!(config.lot.allowed_minutes, 120);
        let total: u32 = config.lot.layout.iter().map(|b| b.count).sum();
        assert_eq!(total, 20);
    }

    #[test]
    fn test_parse_partial() {
        let toml_str = r#"
[server]
port = 9000

[lot]
allowed_minutes = 90
layout = [{ vehicle_type = "car", count = 8 }]

[charges]
CAR = 120.0
"#;
        let config: SmartparkConfig = toml::from_str(toml_str).unwrap();
        config.validate().unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.lot.allowed_minutes, 90);
        assert_eq!(config.lot.overdue_minutes, 24 * 60);
        assert_eq!(config.lot.layout, vec![SlotBlock::new(VehicleType::Car, 8)]);

        let rates = config.hourly_rates();
        assert!(rates.contains(&(VehicleType::Car, 120.0)));
        assert!(rates.contains(&(VehicleType::Bike, 50.0)));
    }

    #[test]
    fn test_validate_rejects_unknown_layout_type() {
        let toml_str = r#"
[lot]
layout = [{ vehicle_type = "BOAT", count = 2 }]
"#;
        let config: SmartparkConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_rate() {
        let mut config = SmartparkConfig::scaffold();
        config.charges.insert("BIKE".to_string(), -1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smartpark.toml");
        std::fs::write(&path, "[server]\nport = 7000\n").unwrap();

        let config = SmartparkConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 7000);
    }
}
