use std::path::Path;

use smartpark_suggest::{SlotSnapshot, Suggestion, VehicleType, suggest as suggest_slot};

pub fn suggest(vehicle_type: &str, slots_path: &Path, format: &str) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(slots_path)?;
    let slots: Vec<SlotSnapshot> = serde_json::from_str(&content)?;
    let vehicle_type = VehicleType::from(vehicle_type);

    let suggestion = suggest_slot(&vehicle_type, &slots);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&suggestion)?);
        }
        _ => {
            println!("{}", format_suggestion(&vehicle_type, suggestion.as_ref()));
        }
    }

    Ok(())
}

fn format_suggestion(vehicle_type: &VehicleType, suggestion: Option<&Suggestion>) -> String {
    match suggestion {
        Some(s) => {
            let reasons: Vec<&str> = s.reasons.iter().map(|r| r.as_str()).collect();
            format!(
                "Slot {} for {vehicle_type} (score {})\n  {}\n  reasons: {}",
                s.slot_number,
                s.score,
                s.reason_text,
                reasons.join(", ")
            )
        }
        None => format!("No available slot for {vehicle_type}"),
    }
}

pub fn config_init(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    let config = smartpark_service::SmartparkConfig::scaffold();
    std::fs::write(path, config.to_toml_string()?)?;
    println!("✓ Generated {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_lot_full() {
        assert_eq!(
            format_suggestion(&VehicleType::Truck, None),
            "No available slot for TRUCK"
        );
    }

    #[test]
    fn format_suggested_slot() {
        let slots: Vec<SlotSnapshot> = (1..=5).map(SlotSnapshot::available).collect();
        let suggestion = suggest_slot(&VehicleType::Bike, &slots);
        let text = format_suggestion(&VehicleType::Bike, suggestion.as_ref());
        assert!(text.starts_with("Slot 3 for BIKE (score 85)"));
        assert!(text.contains("Suggested because nearest to entrance"));
    }

    #[test]
    fn suggest_reads_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slots.json");
        std::fs::write(
            &path,
            r#"[{"slotNumber": 1, "occupied": true, "vehicleType": "CAR"}, {"slotNumber": 2}]"#,
        )
        .unwrap();
        suggest("car", &path, "json").unwrap();

        std::fs::write(&path, "not json").unwrap();
        assert!(suggest("car", &path, "text").is_err());
    }

    #[test]
    fn config_init_writes_scaffold_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smartpark.toml");

        config_init(&path).unwrap();
        let config = smartpark_service::SmartparkConfig::from_file(&path).unwrap();
        assert_eq!(config.charges.len(), 4);

        assert!(config_init(&path).is_err());
    }
}
