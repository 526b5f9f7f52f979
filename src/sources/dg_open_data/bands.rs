use crate::domain::model::Band;

/// Visible bands of the DigitalGlobe constellation, keyed by vehicle name.
pub fn for_vehicle(vehicle: &str) -> Option<Vec<Band>> {
    let rgb = |red: f64, green: f64, blue: f64| {
        vec![
            Band::new("B01", "red", red),
            Band::new("B02", "green", green),
            Band::new("B03", "blue", blue),
        ]
    };

    match vehicle.to_uppercase().as_str() {
        "WV01" => Some(vec![Band::new("B01", "pan", 650.0)]),
        "WV02" => Some(rgb(659.0, 546.0, 478.0)),
        "WV03" => Some(rgb(660.0, 545.0, 480.0)),
        "WV04" => Some(rgb(672.5, 545.0, 480.0)),
        "GE01" => Some(rgb(672.5, 550.0, 480.0)),
        "QB01" | "QB02" => Some(rgb(650.0, 543.0, 487.5)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vehicles() {
        assert_eq!(for_vehicle("WV01").unwrap()[0].common_name, "pan");
        let wv03 = for_vehicle("wv03").unwrap();
        assert_eq!(wv03.len(), 3);
        assert_eq!(wv03[0].center_wavelength, 660.0);
        assert_eq!(for_vehicle("QB01"), for_vehicle("QB02"));
        assert!(for_vehicle("IK01").is_none());
    }
}
