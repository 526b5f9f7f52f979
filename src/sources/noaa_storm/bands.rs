use crate::domain::model::Band;

/// Trimble Digital Sensor System, as flown by NOAA NGS.
pub fn dss() -> Vec<Band> {
    vec![
        Band::new("B01", "blue", 455.0).with_fwhm(65.0),
        Band::new("B02", "green", 540.0).with_fwhm(80.0),
        Band::new("B03", "red", 640.0).with_fwhm(60.0),
    ]
}

/// Red, green, blue indices into [`dss`].
pub const DATA_BAND_ORDER: [usize; 3] = [3, 2, 1];
