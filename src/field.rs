//! Raw wind grids.
//!
//! A [`WindField`] is a rectangular lon/lat grid of wind vectors with `u`
//! pointing east and `v` pointing north. Rows are stored south to north so
//! that row 0 lines up with texture coordinate `v = 0`, which the shell maps
//! to the south pole.
//!
//! Fields are usually loaded from the exporter JSON format:
//!
//! ```json
//! {"width":4,"height":2,"u":[...],"v":[...],
//!  "uMin":-12.0,"uMax":18.5,"vMin":-9.0,"vMax":11.0,
//!  "lon0":0.0,"lon1":359.75,"lat0":-90.0,"lat1":90.0,"grid":0.25}
//! ```

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// Normalization range of one wind component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f32,
    pub max: f32,
}

impl AxisRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Width of the range, or `None` when it cannot normalize anything
    /// (`max <= min` or non-finite bounds).
    pub fn span(&self) -> Option<f32> {
        let span = self.max - self.min;
        (self.min.is_finite() && self.max.is_finite() && span > 0.0 && span.is_finite())
            .then_some(span)
    }

    /// Whether [`span`](Self::span) is `None`.
    pub fn is_degenerate(&self) -> bool {
        self.span().is_none()
    }

    /// Smallest range covering every finite value, or `0..0` if there is none.
    fn covering(values: &[f32]) -> Self {
        let (min, max) = values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if min > max {
            Self::new(0.0, 0.0)
        } else {
            Self::new(min, max)
        }
    }
}

/// Normalization ranges for both components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindBounds {
    pub u: AxisRange,
    pub v: AxisRange,
}

impl WindBounds {
    pub fn new(u: AxisRange, v: AxisRange) -> Self {
        Self { u, v }
    }
}

/// Geographic footprint reported by the exporter. Informational only; the
/// shell always spans the full globe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoExtent {
    pub lon0: f32,
    pub lon1: f32,
    pub lat0: f32,
    pub lat1: f32,
    /// Grid spacing in degrees, when known.
    pub grid: Option<f32>,
}

/// A validated wind grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WindFile", into = "WindFile")]
pub struct WindField {
    width: u32,
    height: u32,
    u: Vec<f32>,
    v: Vec<f32>,
    bounds: WindBounds,
    extent: Option<GeoExtent>,
}

impl WindField {
    /// Build a field from row-major component arrays and explicit bounds.
    pub fn new(
        width: u32,
        height: u32,
        u: Vec<f32>,
        v: Vec<f32>,
        bounds: WindBounds,
    ) -> Result<Self, FieldError> {
        if width == 0 || height == 0 {
            return Err(FieldError::EmptyGrid { width, height });
        }
        let expected = width as usize * height as usize;
        for (component, len) in [("u", u.len()), ("v", v.len())] {
            if len != expected {
                return Err(FieldError::ComponentLength {
                    component,
                    expected,
                    actual: len,
                });
            }
        }
        Ok(Self {
            width,
            height,
            u,
            v,
            bounds,
            extent: None,
        })
    }

    /// Build a field whose bounds are the min/max of the finite samples.
    pub fn from_components(
        width: u32,
        height: u32,
        u: Vec<f32>,
        v: Vec<f32>,
    ) -> Result<Self, FieldError> {
        let bounds = WindBounds::new(AxisRange::covering(&u), AxisRange::covering(&v));
        Self::new(width, height, u, v, bounds)
    }

    /// Attach exporter metadata.
    pub fn with_extent(mut self, extent: GeoExtent) -> Self {
        self.extent = Some(extent);
        self
    }

    /// Parse the exporter JSON format.
    pub fn from_json_str(json: &str) -> Result<Self, FieldError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse the exporter JSON format from a reader.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, FieldError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Read and parse an exporter JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, FieldError> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_json_reader(std::io::BufReader::new(file))
    }

    /// Serialize back to the exporter JSON format.
    pub fn to_json_string(&self) -> Result<String, FieldError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reverse the row order, for sources that store latitude north to south.
    pub fn flipped_rows(mut self) -> Self {
        let width = self.width as usize;
        let flip = |data: &mut Vec<f32>| {
            let flipped: Vec<f32> = data.chunks(width).rev().flatten().copied().collect();
            *data = flipped;
        };
        flip(&mut self.u);
        flip(&mut self.v);
        if let Some(extent) = &mut self.extent {
            std::mem::swap(&mut extent.lat0, &mut extent.lat1);
        }
        self
    }

    /// Synthetic three-cell circulation: trade easterlies below 30°,
    /// westerlies between 30° and 60°, polar easterlies above, with a
    /// meridional pull toward the equator inside the tropics.
    pub fn prevailing(width: u32, height: u32) -> Result<Self, FieldError> {
        let cells = width as usize * height as usize;
        let mut u = Vec::with_capacity(cells);
        let mut v = Vec::with_capacity(cells);

        for row in 0..height {
            let lat = ((row as f32 + 0.5) / height as f32) * 180.0 - 90.0;
            let abs_lat = lat.abs();
            let band = (abs_lat / 30.0 * std::f32::consts::PI).sin().abs();
            let zonal = if (30.0..60.0).contains(&abs_lat) {
                band
            } else {
                -band
            };
            let tropics = (1.0 - (abs_lat / 30.0).clamp(0.0, 1.0)).powf(1.5);
            let meridional = -lat.signum() * 0.4 * tropics;

            for col in 0..width {
                let lon = (col as f32 + 0.5) / width as f32 * std::f32::consts::TAU;
                let eddy = (lon * 3.0 + lat.to_radians() * 4.0).sin() * 0.15;
                u.push((zonal + eddy) * 12.0);
                v.push((meridional + eddy * 0.5) * 8.0);
            }
        }

        Ok(Self::from_components(width, height, u, v)?.with_extent(GeoExtent {
            lon0: 0.0,
            lon1: 360.0,
            lat0: -90.0,
            lat1: 90.0,
            grid: Some(360.0 / width.max(1) as f32),
        }))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of grid cells.
    pub fn len(&self) -> usize {
        self.u.len()
    }

    /// Always false for a validated field; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.u.is_empty()
    }

    pub fn u(&self) -> &[f32] {
        &self.u
    }

    pub fn v(&self) -> &[f32] {
        &self.v
    }

    pub fn bounds(&self) -> WindBounds {
        self.bounds
    }

    pub fn extent(&self) -> Option<&GeoExtent> {
        self.extent.as_ref()
    }

    /// Raw `(u, v)` at grid cell `(x, y)`.
    pub fn sample(&self, x: u32, y: u32) -> Option<(f32, f32)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) as usize;
        Some((self.u[i], self.v[i]))
    }
}

/// On-disk layout written by the exporter.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WindFile {
    width: u32,
    height: u32,
    u: Vec<f32>,
    v: Vec<f32>,
    u_min: f32,
    u_max: f32,
    v_min: f32,
    v_max: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lon0: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lon1: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lat0: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lat1: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    grid: Option<f32>,
}

impl TryFrom<WindFile> for WindField {
    type Error = FieldError;

    fn try_from(file: WindFile) -> Result<Self, Self::Error> {
        let bounds = WindBounds::new(
            AxisRange::new(file.u_min, file.u_max),
            AxisRange::new(file.v_min, file.v_max),
        );
        let field = WindField::new(file.width, file.height, file.u, file.v, bounds)?;
        Ok(match (file.lon0, file.lon1, file.lat0, file.lat1) {
            (Some(lon0), Some(lon1), Some(lat0), Some(lat1)) => field.with_extent(GeoExtent {
                lon0,
                lon1,
                lat0,
                lat1,
                grid: file.grid,
            }),
            _ => field,
        })
    }
}

impl From<WindField> for WindFile {
    fn from(field: WindField) -> Self {
        let extent = field.extent;
        WindFile {
            width: field.width,
            height: field.height,
            u: field.u,
            v: field.v,
            u_min: field.bounds.u.min,
            u_max: field.bounds.u.max,
            v_min: field.bounds.v.min,
            v_max: field.bounds.v.max,
            lon0: extent.map(|e| e.lon0),
            lon1: extent.map(|e| e.lon1),
            lat0: extent.map(|e| e.lat0),
            lat1: extent.map(|e| e.lat1),
            grid: extent.and_then(|e| e.grid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> WindBounds {
        WindBounds::new(AxisRange::new(-1.0, 1.0), AxisRange::new(-1.0, 1.0))
    }

    #[test]
    fn test_new_rejects_empty_grid() {
        let err = WindField::new(0, 3, vec![], vec![], bounds()).unwrap_err();
        assert!(matches!(err, FieldError::EmptyGrid { width: 0, height: 3 }));
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let err = WindField::new(2, 2, vec![0.0; 4], vec![0.0; 3], bounds()).unwrap_err();
        match err {
            FieldError::ComponentLength {
                component,
                expected,
                actual,
            } => {
                assert_eq!(component, "v");
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_axis_range_degenerate() {
        assert!(AxisRange::new(1.0, 1.0).is_degenerate());
        assert!(AxisRange::new(2.0, 1.0).is_degenerate());
        assert!(AxisRange::new(f32::NAN, 1.0).is_degenerate());
        assert!(AxisRange::new(0.0, f32::INFINITY).is_degenerate());
        assert_eq!(AxisRange::new(-2.0, 3.0).span(), Some(5.0));
    }

    #[test]
    fn test_from_components_ignores_non_finite() {
        let field = WindField::from_components(
            3,
            1,
            vec![-4.0, f32::NAN, 6.0],
            vec![1.0, 2.0, f32::INFINITY],
        )
        .unwrap();
        assert_eq!(field.bounds().u, AxisRange::new(-4.0, 6.0));
        assert_eq!(field.bounds().v, AxisRange::new(1.0, 2.0));
    }

    #[test]
    fn test_from_components_all_nan_gives_degenerate_range() {
        let field = WindField::from_components(1, 1, vec![f32::NAN], vec![f32::NAN]).unwrap();
        assert!(field.bounds().u.is_degenerate());
    }

    #[test]
    fn test_parse_exporter_json() {
        let json = r#"{"width":2,"height":1,"u":[1.0,-1.0],"v":[0.5,0.25],
            "uMin":-1.0,"uMax":1.0,"vMin":0.0,"vMax":1.0,
            "lon0":13.0,"lon1":13.25,"lat0":52.0,"lat1":52.5,"grid":0.25}"#;
        let field = WindField::from_json_str(json).unwrap();
        assert_eq!(field.width(), 2);
        assert_eq!(field.height(), 1);
        assert_eq!(field.u(), &[1.0, -1.0]);
        assert_eq!(field.bounds().v, AxisRange::new(0.0, 1.0));
        let extent = field.extent().unwrap();
        assert_eq!(extent.lat1, 52.5);
        assert_eq!(extent.grid, Some(0.25));
    }

    #[test]
    fn test_parse_json_without_extent() {
        let json = r#"{"width":1,"height":1,"u":[0.0],"v":[0.0],
            "uMin":0.0,"uMax":1.0,"vMin":0.0,"vMax":1.0}"#;
        let field = WindField::from_json_str(json).unwrap();
        assert!(field.extent().is_none());
    }

    #[test]
    fn test_parse_json_validates_lengths() {
        let json = r#"{"width":2,"height":2,"u":[0.0],"v":[0.0],
            "uMin":0.0,"uMax":1.0,"vMin":0.0,"vMax":1.0}"#;
        assert!(matches!(
            WindField::from_json_str(json),
            Err(FieldError::Json(_))
        ));
    }

    #[test]
    fn test_json_keeps_exporter_field_names() {
        let field = WindField::new(1, 1, vec![0.5], vec![0.25], bounds()).unwrap();
        let json = field.to_json_string().unwrap();
        assert!(json.contains("\"uMin\""));
        assert!(json.contains("\"vMax\""));
        assert!(!json.contains("lon0"));
        assert_eq!(WindField::from_json_str(&json).unwrap(), field);
    }

    #[test]
    fn test_flipped_rows() {
        let field = WindField::new(2, 2, vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0], bounds())
            .unwrap()
            .with_extent(GeoExtent {
                lon0: 0.0,
                lon1: 1.0,
                lat0: 60.0,
                lat1: 50.0,
                grid: None,
            })
            .flipped_rows();
        assert_eq!(field.u(), &[3.0, 4.0, 1.0, 2.0]);
        assert_eq!(field.v(), &[7.0, 8.0, 5.0, 6.0]);
        assert_eq!(field.extent().unwrap().lat0, 50.0);
    }

    #[test]
    fn test_sample_bounds() {
        let field = WindField::new(2, 1, vec![1.0, 2.0], vec![3.0, 4.0], bounds()).unwrap();
        assert_eq!(field.sample(1, 0), Some((2.0, 4.0)));
        assert_eq!(field.sample(2, 0), None);
    }

    #[test]
    fn test_prevailing_bands() {
        let field = WindField::prevailing(36, 18).unwrap();
        assert_eq!(field.len(), 36 * 18);
        assert!(!field.bounds().u.is_degenerate());
        assert!(!field.bounds().v.is_degenerate());

        // Mean zonal wind: westerlies at 45°N, easterlies at 15°N.
        let row_mean = |row: u32| -> f32 {
            (0..36).map(|x| field.sample(x, row).unwrap().0).sum::<f32>() / 36.0
        };
        assert!(row_mean(13) > 0.0);
        assert!(row_mean(10) < 0.0);
    }
}
