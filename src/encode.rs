//! Fixed-point wind textures.
//!
//! [`encode`] packs a [`WindField`] into an RGBA8 grid the GPU can sample
//! with hardware bilinear filtering:
//!
//! | channel | content |
//! |---------|---------|
//! | R | `u` normalized into the field's `u` range, `0..=255` |
//! | G | `v` normalized into the field's `v` range, `0..=255` |
//! | B | constant 128 (neutral, reserved) |
//! | A | constant 255 |
//!
//! Shaders recover a wind vector in roughly `[-1, 1]²` with
//! `(channel / 255 - 0.5) * 2`, see [`decode_channel`].

use std::path::Path;

use glam::{Vec2, Vec4};

use crate::error::TextureError;
use crate::field::{AxisRange, WindField};

/// Channel value written for degenerate ranges and non-finite samples.
///
/// It decodes to `1/255 * 2 ≈ 0.0039` rather than exactly zero, so a calm
/// texel still has strength `≈ 0.0055` and point size `≈ 1.828` instead of
/// the exact 1.8 of a zero wind vector.
pub const NEUTRAL_CHANNEL: u8 = 128;

/// Alpha written for every texel.
pub const OPAQUE_CHANNEL: u8 = 255;

/// An encoded wind texture. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTexture {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Encode a wind field, one texel per grid cell in row-major order.
///
/// Ratios are clamped to `[0, 1]` before scaling so out-of-range samples
/// saturate instead of wrapping. An axis whose range is degenerate encodes
/// every sample as [`NEUTRAL_CHANNEL`].
pub fn encode(field: &WindField) -> EncodedTexture {
    let bounds = field.bounds();
    for (axis, range) in [("u", bounds.u), ("v", bounds.v)] {
        if range.is_degenerate() {
            tracing::warn!(
                axis,
                min = range.min,
                max = range.max,
                "degenerate wind range, encoding axis as calm"
            );
        }
    }

    let mut data = Vec::with_capacity(field.len() * 4);
    for (&u, &v) in field.u().iter().zip(field.v()) {
        data.push(encode_component(u, bounds.u));
        data.push(encode_component(v, bounds.v));
        data.push(NEUTRAL_CHANNEL);
        data.push(OPAQUE_CHANNEL);
    }

    EncodedTexture {
        width: field.width(),
        height: field.height(),
        data,
    }
}

/// `floor(clamp01((value - min) / (max - min)) * 255)`.
pub fn encode_component(value: f32, range: AxisRange) -> u8 {
    if range.is_degenerate() || !value.is_finite() {
        return NEUTRAL_CHANNEL;
    }
    let min = range.min as f64;
    let span = range.max as f64 - min;
    let t = ((value as f64 - min) / span).clamp(0.0, 1.0);
    (t * 255.0).floor() as u8
}

/// Map a channel back to a wind component in `[-1, 1]`.
#[inline]
pub fn decode_channel(channel: u8) -> f32 {
    (channel as f32 / 255.0 - 0.5) * 2.0
}

impl EncodedTexture {
    /// Wrap raw RGBA data (4 bytes per texel).
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::Empty { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Take the pixels of an already-encoded image.
    pub fn from_image(img: image::RgbaImage) -> Result<Self, TextureError> {
        let (width, height) = img.dimensions();
        Self::from_rgba(img.into_raw(), width, height)
    }

    /// Load a previously saved encoded texture.
    pub fn load_png<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let img = image::open(path.as_ref())?.into_rgba8();
        Self::from_image(img)
    }

    /// Copy into an [`image::RgbaImage`].
    pub fn to_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(self.width, self.height, |x, y| image::Rgba(self.texel(x, y)))
    }

    /// Save as PNG so the encoding step can be skipped next time.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), TextureError> {
        self.to_image()
            .save_with_format(path.as_ref(), image::ImageFormat::Png)?;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// RGBA at `(x, y)`. Coordinates are clamped to the edge.
    pub fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let i = (y * self.width as usize + x) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Decoded wind vector stored at `(x, y)`.
    pub fn decode_texel(&self, x: u32, y: u32) -> Vec2 {
        let [r, g, _, _] = self.texel(x, y);
        Vec2::new(decode_channel(r), decode_channel(g))
    }

    /// Normalized RGBA at `uv` with bilinear filtering and clamp-to-edge
    /// addressing; texel centers sit at `(i + 0.5) / size`.
    pub fn sample_rgba(&self, uv: Vec2) -> Vec4 {
        let tx = uv.x * self.width as f32 - 0.5;
        let ty = uv.y * self.height as f32 - 0.5;
        let x0 = tx.floor();
        let y0 = ty.floor();
        let fx = tx - x0;
        let fy = ty - y0;

        let fetch = |x: f32, y: f32| -> Vec4 {
            let xi = (x as i64).clamp(0, self.width as i64 - 1) as u32;
            let yi = (y as i64).clamp(0, self.height as i64 - 1) as u32;
            let [r, g, b, a] = self.texel(xi, yi);
            Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0
        };

        let top = fetch(x0, y0).lerp(fetch(x0 + 1.0, y0), fx);
        let bottom = fetch(x0, y0 + 1.0).lerp(fetch(x0 + 1.0, y0 + 1.0), fx);
        top.lerp(bottom, fy)
    }

    /// Decoded wind vector at `uv`, filtered the same way the GPU sampler
    /// filters the texture.
    pub fn sample(&self, uv: Vec2) -> Vec2 {
        let rgba = self.sample_rgba(uv);
        (Vec2::new(rgba.x, rgba.y) - Vec2::splat(0.5)) * 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::WindBounds;

    fn field(u: Vec<f32>, v: Vec<f32>, u_range: (f32, f32), v_range: (f32, f32)) -> WindField {
        let width = u.len() as u32;
        WindField::new(
            width,
            1,
            u,
            v,
            WindBounds::new(
                AxisRange::new(u_range.0, u_range.1),
                AxisRange::new(v_range.0, v_range.1),
            ),
        )
        .unwrap()
    }

    #[test]
    fn test_encode_bounds_and_midpoint() {
        let tex = encode(&field(
            vec![0.0, 2.0, 1.0],
            vec![-5.0, 5.0, 0.0],
            (0.0, 2.0),
            (-5.0, 5.0),
        ));
        assert_eq!(tex.texel(0, 0), [0, 0, 128, 255]);
        assert_eq!(tex.texel(1, 0), [255, 255, 128, 255]);
        // 0.5 * 255 = 127.5, floored
        assert_eq!(tex.texel(2, 0), [127, 127, 128, 255]);
    }

    #[test]
    fn test_encode_clamps_out_of_range() {
        let tex = encode(&field(vec![-10.0, 10.0], vec![3.0, -3.0], (0.0, 1.0), (-1.0, 1.0)));
        assert_eq!(tex.texel(0, 0)[0], 0);
        assert_eq!(tex.texel(1, 0)[0], 255);
        assert_eq!(tex.texel(0, 0)[1], 255);
        assert_eq!(tex.texel(1, 0)[1], 0);
    }

    #[test]
    fn test_encode_degenerate_range_is_neutral() {
        let tex = encode(&field(vec![3.0, 4.0], vec![0.0, 1.0], (3.0, 3.0), (0.0, 1.0)));
        assert_eq!(tex.texel(0, 0)[0], NEUTRAL_CHANNEL);
        assert_eq!(tex.texel(1, 0)[0], NEUTRAL_CHANNEL);
        assert_eq!(tex.texel(1, 0)[1], 255);
    }

    #[test]
    fn test_encode_inverted_range_is_neutral() {
        let tex = encode(&field(vec![0.5], vec![0.5], (1.0, 0.0), (1.0, 0.0)));
        assert_eq!(tex.texel(0, 0), [128, 128, 128, 255]);
    }

    #[test]
    fn test_encode_non_finite_sample_is_neutral() {
        let tex = encode(&field(vec![f32::NAN], vec![f32::INFINITY], (0.0, 1.0), (0.0, 1.0)));
        assert_eq!(tex.texel(0, 0), [128, 128, 128, 255]);
    }

    #[test]
    fn test_round_trip_within_quantization() {
        let u: Vec<f32> = (0..64).map(|i| -7.0 + i as f32 * 0.37).collect();
        let v: Vec<f32> = (0..64).map(|i| 3.0 - i as f32 * 0.11).collect();
        let f = field(u.clone(), v.clone(), (-7.0, 16.31), (-3.93, 3.0));
        let tex = encode(&f);
        let bounds = f.bounds();

        for (x, (&u, &v)) in u.iter().zip(&v).enumerate() {
            let tu = (u - bounds.u.min) / (bounds.u.max - bounds.u.min);
            let tv = (v - bounds.v.min) / (bounds.v.max - bounds.v.min);
            let [r, g, _, _] = tex.texel(x as u32, 0);
            assert!((r as f32 / 255.0 - tu).abs() <= 1.0 / 255.0 + 1e-6);
            assert!((g as f32 / 255.0 - tv).abs() <= 1.0 / 255.0 + 1e-6);

            let decoded = tex.decode_texel(x as u32, 0);
            assert!((decoded.x - (tu - 0.5) * 2.0).abs() <= 2.0 / 255.0 + 1e-6);
            assert!((decoded.y - (tv - 0.5) * 2.0).abs() <= 2.0 / 255.0 + 1e-6);
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let f = WindField::prevailing(32, 16).unwrap();
        assert_eq!(encode(&f), encode(&f));
    }

    #[test]
    fn test_decode_channel_extremes() {
        assert_eq!(decode_channel(0), -1.0);
        assert_eq!(decode_channel(255), 1.0);
        assert!(decode_channel(128).abs() < 0.004);
    }

    #[test]
    fn test_from_rgba_validates() {
        assert!(matches!(
            EncodedTexture::from_rgba(vec![0; 7], 1, 2),
            Err(TextureError::SizeMismatch { expected: 8, actual: 7 })
        ));
        assert!(matches!(
            EncodedTexture::from_rgba(vec![], 0, 0),
            Err(TextureError::Empty { .. })
        ));
        assert!(EncodedTexture::from_rgba(vec![0; 8], 1, 2).is_ok());
    }

    #[test]
    fn test_sample_at_texel_center_matches_texel() {
        let tex = EncodedTexture::from_rgba(
            vec![0, 255, 128, 255, 255, 0, 128, 255],
            2,
            1,
        )
        .unwrap();
        let left = tex.sample(Vec2::new(0.25, 0.5));
        assert!((left - Vec2::new(-1.0, 1.0)).length() < 1e-5);
        let right = tex.sample(Vec2::new(0.75, 0.5));
        assert!((right - Vec2::new(1.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_sample_interpolates_between_centers() {
        let tex = EncodedTexture::from_rgba(
            vec![0, 0, 128, 255, 255, 255, 128, 255],
            2,
            1,
        )
        .unwrap();
        let mid = tex.sample(Vec2::new(0.5, 0.5));
        assert!(mid.length() < 1e-5);
    }

    #[test]
    fn test_sample_clamps_to_edge() {
        let tex = EncodedTexture::from_rgba(
            vec![0, 0, 128, 255, 255, 255, 128, 255],
            2,
            1,
        )
        .unwrap();
        let outside = tex.sample(Vec2::new(-0.5, 0.5));
        assert!((outside - Vec2::new(-1.0, -1.0)).length() < 1e-5);
        let edge = tex.sample(Vec2::new(0.99, 0.0));
        assert!((edge - Vec2::new(1.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_image_conversion_preserves_texels() {
        let tex = encode(&WindField::prevailing(8, 4).unwrap());
        let back = EncodedTexture::from_image(tex.to_image()).unwrap();
        assert_eq!(back, tex);
    }

    #[test]
    fn test_png_file_round_trip() {
        let tex = encode(&WindField::prevailing(12, 6).unwrap());
        let path = std::env::temp_dir()
            .join(format!("windshell-encode-{}.png", std::process::id()));

        tex.save_png(&path).unwrap();
        let loaded = EncodedTexture::load_png(&path);
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.unwrap(), tex);
    }

    #[test]
    fn test_load_png_missing_file_is_error() {
        let path = std::env::temp_dir().join("windshell-does-not-exist.png");
        assert!(matches!(
            EncodedTexture::load_png(&path),
            Err(TextureError::Image(_))
        ));
    }

    #[test]
    fn test_neutral_texel_decodes_to_small_positive_wind() {
        // 128 is one step above the exact midpoint of 127.5.
        let step = (128.0 / 255.0 - 0.5) * 2.0;
        assert!((decode_channel(NEUTRAL_CHANNEL) - step).abs() < 1e-7);
        assert!((step - 0.003_921_6).abs() < 1e-6);
    }
}
