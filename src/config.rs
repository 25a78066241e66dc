//! Renderer configuration.
//!
//! Every constant of the shell model is a named field. Defaults reproduce the
//! classic look: 35 000 particles on a shell of radius 1.08, nudged by up to
//! 0.02 units of wind, sized 1.8 px plus 5 px per unit of wind strength.
//!
//! ```ignore
//! let config = RendererConfig::default()
//!     .with_particle_count(50_000)
//!     .with_seed(7)
//!     .with_rotation_step(0.004);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::particles::DEFAULT_PARTICLE_COUNT;

/// When the particle buffer is sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleUpload {
    /// Upload after generation or reset only.
    #[default]
    OnChange,
    /// Upload before every draw.
    EveryFrame,
}

/// Colors and opacity of the point sprites.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Color at zero wind strength.
    pub calm: [f32; 3],
    /// Color at unit wind strength.
    pub strong: [f32; 3],
    /// Opacity at the center of a point.
    pub max_alpha: f32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            calm: [0.15, 0.55, 1.0],
            strong: [0.9, 0.95, 1.0],
            max_alpha: 0.9,
        }
    }
}

/// Configuration for [`WindRenderer`](crate::WindRenderer) and the shaders it
/// generates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Number of particles generated at startup and on reset.
    pub particle_count: u32,
    /// Seed for particle generation; `None` uses OS entropy.
    pub seed: Option<u64>,
    /// Radius of the air shell.
    pub shell_radius: f32,
    /// Screen-plane displacement per unit of decoded wind.
    pub displacement_scale: f32,
    /// Point size in pixels at zero wind.
    pub point_size_base: f32,
    /// Extra pixels per unit of wind strength.
    pub point_size_gain: f32,
    /// Constant term of the pseudo-perspective divisor.
    pub perspective_base: f32,
    /// Depth term of the pseudo-perspective divisor.
    pub perspective_depth: f32,
    /// Elapsed time added per drawn frame.
    pub time_step: f32,
    /// Rotation in radians added per drawn frame.
    pub rotation_step: f32,
    pub palette: Palette,
    /// Clear color of each frame, RGBA.
    pub clear_color: [f32; 4],
    pub particle_upload: ParticleUpload,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            seed: None,
            shell_radius: 1.08,
            displacement_scale: 0.02,
            point_size_base: 1.8,
            point_size_gain: 5.0,
            perspective_base: 1.5,
            perspective_depth: 0.5,
            time_step: 0.01,
            rotation_step: 0.002,
            palette: Palette::default(),
            clear_color: [0.0, 0.0, 0.0, 0.0],
            particle_upload: ParticleUpload::OnChange,
        }
    }
}

impl RendererConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.particle_count = count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_shell_radius(mut self, radius: f32) -> Self {
        self.shell_radius = radius;
        self
    }

    pub fn with_displacement_scale(mut self, scale: f32) -> Self {
        self.displacement_scale = scale;
        self
    }

    /// Set the point size ramp: `base + strength * gain` pixels.
    pub fn with_point_size(mut self, base: f32, gain: f32) -> Self {
        self.point_size_base = base;
        self.point_size_gain = gain;
        self
    }

    pub fn with_time_step(mut self, step: f32) -> Self {
        self.time_step = step;
        self
    }

    pub fn with_rotation_step(mut self, step: f32) -> Self {
        self.rotation_step = step;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_particle_upload(mut self, upload: ParticleUpload) -> Self {
        self.particle_upload = upload;
        self
    }

    /// Check that every value can be baked into a shader and that the
    /// perspective divisor stays positive across the shell.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scalars = [
            ("shell_radius", self.shell_radius),
            ("displacement_scale", self.displacement_scale),
            ("point_size_base", self.point_size_base),
            ("point_size_gain", self.point_size_gain),
            ("perspective_base", self.perspective_base),
            ("perspective_depth", self.perspective_depth),
            ("time_step", self.time_step),
            ("rotation_step", self.rotation_step),
            ("palette.max_alpha", self.palette.max_alpha),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name });
            }
        }
        let mut colors = self
            .palette
            .calm
            .iter()
            .chain(&self.palette.strong)
            .chain(&self.clear_color);
        if colors.any(|c| !c.is_finite()) {
            return Err(ConfigError::NonFinite { name: "palette" });
        }

        for (name, value) in [
            ("shell_radius", self.shell_radius),
            ("point_size_base", self.point_size_base),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }

        for (name, value) in [
            ("time_step", self.time_step),
            ("rotation_step", self.rotation_step),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { name, value });
            }
        }

        let divisor_floor =
            self.perspective_base - self.shell_radius * self.perspective_depth.abs();
        if divisor_floor <= 0.0 {
            return Err(ConfigError::SingularPerspective {
                radius: self.shell_radius,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RendererConfig::default();
        assert_eq!(config.particle_count, 35_000);
        assert_eq!(config.shell_radius, 1.08);
        assert_eq!(config.displacement_scale, 0.02);
        assert_eq!(config.point_size_base, 1.8);
        assert_eq!(config.point_size_gain, 5.0);
        assert_eq!(config.particle_upload, ParticleUpload::OnChange);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = RendererConfig::default()
            .with_particle_count(10)
            .with_seed(3)
            .with_point_size(2.0, 4.0)
            .with_rotation_step(0.01);
        assert_eq!(config.particle_count, 10);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.point_size_base, 2.0);
        assert_eq!(config.point_size_gain, 4.0);
        assert_eq!(config.rotation_step, 0.01);
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let config = RendererConfig::from_json_str(
            r#"{"particle_count": 1000, "particle_upload": "every_frame", "palette": {"max_alpha": 0.5}}"#,
        )
        .unwrap();
        assert_eq!(config.particle_count, 1000);
        assert_eq!(config.particle_upload, ParticleUpload::EveryFrame);
        assert_eq!(config.palette.max_alpha, 0.5);
        assert_eq!(config.palette.calm, [0.15, 0.55, 1.0]);
        assert_eq!(config.shell_radius, 1.08);
    }

    #[test]
    fn test_validate_rejects_negative_steps() {
        let config = RendererConfig::default().with_time_step(-0.01);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative {
                name: "time_step",
                ..
            })
        ));

        let config = RendererConfig::default().with_rotation_step(-0.002);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative {
                name: "rotation_step",
                ..
            })
        ));

        let paused = RendererConfig::default()
            .with_time_step(0.0)
            .with_rotation_step(0.0);
        assert!(paused.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let config = RendererConfig::default().with_displacement_scale(f32::NAN);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite {
                name: "displacement_scale"
            })
        ));
    }

    #[test]
    fn test_validate_rejects_non_positive_radius() {
        let config = RendererConfig::default().with_shell_radius(0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                name: "shell_radius",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_singular_perspective() {
        let config = RendererConfig::default().with_shell_radius(3.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SingularPerspective { .. })
        ));
    }

    #[test]
    fn test_json_rejects_invalid_values() {
        assert!(RendererConfig::from_json_str(r#"{"shell_radius": -1.0}"#).is_err());
        assert!(matches!(
            RendererConfig::from_json_str("{not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
