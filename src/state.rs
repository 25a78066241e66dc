//! Per-frame animation state.
//!
//! The shell has exactly two moving scalars: elapsed time and rotation. Both
//! advance by a fixed step once per drawn frame, never by wall-clock time, so
//! a frame sequence is fully reproducible.

use std::f64::consts::TAU;

/// Elapsed time, rotation angle and drawn-frame count.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderState {
    /// Accumulated in `f64` so long sessions do not lose step precision.
    elapsed: f64,
    rotation: f64,
    frame_count: u64,
}

impl RenderState {
    /// State before the first frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one frame.
    pub fn advance(&mut self, time_step: f32, rotation_step: f32) {
        self.elapsed += time_step as f64;
        self.rotation += rotation_step as f64;
        self.frame_count += 1;
    }

    /// Total elapsed animation time.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Monotonic accumulated rotation in radians.
    #[inline]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Rotation wrapped into `[0, 2π)`, the value handed to shaders.
    #[inline]
    pub fn shader_rotation(&self) -> f32 {
        self.rotation.rem_euclid(TAU) as f32
    }

    /// Number of frames drawn so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_zero() {
        let state = RenderState::new();
        assert_eq!(state.elapsed(), 0.0);
        assert_eq!(state.rotation(), 0.0);
        assert_eq!(state.frame(), 0);
    }

    #[test]
    fn test_advance_accumulates_steps() {
        let mut state = RenderState::new();
        for _ in 0..100 {
            state.advance(0.01, 0.002);
        }
        assert_eq!(state.frame(), 100);
        assert!((state.elapsed() - 1.0).abs() < 1e-6);
        assert!((state.rotation() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_shader_rotation_wraps() {
        let mut state = RenderState::new();
        state.advance(0.0, 7.0);
        assert!(state.rotation() > TAU);
        let wrapped = state.shader_rotation();
        assert!((0.0..std::f32::consts::TAU).contains(&wrapped));
        assert!((wrapped - (7.0 - std::f32::consts::TAU)).abs() < 1e-5);
    }
}
