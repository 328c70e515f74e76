//! Primitive transforms and the per-tick update policies that drive them.

use std::time::Duration;

use cgmath::{InnerSpace, Matrix4, Rad, SquareMatrix, Vector3, Zero};

use crate::error::Error;

/// Rotation, scale and translation of a primitive, kept as separate matrices.
///
/// The composed model matrix is always `rotation * scale * translation`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub rotation: Matrix4<f32>,
    pub scale: Matrix4<f32>,
    pub translation: Matrix4<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// No move, rotate or scale.
    pub fn identity() -> Self {
        Self {
            rotation: Matrix4::identity(),
            scale: Matrix4::identity(),
            translation: Matrix4::identity(),
        }
    }

    pub fn model(&self) -> Matrix4<f32> {
        self.rotation * self.scale * self.translation
    }

    /// Rotate by `angle` around `axis` on top of the current rotation.
    pub fn rotated(self, axis: Vector3<f32>, angle: Rad<f32>) -> Self {
        if axis.is_zero() {
            return self;
        }
        Self {
            rotation: Matrix4::from_axis_angle(axis.normalize(), angle) * self.rotation,
            ..self
        }
    }

    pub fn translated(self, delta: Vector3<f32>) -> Self {
        Self {
            translation: Matrix4::from_translation(delta) * self.translation,
            ..self
        }
    }

    pub fn scaled(self, factor: Vector3<f32>) -> Self {
        Self {
            scale: Matrix4::from_nonuniform_scale(factor.x, factor.y, factor.z) * self.scale,
            ..self
        }
    }
}

/// How a primitive's transform evolves from one tick to the next.
///
/// Every policy is a pure function of the previous transform and the tick
/// length, so replaying the same ticks yields the same transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UpdatePolicy {
    Static,
    /// Rotate around `axis` at `speed` per second.
    Spinning { axis: Vector3<f32>, speed: Rad<f32> },
    /// Translate by `velocity` units per second.
    Drifting { velocity: Vector3<f32> },
    /// Grow (or shrink, below 1.0) uniformly by `rate` per second.
    Pulsing { rate: PulseRate },
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        Self::Static
    }
}

/// Per-second scale factor of [`UpdatePolicy::Pulsing`]. Always finite and
/// greater than zero, so the scale matrix stays invertible.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PulseRate(f32);

impl PulseRate {
    pub fn new(rate: f32) -> Result<Self, Error> {
        if rate.is_finite() && rate > 0.0 {
            Ok(Self(rate))
        } else {
            Err(Error::InvalidPolicy(format!(
                "pulse rate must be finite and positive, got {}",
                rate
            )))
        }
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl UpdatePolicy {
    pub fn spinning(axis: Vector3<f32>, speed: impl Into<Rad<f32>>) -> Self {
        Self::Spinning {
            axis,
            speed: speed.into(),
        }
    }

    pub fn drifting(velocity: Vector3<f32>) -> Self {
        Self::Drifting { velocity }
    }

    pub fn pulsing(rate: f32) -> Result<Self, Error> {
        Ok(Self::Pulsing {
            rate: PulseRate::new(rate)?,
        })
    }

    pub fn advance(&self, transform: Transform, dt: Duration) -> Transform {
        let secs = dt.as_secs_f32();
        match *self {
            UpdatePolicy::Static => transform,
            UpdatePolicy::Spinning { axis, speed } => transform.rotated(axis, speed * secs),
            UpdatePolicy::Drifting { velocity } => transform.translated(velocity * secs),
            UpdatePolicy::Pulsing { rate } => {
                let factor = rate.get().powf(secs);
                // a long enough tick overflows; hold the scale instead
                if !factor.is_finite() || factor == 0.0 {
                    return transform;
                }
                transform.scaled(Vector3::new(factor, factor, factor))
            }
        }
    }
}
