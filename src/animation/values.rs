use glam::{Quat, Vec3};

/// A value that can be blended between two keyframes.
pub trait Interpolatable: Copy + Sized {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self;

    /// Value to fall back to when a channel is absent.
    fn identity() -> Self;
}

impl Interpolatable for f32 {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start + (end - start) * t
    }

    fn identity() -> Self {
        0.0
    }
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start.lerp(*end, t)
    }

    fn identity() -> Self {
        Vec3::ZERO
    }
}

impl Interpolatable for Quat {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        slerp_shortest(*start, *end, t)
    }

    fn identity() -> Self {
        Quat::IDENTITY
    }
}

/// Spherical interpolation along the shorter great-circle arc.
///
/// `q` and `-q` encode the same rotation; flipping `end` when the dot product
/// is negative keeps the blend from sweeping the long way round.
#[must_use]
pub fn slerp_shortest(start: Quat, end: Quat, t: f32) -> Quat {
    if t <= 0.0 {
        return start;
    }
    if t >= 1.0 {
        return end;
    }

    let end = if start.dot(end) < 0.0 { -end } else { end };

    let dot = start.dot(end).min(1.0);
    if dot > 0.9995 {
        // Nearly parallel: nlerp avoids dividing by sin(~0).
        return Quat::from_vec4(glam::Vec4::from(start).lerp(glam::Vec4::from(end), t)).normalize();
    }

    let theta = dot.acos();
    let sin_theta = theta.sin();
    let s0 = ((1.0 - t) * theta).sin() / sin_theta;
    let s1 = (t * theta).sin() / sin_theta;
    Quat::from_vec4(glam::Vec4::from(start) * s0 + glam::Vec4::from(end) * s1).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn slerp_endpoints_are_exact() {
        let a = Quat::from_rotation_z(0.3);
        let b = Quat::from_rotation_z(1.1);
        assert_eq!(slerp_shortest(a, b, 0.0), a);
        assert_eq!(slerp_shortest(a, b, 1.0), b);
    }

    #[test]
    fn slerp_takes_short_arc_when_signs_differ() {
        let a = Quat::from_rotation_y(0.1);
        let b = -Quat::from_rotation_y(0.5);
        let mid = slerp_shortest(a, b, 0.5);
        let expected = Quat::from_rotation_y(0.3);
        assert!(mid.dot(expected).abs() > 1.0 - 1e-6);
    }

    #[test]
    fn slerp_half_turn_midpoint() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_x(PI * 0.5);
        let mid = slerp_shortest(a, b, 0.5);
        assert!(mid.dot(Quat::from_rotation_x(PI * 0.25)).abs() > 1.0 - 1e-6);
    }
}
