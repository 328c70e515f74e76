use std::time::Duration;

use cgmath::{Deg, Matrix4, Point3, Rad, SquareMatrix, Transform as _, Vector3};
use prim_ngin::{
    Error, Primitive, Shape, Transform, UpdatePolicy,
    data_structures::transform::PulseRate,
    render::{Command, Frame},
};

use crate::common::test_utils::RecordingBackend;

mod common;

fn assert_close(actual: Point3<f32>, expected: Point3<f32>) {
    let d = actual - expected;
    assert!(
        d.x.abs() < 1e-5 && d.y.abs() < 1e-5 && d.z.abs() < 1e-5,
        "{:?} != {:?}",
        actual,
        expected
    );
}

#[test]
fn identity_composes_to_identity() {
    assert_eq!(Transform::identity().model(), Matrix4::identity());
    assert_eq!(Transform::default(), Transform::identity());
}

#[test]
fn model_applies_translation_then_scale_then_rotation() {
    let transform = Transform::identity()
        .translated(Vector3::new(1.0, 0.0, 0.0))
        .scaled(Vector3::new(2.0, 2.0, 2.0))
        .rotated(Vector3::unit_z(), Deg(90.0).into());

    let moved = transform.model().transform_point(Point3::new(0.0, 0.0, 0.0));

    assert_close(moved, Point3::new(0.0, 2.0, 0.0));
}

#[test]
fn rotating_around_a_zero_axis_does_nothing() {
    let transform = Transform::identity().rotated(Vector3::new(0.0, 0.0, 0.0), Rad(1.0));
    assert_eq!(transform, Transform::identity());
}

#[test]
fn static_policy_keeps_the_transform() {
    let start = Transform::identity().translated(Vector3::new(0.3, 0.0, 0.0));
    let after = UpdatePolicy::Static.advance(start, Duration::from_secs(3));
    assert_eq!(after, start);
}

#[test]
fn spinning_rotates_by_speed_times_elapsed() {
    let policy = UpdatePolicy::spinning(Vector3::unit_z(), Deg(90.0));

    let after = policy.advance(Transform::identity(), Duration::from_millis(500));
    let p = after.model().transform_point(Point3::new(1.0, 0.0, 0.0));

    let half = std::f32::consts::FRAC_1_SQRT_2;
    assert_close(p, Point3::new(half, half, 0.0));
}

#[test]
fn drifting_translates_by_velocity_times_elapsed() {
    let policy = UpdatePolicy::drifting(Vector3::new(0.0, -1.0, 0.5));

    let after = policy.advance(Transform::identity(), Duration::from_secs(2));
    let p = after.model().transform_point(Point3::new(0.0, 0.0, 0.0));

    assert_close(p, Point3::new(0.0, -2.0, 1.0));
}

#[test]
fn pulsing_scales_by_rate_per_second() {
    let policy = UpdatePolicy::pulsing(2.0).unwrap();

    let after = policy.advance(Transform::identity(), Duration::from_secs(1));
    let p = after.model().transform_point(Point3::new(1.0, 1.0, 1.0));

    assert_close(p, Point3::new(2.0, 2.0, 2.0));
}

#[test]
fn updates_are_deterministic() {
    let policy = UpdatePolicy::spinning(Vector3::new(1.0, 1.0, 0.0), Deg(33.0));
    let mut gpu = RecordingBackend::new();
    let mut a = Primitive::new(Shape::Cube).unwrap().with_policy(policy);
    let mut b = Primitive::new(Shape::Cube).unwrap().with_policy(policy);
    a.load(&mut gpu).unwrap();
    b.load(&mut gpu).unwrap();

    for ms in [16, 17, 33, 8] {
        a.update(Duration::from_millis(ms)).unwrap();
        b.update(Duration::from_millis(ms)).unwrap();
    }

    assert_eq!(a.model(), b.model());
    assert_eq!(a.transform(), b.transform());
}

#[test]
fn load_starts_from_the_configured_transform() {
    let start = Transform::identity().translated(Vector3::new(0.5, 0.5, 0.0));
    let mut gpu = RecordingBackend::new();
    let mut quad = Primitive::new(Shape::Quad)
        .unwrap()
        .with_transform(start)
        .with_policy(UpdatePolicy::drifting(Vector3::unit_x()));
    quad.load(&mut gpu).unwrap();
    quad.update(Duration::from_secs(1)).unwrap();

    quad.load(&mut gpu).unwrap();

    assert_eq!(*quad.transform(), start);
    assert_eq!(quad.model(), start.model());
}

#[test]
fn update_recomposes_the_model_matrix() {
    let mut gpu = RecordingBackend::new();
    let mut quad = Primitive::new(Shape::Quad)
        .unwrap()
        .with_policy(UpdatePolicy::pulsing(1.5).unwrap());
    quad.load(&mut gpu).unwrap();

    quad.update(Duration::from_millis(250)).unwrap();

    let t = quad.transform();
    assert_eq!(quad.model(), t.rotation * t.scale * t.translation);
    assert_ne!(quad.model(), Matrix4::identity());
}

#[test]
fn pulse_rate_must_be_finite_and_positive() {
    for rate in [-2.0, 0.0, -0.0, f32::NAN, f32::INFINITY] {
        assert!(
            matches!(UpdatePolicy::pulsing(rate), Err(Error::InvalidPolicy(_))),
            "rate {} accepted",
            rate
        );
        assert!(PulseRate::new(rate).is_err());
    }
    assert_eq!(PulseRate::new(0.5).unwrap().get(), 0.5);
}

#[test]
fn pulsing_keeps_the_model_invertible() {
    let policy = UpdatePolicy::pulsing(0.5).unwrap();
    let mut transform = Transform::identity();

    for _ in 0..4 {
        transform = policy.advance(transform, Duration::from_millis(500));
    }

    let model = transform.model();
    assert!(model.determinant() > 0.0);
    assert!(model.invert().is_some());
}

#[test]
fn overflowing_pulse_holds_the_scale() {
    let policy = UpdatePolicy::pulsing(1e30).unwrap();
    let start = Transform::identity().scaled(Vector3::new(2.0, 2.0, 2.0));

    let after = policy.advance(start, Duration::from_secs(10));

    assert_eq!(after, start);
}

#[test]
fn identity_quad_keeps_its_coordinates() {
    let mut gpu = RecordingBackend::new();
    let mut quad = Primitive::new(Shape::Quad).unwrap();
    quad.load(&mut gpu).unwrap();
    let mut frame = Frame::new();

    quad.draw(&mut frame, Duration::from_millis(16)).unwrap();

    let matrix = frame
        .commands()
        .iter()
        .find_map(|c| match c {
            Command::SetTransform { matrix, .. } => Some(Matrix4::from(*matrix)),
            _ => None,
        })
        .expect("draw uploads a transform");
    for &[x, y, z] in quad.mesh().positions() {
        let p = Point3::new(x, y, z);
        assert_close(matrix.transform_point(p), p);
    }
}
