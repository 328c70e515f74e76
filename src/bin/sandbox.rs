use cgmath::{Deg, Vector3};
use prim_ngin::{
    HostConfig, Primitive, Shape, Transform, UpdatePolicy, resources::asset_path,
};

fn main() -> anyhow::Result<()> {
    let quad = Primitive::new(Shape::Quad)?
        .with_texture(asset_path("checker.png"))
        .with_transform(Transform::identity().translated(Vector3::new(-0.5, 0.4, 0.0)))
        .with_policy(UpdatePolicy::spinning(Vector3::unit_z(), Deg(45.0)));

    let cube = Primitive::new(Shape::Cube)?
        .with_texture(asset_path("checker.png"))
        .with_transform(
            Transform::identity()
                .scaled(Vector3::new(0.4, 0.4, 0.4))
                .translated(Vector3::new(0.5, 0.4, 0.0)),
        )
        .with_policy(UpdatePolicy::spinning(Vector3::new(1.0, 1.0, 0.0), Deg(60.0)));

    let triangle = Primitive::new(Shape::Triangle)?
        .with_transform(Transform::identity().translated(Vector3::new(-0.5, -0.5, 0.0)));

    let pyramid = Primitive::new(Shape::Pyramid)?
        .with_label("spinning pyramid")
        .with_transform(
            Transform::identity()
                .scaled(Vector3::new(0.5, 0.5, 0.5))
                .translated(Vector3::new(1.0, -1.0, 0.0)),
        )
        .with_policy(UpdatePolicy::spinning(Vector3::unit_y(), Deg(90.0)));

    prim_ngin::run(HostConfig::default(), vec![quad, cube, triangle, pyramid])
}
