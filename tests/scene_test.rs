use std::time::Duration;

use prim_ngin::{
    Error, HostConfig, Primitive, Scene, Shape,
    error::LoadState,
    gpu::Topology,
    render::Command,
};
use winit::{
    event::ElementState,
    keyboard::{KeyCode, PhysicalKey},
};

use crate::common::test_utils::RecordingBackend;

mod common;

fn scene() -> Scene {
    Scene::new(vec![
        Primitive::new(Shape::Quad).unwrap(),
        Primitive::new(Shape::Cube).unwrap(),
        Primitive::new(Shape::Triangle).unwrap(),
    ])
}

#[test]
fn frame_draws_every_primitive_in_order() {
    let mut gpu = RecordingBackend::new();
    let mut scene = scene();
    scene.load(&mut gpu).unwrap();

    let frame = scene.frame(Duration::from_millis(16)).unwrap();

    let draws: Vec<_> = frame.draw_calls().cloned().collect();
    assert_eq!(
        draws,
        vec![
            Command::DrawIndexed {
                topology: Topology::TriangleFan,
                count: 6
            },
            Command::Draw {
                topology: Topology::TriangleList,
                count: 36
            },
            Command::DrawIndexed {
                topology: Topology::TriangleFan,
                count: 3
            },
        ]
    );
}

#[test]
fn load_runs_once_per_primitive() {
    let mut gpu = RecordingBackend::new();
    let mut scene = scene();

    scene.load(&mut gpu).unwrap();
    let programs = gpu.programs_linked;
    scene.load(&mut gpu).unwrap();

    assert_eq!(programs, 3);
    assert_eq!(gpu.programs_linked, 3);
    assert!(scene.primitives().iter().all(|p| p.state() == LoadState::Loaded));
}

#[test]
fn frame_before_load_is_misuse() {
    let mut scene = scene();
    assert!(matches!(
        scene.frame(Duration::ZERO),
        Err(Error::ResourceMisuse { .. })
    ));
}

#[test]
fn failed_texture_aborts_the_scene_load() {
    let mut gpu = RecordingBackend::new();
    let mut scene = Scene::new(vec![
        Primitive::new(Shape::Triangle).unwrap(),
        Primitive::new(Shape::Quad).unwrap().with_texture("missing.png"),
        Primitive::new(Shape::Cube).unwrap(),
    ]);

    assert!(matches!(scene.load(&mut gpu), Err(Error::Decode { .. })));

    let states: Vec<_> = scene.primitives().iter().map(|p| p.state()).collect();
    assert_eq!(states, vec![LoadState::Loaded, LoadState::Unloaded, LoadState::Unloaded]);

    scene.dispose(&mut gpu);
    assert_eq!(gpu.live(), 0);
}

#[test]
fn dispose_releases_the_whole_scene() {
    let mut gpu = RecordingBackend::new();
    let mut scene = scene();
    scene.load(&mut gpu).unwrap();

    scene.dispose(&mut gpu);
    scene.dispose(&mut gpu);

    assert_eq!(gpu.live(), 0);
    assert!(scene.primitives().iter().all(|p| p.state() == LoadState::Disposed));
}

#[test]
fn default_host_config() {
    let config = HostConfig::default();
    assert_eq!(config.title, "prim-ngin");
    assert_eq!((config.width, config.height), (800, 600));
    assert_eq!(config.clear_colour, [0.2, 0.3, 0.3, 1.0]);
    assert_eq!(config.exit_key, KeyCode::Escape);
}

#[test]
fn exit_key_only_on_press() {
    let config = HostConfig::default().with_exit_key(KeyCode::KeyQ);

    assert!(config.is_exit_key(PhysicalKey::Code(KeyCode::KeyQ), ElementState::Pressed));
    assert!(!config.is_exit_key(PhysicalKey::Code(KeyCode::KeyQ), ElementState::Released));
    assert!(!config.is_exit_key(PhysicalKey::Code(KeyCode::Escape), ElementState::Pressed));
}

#[test]
fn host_config_setters() {
    let config = HostConfig::default()
        .with_title("demo")
        .with_size(320, 240)
        .with_clear_colour([0.0, 0.0, 0.0, 1.0]);

    assert_eq!(config.title, "demo");
    assert_eq!((config.width, config.height), (320, 240));
    assert_eq!(config.clear_colour, [0.0, 0.0, 0.0, 1.0]);
}
