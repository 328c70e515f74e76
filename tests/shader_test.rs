use prim_ngin::{
    Error,
    data_structures::shader::ShaderProgram,
    gpu::{GpuResource, ShaderStage, Topology},
    pipelines::{
        ShaderSources,
        primitive::PipelineKey,
        shader::{FRAGMENT_ENTRY, ShaderInputs, VERTEX_ENTRY, check_entry_point, compile_wgsl},
    },
    render::{Command, Frame},
};

use crate::common::test_utils::RecordingBackend;

mod common;

#[test]
fn embedded_shaders_compile_and_have_entry_points() {
    for sources in [ShaderSources::FLAT, ShaderSources::TEXTURED] {
        let vertex = compile_wgsl(&sources.vertex).unwrap();
        let fragment = compile_wgsl(&sources.fragment).unwrap();

        check_entry_point(&vertex, ShaderStage::Vertex).unwrap();
        check_entry_point(&fragment, ShaderStage::Fragment).unwrap();
    }
}

#[test]
fn stage_swap_is_caught() {
    let vertex = compile_wgsl(&ShaderSources::FLAT.vertex).unwrap();

    let err = check_entry_point(&vertex, ShaderStage::Fragment).unwrap_err();

    assert!(err.contains(FRAGMENT_ENTRY));
}

#[test]
fn broken_wgsl_yields_a_diagnostic() {
    let err = compile_wgsl("@vertex fn vs_main( -> @builtin(position) vec4<f32> {}").unwrap_err();
    assert!(!err.is_empty());
}

#[test]
fn invalid_but_parseable_wgsl_is_rejected() {
    // parses, but returns the wrong type
    let source = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return 1.0; }";
    assert!(compile_wgsl(source).is_err());
}

#[test]
fn renamed_entry_point_is_missing() {
    let module = compile_wgsl(
        "@vertex fn main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }",
    )
    .unwrap();

    let err = check_entry_point(&module, ShaderStage::Vertex).unwrap_err();

    assert!(err.contains(VERTEX_ENTRY));
}

#[test]
fn compile_releases_stages_after_linking() {
    let mut gpu = RecordingBackend::new();

    let program = ShaderProgram::compile(&mut gpu, ShaderSources::FLAT).unwrap();

    assert!(program.id().is_some());
    assert_eq!(gpu.live_stages(), 0);
    assert_eq!(gpu.live(), 1);
    assert_eq!(program.sources(), &ShaderSources::FLAT);
}

#[test]
fn vertex_compile_failure_reports_the_stage() {
    let mut gpu = RecordingBackend::failing_compile(ShaderStage::Vertex, "0:1 unexpected token");

    let result = ShaderProgram::compile(&mut gpu, ShaderSources::FLAT);

    assert_eq!(
        result.unwrap_err(),
        Error::Compile {
            stage: ShaderStage::Vertex,
            log: "0:1 unexpected token".to_string()
        }
    );
    assert_eq!(gpu.live(), 0);
}

#[test]
fn link_failure_releases_both_stages() {
    let mut gpu = RecordingBackend::failing_link("no matching output");

    let result = ShaderProgram::compile(&mut gpu, ShaderSources::TEXTURED);

    assert_eq!(
        result.unwrap_err(),
        Error::Link {
            log: "no matching output".to_string()
        }
    );
    assert_eq!(gpu.live(), 0);
    assert_eq!(gpu.released().len(), 2);
}

#[test]
fn released_program_records_nothing() {
    let mut gpu = RecordingBackend::new();
    let mut program = ShaderProgram::compile(&mut gpu, ShaderSources::FLAT).unwrap();
    let id = program.id().unwrap();
    let mut frame = Frame::new();
    program.use_program(&mut frame);
    assert_eq!(frame.commands(), &[Command::UseProgram(id)]);

    program.dispose(&mut gpu);
    program.dispose(&mut gpu);
    frame.clear();
    program.use_program(&mut frame);
    program.set_transform(&mut frame, [[0.0; 4]; 4]);

    assert!(program.is_released());
    assert!(frame.is_empty());
    assert_eq!(gpu.times_released(id.0), 1);
}

#[test]
fn flat_shader_needs_only_positions() {
    let inputs = ShaderInputs::of_sources(&ShaderSources::FLAT).unwrap();
    assert_eq!(inputs, ShaderInputs::default());
}

#[test]
fn textured_shader_needs_tex_coords_and_a_texture() {
    let inputs = ShaderInputs::of_sources(&ShaderSources::TEXTURED).unwrap();
    assert_eq!(
        inputs,
        ShaderInputs {
            tex_coords: true,
            texture: true,
        }
    );
}

#[test]
fn vertex_input_without_an_attribute_is_rejected() {
    let vertex = "@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(2) normal: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position + normal, 1.0);
}";
    let sources = ShaderSources::new(vertex, ShaderSources::FLAT.fragment.clone());

    let err = ShaderInputs::of_sources(&sources).unwrap_err();

    assert!(err.contains("location 2"), "{}", err);
}

#[test]
fn pipeline_must_feed_every_shader_input() {
    let textured = ShaderInputs {
        tex_coords: true,
        texture: true,
    };
    let key = |tex_coords, textured| PipelineKey {
        topology: Topology::TriangleFan,
        tex_coords,
        textured,
    };

    assert!(textured.satisfied_by(key(true, true)));
    assert!(!textured.satisfied_by(key(true, false)));
    assert!(!textured.satisfied_by(key(false, true)));
    assert!(ShaderInputs::default().satisfied_by(key(false, false)));
    // unused inputs are fine
    assert!(ShaderInputs::default().satisfied_by(key(true, true)));
}
