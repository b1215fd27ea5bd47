//! WGSL sources for the three scene programs.
//!
//! Vertex and fragment stages are kept as separate modules so each one is
//! compiled on its own before the pair is linked.

pub const ENTRY_VERTEX: &str = "vs_main";
pub const ENTRY_FRAGMENT: &str = "fs_main";

pub const LIT_VERTEX: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    object_color: vec3<f32>,
    light_color: vec3<f32>,
    light_pos: vec3<f32>,
    view_position: vec3<f32>,
    uv_scale: vec2<f32>,
}

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) frag_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

fn inverse_mat3(m: mat3x3<f32>) -> mat3x3<f32> {
    let r0 = cross(m[1], m[2]);
    let r1 = cross(m[2], m[0]);
    let r2 = cross(m[0], m[1]);
    let det = dot(m[0], r0);
    return transpose(mat3x3<f32>(r0, r1, r2)) * (1.0 / det);
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    let world = uniforms.model * vec4<f32>(input.position, 1.0);
    let model3 = mat3x3<f32>(
        uniforms.model[0].xyz,
        uniforms.model[1].xyz,
        uniforms.model[2].xyz,
    );
    output.frag_pos = world.xyz;
    output.normal = transpose(inverse_mat3(model3)) * input.normal;
    output.uv = input.uv;
    output.clip_position = uniforms.projection * uniforms.view * world;
    return output;
}
"#;

const LIT_FRAGMENT_TEMPLATE: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    object_color: vec3<f32>,
    light_color: vec3<f32>,
    light_pos: vec3<f32>,
    view_position: vec3<f32>,
    uv_scale: vec2<f32>,
}

struct SamplerBorder {
    color: vec4<f32>,
    enabled: u32,
}

struct FragmentInput {
    @location(0) frag_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@group(1) @binding(0)
var {surface}_texture: texture_2d<f32>;
@group(1) @binding(1)
var {surface}_sampler: sampler;
@group(1) @binding(2)
var<uniform> {surface}_border: SamplerBorder;

@fragment
fn fs_main(input: FragmentInput) -> @location(0) vec4<f32> {
    let uv = input.uv * uniforms.uv_scale;
    var texel = textureSample({surface}_texture, {surface}_sampler, uv);
    let outside = any(uv < vec2<f32>(0.0)) || any(uv > vec2<f32>(1.0));
    if ({surface}_border.enabled != 0u && outside) {
        texel = {surface}_border.color;
    }

    let ambient_strength = 1.0;
    let ambient = ambient_strength * uniforms.light_color;

    let norm = normalize(input.normal);
    let light_dir = normalize(uniforms.light_pos - input.frag_pos);
    let diffuse = max(dot(norm, light_dir), 0.0) * uniforms.light_color;

    let specular_strength = 0.8;
    let view_dir = normalize(uniforms.view_position - input.frag_pos);
    let reflect_dir = reflect(-light_dir, norm);
    let spec = pow(max(dot(view_dir, reflect_dir), 0.0), 8.0);
    let specular = specular_strength * spec * uniforms.light_color;

    let result = (ambient + diffuse + specular) * texel.rgb;
    return vec4<f32>(result, 1.0);
}
"#;

/// Fragment stage of a lit program whose texture bindings are named after
/// `surface`, e.g. `object_texture` or `plane_texture`.
pub fn lit_fragment_source(surface: &str) -> String {
    LIT_FRAGMENT_TEMPLATE.replace("{surface}", surface)
}

pub const LAMP_VERTEX: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
}

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return uniforms.projection * uniforms.view * uniforms.model * vec4<f32>(position, 1.0);
}
"#;

pub const LAMP_FRAGMENT: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 1.0, 1.0);
}
"#;
