//! Stage compilation and program linking for WGSL sources.
//!
//! Each stage is parsed and validated on its own. Linking checks that the two
//! stages agree on their shared interface, then records which uniforms and
//! resources the program exposes so the renderer can build matching layouts.

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error as StdError;

use log::info;
use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, Handle, Module, Type, TypeInner};

use crate::error::{ShaderStage, ViewerError};
use crate::render::shaders::{ENTRY_FRAGMENT, ENTRY_VERTEX};

/// A parsed and validated shader stage.
#[derive(Debug)]
pub struct CompiledStage {
    pub stage: ShaderStage,
    pub source: String,
    module: Module,
    info: ModuleInfo,
    entry_index: usize,
}

impl CompiledStage {
    pub fn entry_point(&self) -> &str {
        match self.stage {
            ShaderStage::Vertex => ENTRY_VERTEX,
            ShaderStage::Fragment => ENTRY_FRAGMENT,
        }
    }

    /// Globals the entry point actually touches.
    fn used_globals(&self) -> impl Iterator<Item = (Handle<naga::GlobalVariable>, &naga::GlobalVariable)> {
        let function_info = self.info.get_entry_point(self.entry_index);
        self.module
            .global_variables
            .iter()
            .filter(move |(handle, _)| !function_info[*handle].is_empty())
    }
}

/// Kind of a bound shader resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Uniform { size: u32 },
    Texture,
    Sampler,
}

/// Uniform names and bindings reflected from a linked program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramInterface {
    /// Members of the per-draw block at group 0, binding 0.
    pub uniforms: BTreeSet<String>,
    pub uniform_block_size: u32,
    /// Every used binding keyed by (group, binding).
    pub resources: BTreeMap<(u32, u32), ResourceKind>,
}

impl ProgramInterface {
    pub fn resources_in_group(&self, group: u32) -> impl Iterator<Item = (u32, ResourceKind)> + '_ {
        self.resources
            .iter()
            .filter(move |((g, _), _)| *g == group)
            .map(|((_, binding), kind)| (*binding, *kind))
    }
}

/// Two compiled stages that passed the interface checks.
#[derive(Debug)]
pub struct LinkedProgram {
    pub name: String,
    pub vertex: CompiledStage,
    pub fragment: CompiledStage,
    pub interface: ProgramInterface,
}

/// Parses and validates one stage, requiring its entry point.
pub fn compile_stage(
    program: &str,
    stage: ShaderStage,
    source: &str,
) -> Result<CompiledStage, ViewerError> {
    let compile_error = |log: String| ViewerError::ShaderCompile {
        program: program.to_string(),
        stage,
        log,
    };

    let module = naga::front::wgsl::parse_str(source)
        .map_err(|err| compile_error(err.emit_to_string(source)))?;
    let info = Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|err| compile_error(error_chain(&err)))?;

    let entry = match stage {
        ShaderStage::Vertex => ENTRY_VERTEX,
        ShaderStage::Fragment => ENTRY_FRAGMENT,
    };
    let entry_index = module
        .entry_points
        .iter()
        .position(|ep| ep.name == entry && ep.stage == stage.naga())
        .ok_or_else(|| compile_error(format!("missing {stage} entry point `{entry}`")))?;

    Ok(CompiledStage {
        stage,
        source: source.to_string(),
        module,
        info,
        entry_index,
    })
}

/// Compiles both stages and links them into a program.
///
/// A vertex failure is reported before the fragment stage is looked at.
pub fn compile_and_link(
    name: &str,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<LinkedProgram, ViewerError> {
    let vertex = compile_stage(name, ShaderStage::Vertex, vertex_source)?;
    let fragment = compile_stage(name, ShaderStage::Fragment, fragment_source)?;
    link(name, vertex, fragment)
}

fn link(
    name: &str,
    vertex: CompiledStage,
    fragment: CompiledStage,
) -> Result<LinkedProgram, ViewerError> {
    let link_error = |log: String| ViewerError::ShaderLink {
        program: name.to_string(),
        log,
    };

    let outputs = stage_outputs(&vertex);
    for (location, input) in stage_inputs(&fragment) {
        match outputs.get(&location) {
            None => {
                return Err(link_error(format!(
                    "fragment input at location {location} is not written by the vertex stage"
                )))
            }
            Some(output) if *output != input => {
                return Err(link_error(format!(
                    "location {location} is {output:?} in the vertex stage but {input:?} in the fragment stage"
                )))
            }
            Some(_) => {}
        }
    }

    let mut resources = BTreeMap::new();
    let mut blocks: BTreeMap<(u32, u32), BlockLayout> = BTreeMap::new();
    for stage in [&vertex, &fragment] {
        for (_, global) in stage.used_globals() {
            let Some(binding) = &global.binding else {
                continue;
            };
            let key = (binding.group, binding.binding);
            let ty = &stage.module.types[global.ty];
            let kind = match (global.space, &ty.inner) {
                (AddressSpace::Uniform, _) => {
                    let layout = BlockLayout::of(&stage.module, ty);
                    if let Some(existing) = blocks.get(&key) {
                        if *existing != layout {
                            return Err(link_error(format!(
                                "uniform block at group {} binding {} differs between stages",
                                key.0, key.1
                            )));
                        }
                    }
                    let size = layout.size;
                    blocks.insert(key, layout);
                    ResourceKind::Uniform { size }
                }
                (_, TypeInner::Image { .. }) => ResourceKind::Texture,
                (_, TypeInner::Sampler { .. }) => ResourceKind::Sampler,
                (space, inner) => {
                    return Err(link_error(format!(
                        "unsupported resource {:?} in {space:?} space: {inner:?}",
                        global.name
                    )))
                }
            };
            resources.insert(key, kind);
        }
    }

    let block = blocks.remove(&(0, 0)).unwrap_or_default();
    let interface = ProgramInterface {
        uniforms: block.members.into_iter().map(|(name, _)| name).collect(),
        uniform_block_size: block.size,
        resources,
    };
    info!(
        "linked program `{name}` ({} uniforms, {} bindings)",
        interface.uniforms.len(),
        interface.resources.len()
    );

    Ok(LinkedProgram {
        name: name.to_string(),
        vertex,
        fragment,
        interface,
    })
}

/// Member names, offsets and total size of a uniform struct.
#[derive(Debug, Default, PartialEq, Eq)]
struct BlockLayout {
    members: Vec<(String, u32)>,
    size: u32,
}

impl BlockLayout {
    fn of(module: &Module, ty: &Type) -> Self {
        match &ty.inner {
            TypeInner::Struct { members, span } => Self {
                members: members
                    .iter()
                    .map(|m| (m.name.clone().unwrap_or_default(), m.offset))
                    .collect(),
                size: *span,
            },
            inner => Self {
                members: Vec::new(),
                size: inner.size(module.to_ctx()),
            },
        }
    }
}

/// Location-bound values leaving the vertex stage.
fn stage_outputs(stage: &CompiledStage) -> BTreeMap<u32, TypeInner> {
    let entry = &stage.module.entry_points[stage.entry_index];
    let mut locations = BTreeMap::new();
    if let Some(result) = &entry.function.result {
        collect_locations(&stage.module, result.ty, result.binding.as_ref(), &mut locations);
    }
    locations
}

/// Location-bound values entering the fragment stage.
fn stage_inputs(stage: &CompiledStage) -> BTreeMap<u32, TypeInner> {
    let entry = &stage.module.entry_points[stage.entry_index];
    let mut locations = BTreeMap::new();
    for argument in &entry.function.arguments {
        collect_locations(&stage.module, argument.ty, argument.binding.as_ref(), &mut locations);
    }
    locations
}

fn collect_locations(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut BTreeMap<u32, TypeInner>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            out.insert(*location, module.types[ty].inner.clone());
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shaders::{lit_fragment_source, LAMP_FRAGMENT, LAMP_VERTEX, LIT_VERTEX};
    use crate::render::uniforms::{LitUniforms, SamplerBorder, UnlitUniforms};

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn invalid_source_fails_to_compile() {
        let err = compile_and_link("broken", "fn vs_main( {", LAMP_FRAGMENT).unwrap_err();
        match err {
            ViewerError::ShaderCompile { program, stage, log } => {
                assert_eq!(program, "broken");
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn type_errors_fail_validation() {
        let source = r#"
            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                let x: f32 = 1u;
                return vec4<f32>(x);
            }
        "#;
        let err = compile_stage("typed", ShaderStage::Fragment, source).unwrap_err();
        assert!(matches!(
            err,
            ViewerError::ShaderCompile {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
    }

    #[test]
    fn missing_entry_point_is_a_compile_error() {
        let err = compile_stage("lamp", ShaderStage::Vertex, LAMP_FRAGMENT).unwrap_err();
        match err {
            ViewerError::ShaderCompile { log, .. } => assert!(log.contains("vs_main")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn lit_programs_expose_lighting_uniforms() {
        let expected = names(&[
            "model",
            "view",
            "projection",
            "object_color",
            "light_color",
            "light_pos",
            "view_position",
            "uv_scale",
        ]);
        for surface in ["object", "plane"] {
            let program = compile_and_link(surface, LIT_VERTEX, &lit_fragment_source(surface)).unwrap();
            assert_eq!(program.interface.uniforms, expected);
            assert_eq!(
                program.interface.uniform_block_size as usize,
                std::mem::size_of::<LitUniforms>()
            );
            let group1: Vec<_> = program.interface.resources_in_group(1).collect();
            assert_eq!(
                group1,
                vec![
                    (0, ResourceKind::Texture),
                    (1, ResourceKind::Sampler),
                    (
                        2,
                        ResourceKind::Uniform {
                            size: std::mem::size_of::<SamplerBorder>() as u32
                        }
                    ),
                ]
            );
        }
    }

    #[test]
    fn lamp_program_exposes_only_transforms() {
        let program = compile_and_link("lamp", LAMP_VERTEX, LAMP_FRAGMENT).unwrap();
        assert_eq!(program.interface.uniforms, names(&["model", "view", "projection"]));
        assert_eq!(
            program.interface.uniform_block_size as usize,
            std::mem::size_of::<UnlitUniforms>()
        );
        assert_eq!(program.interface.resources_in_group(1).count(), 0);
    }

    #[test]
    fn mismatched_interface_fails_to_link() {
        let fragment = r#"
            @fragment
            fn fs_main(@location(3) tint: vec3<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(tint, 1.0);
            }
        "#;
        let err = compile_and_link("mismatch", LIT_VERTEX, fragment).unwrap_err();
        match err {
            ViewerError::ShaderLink { program, log } => {
                assert_eq!(program, "mismatch");
                assert!(log.contains("location 3"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn mismatched_types_fail_to_link() {
        let fragment = r#"
            @fragment
            fn fs_main(@location(2) uv: vec3<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(uv, 1.0);
            }
        "#;
        let err = compile_and_link("types", LIT_VERTEX, fragment).unwrap_err();
        assert!(matches!(err, ViewerError::ShaderLink { .. }));
    }
}
