use std::collections::BTreeMap;

use log::{debug, info};

use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::input::InputState;
use crate::interaction::InteractionState;
use crate::mesh::MeshData;
use crate::render::frame::{plan_frame, Drawable, FramePlan, ProgramId, SurfaceTexture};
use crate::render::shaders::{lit_fragment_source, LAMP_FRAGMENT, LAMP_VERTEX, LIT_VERTEX};
use crate::shader::{compile_and_link, LinkedProgram};
use crate::texture::{TextureImage, WrapMode};

/// Everything loaded before the first frame. Any failure here is fatal.
#[derive(Debug)]
pub struct SceneAssets {
    pub mesh: MeshData,
    pub programs: BTreeMap<ProgramId, LinkedProgram>,
    pub object_texture: TextureImage,
    pub plane_texture: TextureImage,
}

impl SceneAssets {
    pub fn load(config: &ViewerConfig) -> Result<Self, ViewerError> {
        let mesh = MeshData::lotion_scene();
        let programs = compile_programs()?;
        let object_texture = TextureImage::load(&config.textures.object)?;
        let plane_texture = TextureImage::load(&config.textures.plane)?;
        Ok(Self {
            mesh,
            programs,
            object_texture,
            plane_texture,
        })
    }

    pub fn texture(&self, surface: SurfaceTexture) -> &TextureImage {
        match surface {
            SurfaceTexture::Object => &self.object_texture,
            SurfaceTexture::Plane => &self.plane_texture,
        }
    }
}

/// Compiles and links the plane, object and lamp programs, stopping at the
/// first failure.
pub fn compile_programs() -> Result<BTreeMap<ProgramId, LinkedProgram>, ViewerError> {
    let mut programs = BTreeMap::new();
    for id in [ProgramId::Plane, ProgramId::Object, ProgramId::Lamp] {
        let program = match id {
            ProgramId::Object | ProgramId::Plane => {
                compile_and_link(id.name(), LIT_VERTEX, &lit_fragment_source(id.name()))?
            }
            ProgramId::Lamp => compile_and_link(id.name(), LAMP_VERTEX, LAMP_FRAGMENT)?,
        };
        programs.insert(id, program);
    }
    Ok(programs)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    ShuttingDown,
}

/// Output of one loop iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub delta_time: f32,
    pub plan: FramePlan,
    /// New wrap mode for the object texture, if it changed this frame.
    pub wrap_change: Option<WrapMode>,
}

/// The render loop's state machine, independent of any window or GPU.
#[derive(Debug)]
pub struct Viewer {
    config: ViewerConfig,
    state: InteractionState,
    input: InputState,
    drawables: Vec<Drawable>,
    loop_state: LoopState,
    frames: u64,
}

impl Viewer {
    pub fn new(config: ViewerConfig, mesh: &MeshData) -> Self {
        let state = InteractionState::new(&config);
        let drawables = Drawable::scene(&config, mesh);
        Self {
            config,
            state,
            input: InputState::new(),
            drawables,
            loop_state: LoopState::Running,
            frames: 0,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Input collected for the next [`Viewer::step`].
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    pub fn is_running(&self) -> bool {
        self.loop_state == LoopState::Running
    }

    pub fn request_close(&mut self) {
        if self.loop_state == LoopState::Running {
            info!("close requested after {} frame(s)", self.frames);
            self.loop_state = LoopState::ShuttingDown;
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs one frame at `now` seconds: timing, keyboard, cursor, scroll,
    /// then the draw plan. Returns `None` once shutting down.
    pub fn step(&mut self, now: f64) -> Option<Frame> {
        if !self.is_running() {
            return None;
        }

        let delta_time = self.state.clock.tick(now);
        debug!("frame {} dt={delta_time:.4}s", self.frames);

        let changes = self.state.apply_keyboard(&self.input, delta_time);
        if changes.close_requested {
            self.request_close();
        }
        self.state.apply_cursor(self.input.cursor_positions());
        self.state.apply_scroll(self.input.scroll_delta());

        let plan = plan_frame(&self.drawables, &self.state, self.config.clear_color);
        self.input.end_frame();
        self.frames += 1;

        Some(Frame {
            delta_time,
            plan,
            wrap_change: changes.wrap_mode,
        })
    }
}

pub fn print_final_state(viewer: &Viewer) {
    let state = viewer.state();
    let camera = state.camera.position();
    println!("Rendered {} frame(s)", viewer.frames());
    println!(
        " - camera pos=({:.2}, {:.2}, {:.2}) zoom={:.1}",
        camera.x,
        camera.y,
        camera.z,
        state.camera.zoom()
    );
    println!(
        " - uv scale=({:.2}, {:.2}) wrap={} projection={}",
        state.uv_scale.x, state.uv_scale.y, state.wrap_mode, state.projection
    );
}
