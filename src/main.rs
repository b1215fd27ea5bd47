use std::env;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::{info, warn};
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{
    DeviceEvent, DeviceId, ElementState, MouseButton as WinitMouseButton, MouseScrollDelta,
    WindowEvent,
};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode as WinitKey, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

use scene_viewer::app::print_final_state;
use scene_viewer::{
    KeyCode, MouseButton, NamedKey, Renderer, SceneAssets, SurfaceTexture, Viewer, ViewerConfig,
    ViewerError,
};

/// Frame interval used to advance the clock in headless runs.
const HEADLESS_FRAME_TIME: f64 = 1.0 / 60.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let config = ViewerConfig::default();
    let assets = SceneAssets::load(&config).context("failed to load scene assets")?;

    println!(
        "Loaded scene with {} vertices and {} programs",
        assets.mesh.vertex_count(),
        assets.programs.len()
    );
    for texture in [&assets.object_texture, &assets.plane_texture] {
        println!(
            " - {} ({}x{}, {})",
            texture.path.display(),
            texture.width(),
            texture.height(),
            texture.layout
        );
    }

    match options.headless_frames {
        Some(frames) => run_headless(config, &assets, frames),
        None => run_interactive(config, assets),
    }
}

fn run_headless(config: ViewerConfig, assets: &SceneAssets, frames: u32) -> Result<()> {
    let mut viewer = Viewer::new(config, &assets.mesh);
    let mut draws = 0;
    for index in 1..=frames {
        let Some(frame) = viewer.step(index as f64 * HEADLESS_FRAME_TIME) else {
            break;
        };
        draws += frame.plan.draws.len();
    }
    println!("Rendered {} headless frame(s), {draws} draw call(s)", viewer.frames());
    print_final_state(&viewer);
    Ok(())
}

fn run_interactive(config: ViewerConfig, assets: SceneAssets) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| ViewerError::context("event loop", err))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp {
        viewer: Viewer::new(config, &assets.mesh),
        assets: Some(assets),
        renderer: None,
        started: Instant::now(),
        last_error: None,
    };
    event_loop
        .run_app(&mut app)
        .map_err(|err| ViewerError::context("event loop", err))?;

    if let Some(err) = app.last_error {
        return Err(err);
    }
    print_final_state(&app.viewer);
    Ok(())
}

struct ViewerApp {
    viewer: Viewer,
    /// Handed to the renderer once the window exists.
    assets: Option<SceneAssets>,
    renderer: Option<Renderer>,
    started: Instant,
    last_error: Option<anyhow::Error>,
}

impl ViewerApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.last_error = Some(err);
        self.viewer.request_close();
        event_loop.exit();
    }

    fn create_renderer(&mut self, event_loop: &ActiveEventLoop) -> Result<Renderer> {
        let window_config = &self.viewer.config().window;
        let attributes = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(LogicalSize::new(window_config.width, window_config.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| ViewerError::context("window", err))?,
        );
        let assets = self
            .assets
            .take()
            .ok_or_else(|| anyhow!("scene assets were already uploaded"))?;
        let renderer = block_on(Renderer::new(Arc::clone(&window), &assets))?;
        capture_cursor(&window);
        Ok(renderer)
    }

    fn handle_keyboard(&mut self, code: WinitKey, state: ElementState) {
        let Some(key) = map_keycode(code) else {
            return;
        };
        let input = self.viewer.input_mut();
        match state {
            ElementState::Pressed => input.set_key_down(key),
            ElementState::Released => input.set_key_up(key),
        }
    }

    fn handle_mouse_button(&mut self, state: ElementState, button: WinitMouseButton) {
        let index = match button {
            WinitMouseButton::Left => 0,
            WinitMouseButton::Right => 1,
            WinitMouseButton::Middle => 2,
            WinitMouseButton::Back => 3,
            WinitMouseButton::Forward => 4,
            WinitMouseButton::Other(value) => value.min(u8::MAX as u16) as u8,
        };
        match MouseButton::new(index).label() {
            Some(name) => {
                let action = match state {
                    ElementState::Pressed => "pressed",
                    ElementState::Released => "released",
                };
                println!("{name} mouse button {action}");
            }
            None => println!("Unhandled mouse button event"),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let now = self.started.elapsed().as_secs_f64();
        let Some(frame) = self.viewer.step(now) else {
            event_loop.exit();
            return Ok(());
        };
        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };
        if let Some(mode) = frame.wrap_change {
            renderer.set_wrap_mode(SurfaceTexture::Object, mode);
        }
        if let Err(err) = renderer.render(&frame.plan) {
            match err {
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                    let size = renderer.window().inner_size();
                    renderer.resize(size);
                }
                wgpu::SurfaceError::OutOfMemory => {
                    return Err(anyhow!("GPU is out of memory"));
                }
                wgpu::SurfaceError::Timeout => {
                    info!("Surface timeout; retrying next frame");
                }
                other => warn!("skipped frame: {other}"),
            }
        }
        if !self.viewer.is_running() {
            event_loop.exit();
        }
        Ok(())
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() || self.last_error.is_some() {
            return;
        }
        match self.create_renderer(event_loop) {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.renderer.as_ref().map(Renderer::window_id) != Some(window_id) {
            return;
        }
        match event {
            WindowEvent::CloseRequested => {
                self.viewer.request_close();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.handle_keyboard(code, event.state);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let input = self.viewer.input_mut();
                match delta {
                    MouseScrollDelta::LineDelta(_, y) => input.add_scroll(y),
                    MouseScrollDelta::PixelDelta(position) => {
                        input.add_scroll_pixels(position.y as f32)
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.handle_mouse_button(state, button);
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw(event_loop) {
                    self.fail(event_loop, err);
                }
            }
            _ => {}
        }
    }

    // Raw motion keeps steering once the grabbed cursor stops at the window edge.
    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if self.renderer.is_none() {
            return;
        }
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.viewer
                .input_mut()
                .push_cursor_motion(Vec2::new(dx as f32, dy as f32));
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = self.renderer.as_ref() {
            renderer.window().request_redraw();
        }
    }
}

/// Grabs and hides the cursor so mouse movement only steers the camera.
/// Look direction follows raw device motion, so either grab mode works.
fn capture_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(err) = grabbed {
        warn!("could not capture the cursor: {err}");
    }
    window.set_cursor_visible(false);
}

fn map_keycode(code: WinitKey) -> Option<KeyCode> {
    Some(match code {
        WinitKey::Escape => KeyCode::Named(NamedKey::Escape),
        WinitKey::BracketLeft => KeyCode::Named(NamedKey::LeftBracket),
        WinitKey::BracketRight => KeyCode::Named(NamedKey::RightBracket),
        WinitKey::Digit0 => KeyCode::Digit(0),
        WinitKey::Digit1 => KeyCode::Digit(1),
        WinitKey::Digit2 => KeyCode::Digit(2),
        WinitKey::Digit3 => KeyCode::Digit(3),
        WinitKey::Digit4 => KeyCode::Digit(4),
        WinitKey::Digit5 => KeyCode::Digit(5),
        WinitKey::Digit6 => KeyCode::Digit(6),
        WinitKey::Digit7 => KeyCode::Digit(7),
        WinitKey::Digit8 => KeyCode::Digit(8),
        WinitKey::Digit9 => KeyCode::Digit(9),
        WinitKey::KeyA => KeyCode::Character('A'),
        WinitKey::KeyB => KeyCode::Character('B'),
        WinitKey::KeyC => KeyCode::Character('C'),
        WinitKey::KeyD => KeyCode::Character('D'),
        WinitKey::KeyE => KeyCode::Character('E'),
        WinitKey::KeyF => KeyCode::Character('F'),
        WinitKey::KeyG => KeyCode::Character('G'),
        WinitKey::KeyH => KeyCode::Character('H'),
        WinitKey::KeyI => KeyCode::Character('I'),
        WinitKey::KeyJ => KeyCode::Character('J'),
        WinitKey::KeyK => KeyCode::Character('K'),
        WinitKey::KeyL => KeyCode::Character('L'),
        WinitKey::KeyM => KeyCode::Character('M'),
        WinitKey::KeyN => KeyCode::Character('N'),
        WinitKey::KeyO => KeyCode::Character('O'),
        WinitKey::KeyP => KeyCode::Character('P'),
        WinitKey::KeyQ => KeyCode::Character('Q'),
        WinitKey::KeyR => KeyCode::Character('R'),
        WinitKey::KeyS => KeyCode::Character('S'),
        WinitKey::KeyT => KeyCode::Character('T'),
        WinitKey::KeyU => KeyCode::Character('U'),
        WinitKey::KeyV => KeyCode::Character('V'),
        WinitKey::KeyW => KeyCode::Character('W'),
        WinitKey::KeyX => KeyCode::Character('X'),
        WinitKey::KeyY => KeyCode::Character('Y'),
        WinitKey::KeyZ => KeyCode::Character('Z'),
        _ => return None,
    })
}

struct CliOptions {
    headless_frames: Option<u32>,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        const USAGE: &str = "Usage: scene-viewer [--headless <frames>]";
        let mut args = env::args().skip(1);
        let mut headless_frames = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--headless" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--headless expects a frame count. {USAGE}"))?;
                    let frames = value
                        .parse::<u32>()
                        .with_context(|| format!("invalid frame count `{value}`. {USAGE}"))?;
                    headless_frames = Some(frames);
                }
                other => return Err(anyhow!("Unknown argument: {other}. {USAGE}")),
            }
        }
        Ok(Self { headless_frames })
    }
}
