//! Gearbench - a motorised gearbox on a workbench, with loose parts to pick
//! up, carry and seat in their placement zones.

mod config;
mod events;
mod gearbox;
mod panel;
mod render;
mod scene;
mod telemetry;
mod toggle;
mod update;
mod viewer;

use anyhow::Result;
use audio::{AudioSystem, LoopFollower};
use engine_core::Time;
use hecs::World;
use input::{Bindings, InputState};
use interaction::{ManipulationController, ZoneRegistry};
use physics::PhysicsWorld;
use renderer::{MeshLibrary, Renderer};
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowId},
};

use config::GameConfig;
use gearbox::GearboxDrive;
use panel::ControlPanel;
use scene::{PartMesh, Scene};
use telemetry::Telemetry;
use toggle::VisibilityToggle;
use viewer::Viewer;

/// Name the beacon beep is registered under in the audio system.
const BEACON_SOUND: &str = "beacon_beep";

/// Fixed physics rate in Hz.
const PHYSICS_HZ: f64 = 60.0;

/// Everything the bench needs between frames.
pub struct GameState {
    // Core systems
    world: World,
    time: Time,
    input: InputState,
    bindings: Bindings,
    physics: PhysicsWorld,

    // Rendering
    renderer: Renderer,
    meshes: MeshLibrary,
    viewer: Viewer,

    // Manipulation
    controller: ManipulationController,
    zones: ZoneRegistry,

    // Machine
    gearbox: GearboxDrive,
    panel: ControlPanel,
    telemetry: Telemetry,
    toggle: VisibilityToggle,
    scene: Scene,

    // Audio (None when no output device could be opened)
    audio: Option<AudioSystem>,
    beacon_loop: LoopFollower,

    config: GameConfig,
    title_timer: f32,
    running: bool,
}

impl GameState {
    async fn new(window: Arc<Window>, config: GameConfig) -> Result<Self> {
        let renderer = Renderer::new(window, config.window.vsync).await?;

        let mut meshes = MeshLibrary::new();
        for part in PartMesh::ALL {
            let id = meshes.add(part.mesh_data().upload(renderer.device(), part.label()));
            debug_assert_eq!(id, part.id());
        }

        let mut time = Time::new();
        time.set_fixed_rate(PHYSICS_HZ);
        let mut physics = PhysicsWorld::new();
        physics.set_timestep(time.fixed_timestep_seconds());

        let mut world = World::new();
        let mut zones = ZoneRegistry::new();
        let scene = scene::build(&mut world, &mut physics, &mut zones, &config);
        physics.update_query_pipeline();

        let gearbox = GearboxDrive::new(&config.gearbox);
        let panel = ControlPanel::new(&config.panel, &gearbox);
        let telemetry = Telemetry::new(&config.telemetry);
        let toggle = VisibilityToggle::new(&config.toggle);
        toggle.apply(&mut world);

        let mut viewer = Viewer::new(&config.viewer);
        let (width, height) = renderer.dimensions();
        viewer.camera.set_aspect(width, height);

        let audio = match AudioSystem::new() {
            Ok(mut audio) => {
                audio.load_sound(BEACON_SOUND, &config.telemetry.beacon_sound);
                Some(audio)
            }
            Err(e) => {
                log::error!("Audio unavailable, continuing without sound: {}", e);
                None
            }
        };

        let mut state = Self {
            world,
            time,
            input: InputState::new(),
            bindings: Bindings::default(),
            physics,
            renderer,
            meshes,
            viewer,
            controller: ManipulationController::new(config.manipulation.clone()),
            zones,
            gearbox,
            panel,
            telemetry,
            toggle,
            scene,
            audio,
            beacon_loop: LoopFollower::new(),
            config,
            title_timer: 0.0,
            running: true,
        };
        if state.config.viewer.lock_cursor_on_start {
            state.set_cursor_locked(true);
        }
        log::info!("Gearbench ready");
        Ok(state)
    }

    fn update(&mut self) {
        self.time.update();
        let dt = self.time.delta_seconds();
        update::frame(self, dt);
    }

    fn render(&mut self) -> Result<()> {
        render::run(self)
    }
}

struct App {
    state: Option<GameState>,
}

impl App {
    fn new() -> Self {
        Self { state: None }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let config = GameConfig::load();
        let mut window_attrs = Window::default_attributes()
            .with_title("Gearbench")
            .with_inner_size(winit::dpi::LogicalSize::new(
                config.window.width,
                config.window.height,
            ));
        if config.window.fullscreen {
            window_attrs = window_attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = match event_loop.create_window(window_attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(GameState::new(window.clone(), config)) {
            Ok(s) => {
                self.state = Some(s);
                window.request_redraw();
            }
            Err(e) => {
                log::error!("Failed to initialize bench: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(state) = &mut self.state {
            if state.handle_window_event(event) || !state.running {
                event_loop.exit();
            }
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: DeviceId, event: DeviceEvent) {
        if let Some(state) = &mut self.state {
            state.handle_device_event(event);
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("Gearbench");
    println!("  WASD move, Q/E up/down, mouse look");
    println!("  Left mouse: grab / drop   R/F: push away / pull closer");
    println!("  Escape: free the cursor to click the panel   Space: start / stop");
    println!("  T: show/hide housing");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app)?;
    Ok(())
}
