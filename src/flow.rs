//! The render loop and the application event loop around it.
//!
//! [`RenderLoop`] is a two state machine. It starts `Idle`; [`RenderLoop::start`]
//! moves it to `Running` and asks the [`FramePacer`] for the first frame. Each
//! [`RenderLoop::frame`] then runs to completion without yielding:
//!
//! 1. read the [`Clock`] and compute the seconds since `start`
//! 2. rotate the animated nodes ([`AnimationScheduler::tick`])
//! 3. draw the scene once through the [`Surface`]
//! 4. ask the pacer for the next frame
//!
//! The pacer is asked for exactly one frame per frame, also when drawing
//! failed, so a running loop never stops. There is no way back to `Idle`.
//!
//! [`run`] wires it to winit: the pacer is `Window::request_redraw`, every
//! `RedrawRequested` first hands finished asset loads to the scene and then
//! runs one frame, and resize notifications go to the [`ViewportController`].

use std::sync::Arc;

use instant::{Duration, Instant};
use thiserror::Error;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    animation::AnimationScheduler,
    camera::{OrbitCamera, OrbitController},
    context::Context,
    data_structures::scene_graph::Scene,
    park::{self, ParkConfig},
    placement::ProceduralPlacer,
    resources::{ResourceLoader, source::AssetDir},
    viewport::{Surface, ViewportController, ViewportState},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Monotonic time source of the render loop.
pub trait Clock {
    /// Time since an arbitrary but fixed origin. Never decreases.
    fn now(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// "Run the next frame before the next display refresh."
pub trait FramePacer {
    fn request_frame(&mut self);
}

/// Paces frames with winit redraw requests.
#[derive(Debug, Clone)]
pub struct WindowPacer(pub Arc<Window>);

impl FramePacer for WindowPacer {
    fn request_frame(&mut self) {
        self.0.request_redraw();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running { started_at: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenderLoopError {
    #[error("the render loop has not been started")]
    NotStarted,
}

#[derive(Debug)]
pub struct RenderLoop<C: Clock> {
    clock: C,
    animation: AnimationScheduler,
    state: LoopState,
    frames: u64,
}

impl<C: Clock> RenderLoop<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            animation: AnimationScheduler::new(),
            state: LoopState::Idle,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, LoopState::Running { .. })
    }

    /// Frames run since `start`.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /**
     * Moves `Idle` to `Running` and requests the first frame.
     *
     * Returns `false` and does nothing when already running, so the loop is
     * never scheduled twice.
     */
    pub fn start(&mut self, pacer: &mut dyn FramePacer) -> bool {
        if self.is_running() {
            log::warn!("The render loop is already running");
            return false;
        }
        self.state = LoopState::Running {
            started_at: self.clock.now(),
        };
        log::info!("Render loop started");
        pacer.request_frame();
        true
    }

    /**
     * Runs one frame and schedules the next one.
     *
     * Returns the elapsed seconds the frame was animated with. A failed draw
     * is returned as an error after the next frame was requested.
     */
    pub fn frame(
        &mut self,
        scene: &mut Scene,
        camera: &OrbitCamera,
        viewport: &ViewportState,
        surface: &mut dyn Surface,
        pacer: &mut dyn FramePacer,
    ) -> anyhow::Result<f32> {
        let LoopState::Running { started_at } = self.state else {
            return Err(RenderLoopError::NotStarted.into());
        };
        let elapsed = self.clock.now().saturating_sub(started_at).as_secs_f32();
        self.animation.tick(&mut scene.graph, elapsed);
        let drawn = surface.draw(scene, camera, viewport);
        self.frames += 1;
        pacer.request_frame();
        drawn.map(|_| elapsed)
    }
}

/// Everything that exists once the GPU is ready.
struct AppState {
    ctx: Context,
    scene: Scene,
    loader: ResourceLoader,
    viewport: ViewportController,
    camera: OrbitCamera,
    controller: OrbitController,
    render_loop: RenderLoop<SystemClock>,
}

impl AppState {
    fn new(mut ctx: Context, config: &ParkConfig, camera: OrbitCamera, viewport: ViewportState) -> anyhow::Result<Self> {
        let [r, g, b] = config.clear_colour;
        ctx.clear_colour = wgpu::Color { r, g, b, a: 1.0 };

        let mut scene = Scene::new();
        let mut placer = match config.seed {
            Some(seed) => ProceduralPlacer::seeded(seed, &mut scene.library),
            None => ProceduralPlacer::from_entropy(&mut scene.library),
        };
        let layout = park::populate(&mut scene, &mut placer, config)?;

        let mut loader = ResourceLoader::new(AssetDir::default());
        loader.load_all(park::requests(config, &layout));

        Ok(Self {
            ctx,
            scene,
            loader,
            viewport: ViewportController::new(viewport),
            camera,
            controller: OrbitController::default(),
            render_loop: RenderLoop::new(SystemClock::new()),
        })
    }

    /// Sizes everything to the window and starts drawing.
    fn begin(&mut self) {
        let size = self.ctx.window.inner_size();
        self.viewport.on_resize(size.width, size.height, &mut self.ctx);
        let mut pacer = WindowPacer(self.ctx.window.clone());
        self.render_loop.start(&mut pacer);
    }

    fn redraw(&mut self) {
        self.loader.pump(&mut self.scene);
        self.controller.update(&mut self.camera);
        let mut pacer = WindowPacer(self.ctx.window.clone());
        if let Err(e) = self.render_loop.frame(
            &mut self.scene,
            &self.camera,
            self.viewport.state(),
            &mut self.ctx,
            &mut pacer,
        ) {
            log::error!("Unable to render {}", e);
        }
    }
}

pub(crate) enum FlowEvent {
    #[allow(dead_code)]
    Initialized(Box<Context>),
    #[allow(dead_code)]
    Failed(String),
}

impl std::fmt::Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
        }
    }
}

pub(crate) struct App {
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    config: ParkConfig,
    state: Option<AppState>,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, config: ParkConfig) -> Self {
        Self {
            proxy: event_loop.create_proxy(),
            config,
            state: None,
        }
    }

    fn initialized(&mut self, event_loop: &ActiveEventLoop, ctx: Context) {
        let initial = ViewportState::default();
        match AppState::new(ctx, &self.config, OrbitCamera::default(), initial) {
            Ok(mut state) => {
                state.begin();
                self.state = Some(state);
            }
            Err(e) => {
                log::error!("Cannot build the park: {}", e);
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Park");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let canvas = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(CANVAS_ID));
            if let Some(canvas) = canvas {
                window_attributes = window_attributes.with_canvas(Some(canvas.unchecked_into()));
            }
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot open a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let camera = OrbitCamera::default();
        let viewport = ViewportState::default();
        let init_future = async move { Context::new(window, &camera, &viewport).await };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match futures::executor::block_on(init_future) {
                Ok(ctx) => self.initialized(event_loop, ctx),
                Err(e) => {
                    log::error!("App initialization failed. Cannot create the main context: {}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok(ctx) => FlowEvent::Initialized(Box::new(ctx)),
                    Err(e) => FlowEvent::Failed(e.to_string()),
                };
                if proxy.send_event(event).is_err() {
                    log::error!("The event loop closed before the GPU was ready");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            // This is the message from our wasm `spawn_local`
            FlowEvent::Initialized(ctx) => self.initialized(event_loop, *ctx),
            FlowEvent::Failed(e) => {
                log::error!("App initialization failed. Cannot create the main context: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                state.viewport.on_resize(size.width, size.height, &mut state.ctx);
            }
            WindowEvent::RedrawRequested => state.redraw(),
            other => {
                state.controller.handle_window_events(&other);
            }
        }
    }
}

/// Opens a window on the park described by `config` and runs until it is closed.
pub fn run(config: ParkConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
