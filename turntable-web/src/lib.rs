/// Turntable Web - WASM front-end driving the pipeline with WebGL
///
/// ```js
/// const app = new WebApp("scene", null);
/// app.start_with_model(await (await fetch("car.json")).text());
/// window.addEventListener("resize", () => app.resize(innerWidth, innerHeight));
/// ```
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use turntable_core::{
    model, shaders, FrameOutcome, FrameState, FrameUpdater, MaterialTable, MeshData,
    PipelineError, SceneConfig,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub mod console;
pub mod webgl;

pub use webgl::WebGlBackend;

type FrameCallback = Closure<dyn FnMut(f64)>;

fn to_js(err: PipelineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn request_frame(callback: &FrameCallback) -> Result<i32, JsValue> {
    web_sys::window()
        .ok_or_else(|| JsValue::from_str("no window"))?
        .request_animation_frame(callback.as_ref().unchecked_ref())
}

struct Scene {
    updater: FrameUpdater<WebGlBackend>,
    backend: WebGlBackend,
}

#[wasm_bindgen]
pub struct WebApp {
    scene: Rc<RefCell<Scene>>,
    /// The `requestAnimationFrame` callback; it re-arms itself every frame
    callback: Rc<RefCell<Option<FrameCallback>>>,
    pending: Rc<Cell<Option<i32>>>,
    /// Whether the page supplied its own config, palette included
    custom_config: bool,
}

#[wasm_bindgen]
impl WebApp {
    /// Bind to the canvas with element id `canvas_id`. `config_json` is an
    /// optional scene config; omitted fields keep their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, config_json: Option<String>) -> Result<WebApp, JsValue> {
        let custom_config = config_json.is_some();
        let config = match config_json {
            Some(text) => SceneConfig::from_json(&text).map_err(to_js)?,
            None => SceneConfig::default(),
        };

        let backend = WebGlBackend::from_canvas_id(canvas_id).map_err(|e| {
            log::error!("{}", e);
            to_js(e)
        })?;
        let updater = FrameUpdater::new(config).map_err(to_js)?;

        Ok(WebApp {
            scene: Rc::new(RefCell::new(Scene { updater, backend })),
            callback: Rc::new(RefCell::new(None)),
            pending: Rc::new(Cell::new(None)),
            custom_config,
        })
    }

    /// Upload a JSON model (one renderable per mesh) and start the loop
    pub fn start_with_model(&self, model_json: &str) -> Result<(), JsValue> {
        let meshes = model::parse_model(model_json).map_err(to_js)?;
        self.start(&meshes)
    }

    /// Upload a cube of the given edge length and start the loop
    pub fn start_with_cube(&self, size: f32) -> Result<(), JsValue> {
        if !self.custom_config {
            let mut scene = self.scene.borrow_mut();
            // The car palette means nothing on a cube
            if scene.updater.state() == FrameState::Uninitialized {
                let config = SceneConfig {
                    materials: MaterialTable::solo(),
                    ..scene.updater.config().clone()
                };
                scene.updater = FrameUpdater::new(config).map_err(to_js)?;
            }
        }
        self.start(&[MeshData::cube(size)])
    }

    /// Cancel the pending frame. Resources stay with the WebGL context.
    pub fn stop(&self) {
        if let Some(id) = self.pending.take() {
            if let Some(window) = web_sys::window() {
                if let Err(e) = window.cancel_animation_frame(id) {
                    log::warn!("cancel_animation_frame failed: {:?}", e);
                }
            }
        }
        self.scene.borrow_mut().updater.stop();
        // Dropping the callback breaks its reference to itself
        self.callback.borrow_mut().take();
    }

    /// Viewport size notification from the page
    pub fn resize(&self, width: u32, height: u32) -> Result<(), JsValue> {
        let mut scene = self.scene.borrow_mut();
        let Scene { updater, backend } = &mut *scene;
        updater.resize(backend, width, height).map_err(to_js)?;
        Ok(())
    }

    /// Current frame-updater state: "uninitialized", "ready", "rendering" or "stopped"
    pub fn state(&self) -> String {
        self.scene.borrow().updater.state().name().to_string()
    }
}

impl WebApp {
    fn start(&self, meshes: &[MeshData]) -> Result<(), JsValue> {
        {
            let mut scene = self.scene.borrow_mut();
            let Scene { updater, backend } = &mut *scene;
            let canvas = backend.canvas();
            let viewport = (
                canvas.client_width().max(1) as u32,
                canvas.client_height().max(1) as u32,
            );
            updater
                .initialize(backend, &shaders::lambert(), meshes, viewport)
                .map_err(to_js)?;
        }

        let scene = self.scene.clone();
        let callback = self.callback.clone();
        let pending = self.pending.clone();
        let frame: FrameCallback = Closure::new(move |timestamp: f64| {
            pending.set(None);

            let outcome = {
                let mut scene = scene.borrow_mut();
                let Scene { updater, backend } = &mut *scene;
                updater.tick(backend, timestamp / 1000.0)
            };
            match outcome {
                Ok(FrameOutcome::Stopped) => {
                    log::info!("render loop finished");
                    // Break the closure's reference to itself
                    callback.borrow_mut().take();
                    return;
                }
                Ok(FrameOutcome::Drawn { .. }) | Ok(FrameOutcome::Skipped) => {}
                Err(e) => {
                    log::error!("render loop aborted: {}", e);
                    callback.borrow_mut().take();
                    return;
                }
            }

            if let Some(next) = callback.borrow().as_ref() {
                match request_frame(next) {
                    Ok(id) => pending.set(Some(id)),
                    Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
                }
            }
        });

        let id = request_frame(&frame)?;
        self.pending.set(Some(id));
        *self.callback.borrow_mut() = Some(frame);
        Ok(())
    }
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console::init_logging(log::LevelFilter::Info);
    Ok(())
}
