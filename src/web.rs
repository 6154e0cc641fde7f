//! Web-specific functionality for driving the controls from a DOM element.
//!
//! [`ElementSurface`] registers DOM listeners on an element and forwards
//! translated input to the controls that own it. [`WebSmoothControls`] is the
//! JavaScript-facing wrapper.
//!
//! JavaScript change listeners run only after the controls have been released,
//! so they may call back into the wrapper.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::{Vec2, Vec3};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, Event, EventTarget, HtmlElement, KeyboardEvent, MouseEvent,
    TouchEvent, WheelEvent,
};

use crate::controls::{
    ChangeQueue, InputEvent, InputSurface, Key, SmoothControls, SmoothControlsOptions, TouchPoint,
};
use crate::error::ControlsError;
use crate::scene::Camera;

type Listener = Closure<dyn FnMut(Event)>;

const ELEMENT_EVENT_TYPES: [&str; 7] = [
    "mousedown",
    "wheel",
    "keydown",
    "touchstart",
    "touchmove",
    "touchend",
    "touchcancel",
];

/// Bound on the window so a drag keeps tracking, and ends, outside the element.
const WINDOW_EVENT_TYPES: [&str; 2] = ["mousemove", "mouseup"];

/// [`InputSurface`] backed by a DOM element.
pub struct ElementSurface {
    element: HtmlElement,
    controls: Weak<RefCell<SmoothControls>>,
    listeners: Vec<(EventTarget, &'static str, Listener)>,
}

impl ElementSurface {
    pub fn new(element: HtmlElement, controls: Weak<RefCell<SmoothControls>>) -> Self {
        Self {
            element,
            controls,
            listeners: Vec::new(),
        }
    }

    fn listener(&self) -> Listener {
        let controls = self.controls.clone();
        Closure::wrap(Box::new(move |event: Event| {
            let Some(controls) = controls.upgrade() else {
                return;
            };
            let Some(input) = translate(&event) else {
                return;
            };
            // Events raised while the controls are already borrowed are dropped.
            let Ok(mut controls) = controls.try_borrow_mut() else {
                log::trace!("Dropping re-entrant {} event", event.type_());
                return;
            };
            let response = controls.handle_event(&input);
            if response.prevent_default && event.cancelable() {
                event.prevent_default();
            }
        }) as Box<dyn FnMut(Event)>)
    }

    fn listen(&mut self, target: &EventTarget, event_type: &'static str) {
        // Non-passive so wheel and touch defaults can be prevented.
        let options = AddEventListenerOptions::new();
        options.set_passive(false);
        let listener = self.listener();
        let result = target.add_event_listener_with_callback_and_add_event_listener_options(
            event_type,
            listener.as_ref().unchecked_ref(),
            &options,
        );
        match result {
            Ok(()) => self.listeners.push((target.clone(), event_type, listener)),
            Err(err) => log::error!("Failed to add {} listener: {:?}", event_type, err),
        }
    }
}

impl InputSurface for ElementSurface {
    fn bounding_size(&self) -> Vec2 {
        let rect = self.element.get_bounding_client_rect();
        Vec2::new(rect.width() as f32, rect.height() as f32)
    }

    fn has_focus(&self) -> bool {
        web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.active_element())
            .map(|active| {
                let node: &web_sys::Node = &self.element;
                active.is_same_node(Some(node))
            })
            .unwrap_or(false)
    }

    fn attach(&mut self) {
        if !self.listeners.is_empty() {
            return;
        }
        let element: EventTarget = self.element.clone().into();
        for event_type in ELEMENT_EVENT_TYPES {
            self.listen(&element, event_type);
        }
        match web_sys::window() {
            Some(window) => {
                let window: EventTarget = window.into();
                for event_type in WINDOW_EVENT_TYPES {
                    self.listen(&window, event_type);
                }
            }
            None => log::error!("No window to track pointer drags on"),
        }
    }

    fn detach(&mut self) {
        for (target, event_type, listener) in self.listeners.drain(..) {
            if let Err(err) =
                target.remove_event_listener_with_callback(event_type, listener.as_ref().unchecked_ref())
            {
                log::error!("Failed to remove {} listener: {:?}", event_type, err);
            }
        }
    }
}

impl Drop for ElementSurface {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Translate a DOM event into controls input.
fn translate(event: &Event) -> Option<InputEvent> {
    match event.type_().as_str() {
        "mousedown" => {
            let event = event.dyn_ref::<MouseEvent>()?;
            (event.button() == 0).then(|| InputEvent::PointerDown {
                position: Vec2::new(event.client_x() as f32, event.client_y() as f32),
            })
        }
        "mousemove" => {
            let event = event.dyn_ref::<MouseEvent>()?;
            Some(InputEvent::PointerMove {
                position: Vec2::new(event.client_x() as f32, event.client_y() as f32),
            })
        }
        "mouseup" => Some(InputEvent::PointerUp),
        "wheel" => {
            let event = event.dyn_ref::<WheelEvent>()?;
            Some(InputEvent::Wheel {
                delta_y: event.delta_y() as f32,
            })
        }
        "keydown" => {
            let event = event.dyn_ref::<KeyboardEvent>()?;
            Some(InputEvent::KeyDown {
                key: Key::from_dom_key(&event.key()),
            })
        }
        "touchstart" => Some(InputEvent::TouchStart {
            touches: touch_points(event.dyn_ref::<TouchEvent>()?),
        }),
        "touchmove" => Some(InputEvent::TouchMove {
            touches: touch_points(event.dyn_ref::<TouchEvent>()?),
        }),
        "touchend" | "touchcancel" => Some(InputEvent::TouchEnd {
            touches: touch_points(event.dyn_ref::<TouchEvent>()?),
        }),
        _ => None,
    }
}

fn touch_points(event: &TouchEvent) -> Vec<TouchPoint> {
    let touches = event.touches();
    (0..touches.length())
        .filter_map(|index| touches.get(index))
        .map(|touch| {
            TouchPoint::new(
                touch.identifier() as u64,
                touch.client_x() as f32,
                touch.client_y() as f32,
            )
        })
        .collect()
}

fn to_js_error(err: ControlsError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// JavaScript handle to smooth controls attached to an element.
#[wasm_bindgen]
pub struct WebSmoothControls {
    controls: Rc<RefCell<SmoothControls>>,
    /// Change events raised while the controls were borrowed, not yet delivered.
    pending: ChangeQueue,
    callbacks: RefCell<Vec<Option<js_sys::Function>>>,
}

impl WebSmoothControls {
    /// Run `f` on the controls, then deliver any change events it raised.
    fn with_controls<R>(
        &self,
        f: impl FnOnce(&mut SmoothControls) -> Result<R, ControlsError>,
    ) -> Result<R, JsValue> {
        let result = {
            let mut controls = self
                .controls
                .try_borrow_mut()
                .map_err(|_| JsValue::from_str("Smooth controls are busy"))?;
            f(&mut *controls).map_err(to_js_error)
        };
        self.notify();
        result
    }

    fn read<R>(&self, f: impl FnOnce(&SmoothControls) -> R) -> Result<R, JsValue> {
        let controls = self
            .controls
            .try_borrow()
            .map_err(|_| JsValue::from_str("Smooth controls are busy"))?;
        Ok(f(&*controls))
    }

    /// Callbacks may re-enter the wrapper, so no borrow is held across a call.
    fn notify(&self) {
        loop {
            let Some(event) = self.pending.pop() else {
                break;
            };
            let callbacks: Vec<js_sys::Function> =
                self.callbacks.borrow().iter().flatten().cloned().collect();
            if callbacks.is_empty() {
                continue;
            }

            let detail = js_sys::Object::new();
            if let Err(err) = js_sys::Reflect::set(
                &detail,
                &JsValue::from_str("source"),
                &JsValue::from_str(event.source.as_str()),
            ) {
                log::error!("Failed to build change event: {:?}", err);
            }
            for callback in callbacks {
                if let Err(err) = callback.call1(&JsValue::NULL, &detail) {
                    log::error!("Change listener threw: {:?}", err);
                }
            }
        }
    }
}

#[wasm_bindgen]
impl WebSmoothControls {
    /// Create controls for `element`, optionally configured by a JSON options
    /// object (`{"minimumRadius": 1, "interactionPolicy": "always-allow"}`).
    #[wasm_bindgen(constructor)]
    pub fn new(element: HtmlElement, options_json: Option<String>) -> Result<WebSmoothControls, JsValue> {
        let options = match options_json {
            Some(json) => SmoothControlsOptions::from_json(&json).map_err(to_js_error)?,
            None => SmoothControlsOptions::default(),
        };

        let camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        let rect = element.get_bounding_client_rect();
        let controls = Rc::new_cyclic(|weak| {
            let surface = ElementSurface::new(element, weak.clone());
            RefCell::new(SmoothControls::new(camera, Box::new(surface)))
        });
        let pending = ChangeQueue::new();
        {
            let mut controls = controls.borrow_mut();
            controls.apply_options(&options).map_err(to_js_error)?;
            if rect.width() > 0.0 && rect.height() > 0.0 {
                controls
                    .update_aspect((rect.width() / rect.height()) as f32)
                    .map_err(to_js_error)?;
            }
            controls.add_change_listener(pending.recorder());
        }

        log::info!("Smooth controls created");
        Ok(Self {
            controls,
            pending,
            callbacks: RefCell::new(Vec::new()),
        })
    }

    #[wasm_bindgen(js_name = applyOptions)]
    pub fn apply_options(&self, options_json: &str) -> Result<(), JsValue> {
        let options = SmoothControlsOptions::from_json(options_json).map_err(to_js_error)?;
        self.with_controls(|controls| controls.apply_options(&options))
    }

    #[wasm_bindgen(js_name = enableInteraction)]
    pub fn enable_interaction(&self) -> Result<(), JsValue> {
        self.with_controls(|controls| {
            controls.enable_interaction();
            Ok(())
        })
    }

    #[wasm_bindgen(js_name = disableInteraction)]
    pub fn disable_interaction(&self) -> Result<(), JsValue> {
        self.with_controls(|controls| {
            controls.disable_interaction();
            Ok(())
        })
    }

    #[wasm_bindgen(js_name = setOrbit)]
    pub fn set_orbit(
        &self,
        goal_theta: Option<f32>,
        goal_phi: Option<f32>,
        goal_radius: Option<f32>,
    ) -> Result<bool, JsValue> {
        self.with_controls(|controls| controls.set_orbit(goal_theta, goal_phi, goal_radius))
    }

    #[wasm_bindgen(js_name = adjustOrbit)]
    pub fn adjust_orbit(
        &self,
        delta_theta: f32,
        delta_phi: f32,
        delta_radius: f32,
        delta_fov: f32,
    ) -> Result<bool, JsValue> {
        self.with_controls(|controls| {
            controls.adjust_orbit(delta_theta, delta_phi, delta_radius, delta_fov)
        })
    }

    #[wasm_bindgen(js_name = setRadius)]
    pub fn set_radius(&self, radius: f32) -> Result<bool, JsValue> {
        self.with_controls(|controls| controls.set_radius(radius))
    }

    #[wasm_bindgen(js_name = setFieldOfView)]
    pub fn set_field_of_view(&self, fov: f32) -> Result<bool, JsValue> {
        self.with_controls(|controls| controls.set_field_of_view(fov))
    }

    #[wasm_bindgen(js_name = setTarget)]
    pub fn set_target(&self, x: f32, y: f32, z: f32) -> Result<bool, JsValue> {
        self.with_controls(|controls| controls.set_target(x, y, z))
    }

    #[wasm_bindgen(js_name = updateNearFar)]
    pub fn update_near_far(&self, near: f32, far: f32) -> Result<(), JsValue> {
        self.with_controls(|controls| controls.update_near_far(near, far))
    }

    #[wasm_bindgen(js_name = updateAspect)]
    pub fn update_aspect(&self, aspect: f32) -> Result<(), JsValue> {
        self.with_controls(|controls| controls.update_aspect(aspect))
    }

    #[wasm_bindgen(js_name = jumpToGoal)]
    pub fn jump_to_goal(&self) -> Result<(), JsValue> {
        self.with_controls(|controls| {
            controls.jump_to_goal();
            Ok(())
        })
    }

    /// Advance one frame; times in milliseconds. Returns whether the camera moved.
    pub fn update(&self, time: f32, delta: f32) -> Result<bool, JsValue> {
        self.with_controls(|controls| Ok(controls.update(time, delta)))
    }

    /// Camera position as `[x, y, z]`.
    #[wasm_bindgen(js_name = cameraPosition)]
    pub fn camera_position(&self) -> Result<Vec<f32>, JsValue> {
        self.read(|controls| controls.camera().position.to_array().to_vec())
    }

    /// Current `[theta, phi, radius]`.
    #[wasm_bindgen(js_name = cameraSpherical)]
    pub fn camera_spherical(&self) -> Result<Vec<f32>, JsValue> {
        self.read(|controls| {
            let spherical = controls.camera_spherical();
            vec![spherical.theta, spherical.phi, spherical.radius]
        })
    }

    #[wasm_bindgen(js_name = fieldOfView)]
    pub fn field_of_view(&self) -> Result<f32, JsValue> {
        self.read(SmoothControls::field_of_view)
    }

    /// Column-major view-projection matrix.
    #[wasm_bindgen(js_name = viewProjection)]
    pub fn view_projection(&self) -> Result<Vec<f32>, JsValue> {
        self.read(|controls| {
            controls
                .camera()
                .view_projection_matrix()
                .to_cols_array()
                .to_vec()
        })
    }

    /// Register `callback`, called with `{ source }` after the camera moves.
    /// Returns a handle for [`Self::remove_change_listener`].
    #[wasm_bindgen(js_name = addChangeListener)]
    pub fn add_change_listener(&self, callback: js_sys::Function) -> f64 {
        let mut callbacks = self.callbacks.borrow_mut();
        callbacks.push(Some(callback));
        (callbacks.len() - 1) as f64
    }

    /// Returns false if `handle` is unknown or already removed.
    #[wasm_bindgen(js_name = removeChangeListener)]
    pub fn remove_change_listener(&self, handle: f64) -> bool {
        self.callbacks
            .borrow_mut()
            .get_mut(handle as usize)
            .and_then(Option::take)
            .is_some()
    }
}
