//! Orbit simulator
//!
//! Feeds a scripted gesture into [`SmoothControls`] and logs the camera as it
//! settles. With `--window`, orbits with live input from a window instead.
//!
//! ```bash
//! # Drag 300 pixels to the right and print every frame as JSON
//! orbit_sim --gesture drag --amount 300 --json
//!
//! # Pinch in to half the finger separation, with options from a file
//! orbit_sim --gesture pinch --amount 0.5 --options viewer.json
//! ```

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    native::main()
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::cell::Cell;
    use std::path::{Path, PathBuf};
    use std::process::ExitCode;
    use std::rc::Rc;

    use clap::{Parser, ValueEnum};
    use glam::{Vec2, Vec3};
    use model_viewer_controls::controls::{
        ChangeSource, HeadlessSurface, InputEvent, Key, SmoothControls, SmoothControlsOptions,
        TouchPoint,
    };
    use model_viewer_controls::window::{self, WindowError};
    use model_viewer_controls::{Camera, ControlsError, Spherical};
    use serde::Serialize;
    use thiserror::Error;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    enum Gesture {
        /// Single-pointer horizontal drag; amount in pixels.
        Drag,
        /// Mouse wheel; amount in pixels, positive zooms out.
        Wheel,
        /// Two-finger pinch; amount is the final/initial separation ratio.
        Pinch,
        /// Left arrow presses; amount is the number of presses.
        Keys,
    }

    impl Gesture {
        fn default_amount(self) -> f32 {
            match self {
                Gesture::Drag => 200.0,
                Gesture::Wheel => 100.0,
                Gesture::Pinch => 0.5,
                Gesture::Keys => 1.0,
            }
        }
    }

    #[derive(Debug, Parser)]
    #[command(name = "orbit_sim", about = "Drive smooth orbit controls with scripted input")]
    struct Args {
        /// JSON options file (camelCase keys, e.g. {"minimumRadius": 2})
        #[arg(long)]
        options: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Gesture::Drag)]
        gesture: Gesture,

        /// Gesture magnitude; defaults depend on the gesture
        #[arg(long, allow_negative_numbers = true)]
        amount: Option<f32>,

        /// Initial orbit radius
        #[arg(long, default_value_t = 5.0)]
        radius: f32,

        /// Initial azimuth, in degrees
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        theta: f32,

        /// Initial polar angle, in degrees
        #[arg(long, default_value_t = 90.0)]
        phi: f32,

        /// Surface size in pixels
        #[arg(long, default_value_t = 800)]
        width: u32,
        #[arg(long, default_value_t = 600)]
        height: u32,

        /// Simulated frame duration in milliseconds
        #[arg(long, default_value_t = 16.0)]
        frame_ms: f32,

        /// Stop after this many frames even if the camera is still moving
        #[arg(long, default_value_t = 600)]
        max_frames: u32,

        /// Print one JSON object per frame to stdout
        #[arg(long)]
        json: bool,

        /// Open a window and orbit with live input instead
        #[arg(long)]
        window: bool,
    }

    #[derive(Error, Debug)]
    enum SimError {
        #[error("Failed to read {path}: {source}")]
        Io {
            path: PathBuf,
            source: std::io::Error,
        },
        #[error(transparent)]
        Controls(#[from] ControlsError),
        #[error(transparent)]
        Window(#[from] WindowError),
        #[error("Failed to encode frame: {0}")]
        Json(#[from] serde_json::Error),
    }

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct FrameSample {
        frame: u32,
        time_ms: f32,
        theta: f32,
        phi: f32,
        radius: f32,
        field_of_view: f32,
        position: [f32; 3],
        source: Option<ChangeSource>,
    }

    pub fn main() -> ExitCode {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        let args = Args::parse();
        match run(&args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                log::error!("{}", err);
                ExitCode::FAILURE
            }
        }
    }

    fn load_options(path: Option<&Path>) -> Result<SmoothControlsOptions, SimError> {
        let Some(path) = path else {
            return Ok(SmoothControlsOptions::default());
        };
        let json = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let options = SmoothControlsOptions::from_json(&json)?;
        log::info!("Loaded options from {}", path.display());
        Ok(options)
    }

    fn run(args: &Args) -> Result<(), SimError> {
        let options = load_options(args.options.as_deref())?;
        let start = Spherical::new(args.radius, args.phi.to_radians(), args.theta.to_radians());
        let camera = Camera::new(start.to_vector(), Vec3::ZERO);

        if args.window {
            window::run("Orbit Simulator", args.width, args.height, camera, &options, |controls| {
                let spherical = controls.camera_spherical();
                log::info!(
                    "theta {:.3} phi {:.3} radius {:.3} fov {:.1}",
                    spherical.theta,
                    spherical.phi,
                    spherical.radius,
                    controls.field_of_view()
                );
            })?;
            return Ok(());
        }

        let surface = HeadlessSurface::new(args.width as f32, args.height as f32);
        let mut controls = SmoothControls::with_options(camera, Box::new(surface), &options)?;
        controls.update_aspect(args.width as f32 / args.height.max(1) as f32)?;
        controls.enable_interaction();

        let last_source = Rc::new(Cell::new(None));
        let sink = Rc::clone(&last_source);
        controls.add_change_listener(move |event| sink.set(Some(event.source)));

        let amount = args.amount.unwrap_or_else(|| args.gesture.default_amount());
        let center = Vec2::new(args.width as f32, args.height as f32) * 0.5;
        for event in script(args.gesture, amount, center) {
            let response = controls.handle_event(&event);
            log::debug!("{:?} -> {:?}", event, response);
        }

        let goal = controls.goal_spherical();
        log::info!(
            "Goal: theta {:.4} phi {:.4} radius {:.4}",
            goal.theta,
            goal.phi,
            goal.radius
        );

        let mut frame = 0;
        while frame < args.max_frames {
            let time_ms = frame as f32 * args.frame_ms;
            if !controls.update(time_ms, args.frame_ms) {
                break;
            }
            frame += 1;

            let spherical = controls.camera_spherical();
            let sample = FrameSample {
                frame,
                time_ms,
                theta: spherical.theta,
                phi: spherical.phi,
                radius: spherical.radius,
                field_of_view: controls.field_of_view(),
                position: controls.camera().position.to_array(),
                source: last_source.take(),
            };
            if args.json {
                println!("{}", serde_json::to_string(&sample)?);
            } else {
                log::debug!("{:?}", sample);
            }
        }

        let spherical = controls.camera_spherical();
        log::info!(
            "Settled after {} frames: theta {:.4} phi {:.4} radius {:.4}",
            frame,
            spherical.theta,
            spherical.phi,
            spherical.radius
        );
        if frame == args.max_frames {
            log::warn!("Camera still moving after {} frames", frame);
        }
        Ok(())
    }

    /// Input events producing `gesture` around `center`.
    fn script(gesture: Gesture, amount: f32, center: Vec2) -> Vec<InputEvent> {
        const STEPS: usize = 10;
        match gesture {
            Gesture::Drag => {
                let step = Vec2::new(amount / STEPS as f32, 0.0);
                let mut events = vec![InputEvent::PointerDown { position: center }];
                events.extend((1..=STEPS).map(|index| InputEvent::PointerMove {
                    position: center + step * index as f32,
                }));
                events.push(InputEvent::PointerUp);
                events
            }
            Gesture::Wheel => vec![InputEvent::Wheel { delta_y: amount }],
            Gesture::Pinch => {
                let half_separation = 100.0;
                let contacts = |half: f32| {
                    vec![
                        TouchPoint::new(0, center.x, center.y - half),
                        TouchPoint::new(1, center.x, center.y + half),
                    ]
                };
                let mut events = vec![InputEvent::TouchStart {
                    touches: contacts(half_separation),
                }];
                events.extend((1..=STEPS).map(|index| {
                    let t = index as f32 / STEPS as f32;
                    let ratio = 1.0 + (amount - 1.0) * t;
                    InputEvent::TouchMove {
                        touches: contacts(half_separation * ratio),
                    }
                }));
                events.push(InputEvent::TouchEnd { touches: vec![] });
                events
            }
            Gesture::Keys => (0..amount.max(0.0).round() as usize)
                .map(|_| InputEvent::KeyDown { key: Key::Left })
                .collect(),
        }
    }
}
