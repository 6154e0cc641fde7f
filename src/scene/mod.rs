//! Scene-side collaborators of the controls: the camera and orbital math

mod camera;
mod spherical;

pub use camera::*;
pub use spherical::*;
