//! Touch gesture tracking
//!
//! `Idle -> Single -> Dual { mode } -> Single -> Idle`. The two-finger mode is
//! classified once, from the first movement of the pair, and kept until fewer
//! than two contacts remain.

use glam::Vec2;

use super::input::TouchPoint;

/// Inter-touch distances below this many pixels are too unstable to pinch with.
const MIN_PINCH_DISTANCE: f32 = 1.0;

/// Which two-finger gesture is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchMode {
    Rotate,
    Zoom,
}

/// Camera motion requested by a touch move
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureMotion {
    None,
    /// Pixel delta to orbit by, as with a single-pointer drag.
    Orbit(Vec2),
    /// Ratio of current to previous distance between the two contacts.
    Pinch(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TouchGesture {
    #[default]
    Idle,
    Single {
        last: TouchPoint,
    },
    Dual {
        mode: Option<TouchMode>,
        last: [TouchPoint; 2],
    },
}

impl TouchGesture {
    pub fn mode(&self) -> Option<TouchMode> {
        match self {
            TouchGesture::Dual { mode, .. } => *mode,
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, TouchGesture::Idle)
    }

    pub fn reset(&mut self) {
        *self = TouchGesture::Idle;
    }

    /// Follow a change in the set of contacts (touch start or touch end).
    ///
    /// Positions are re-anchored so the next move does not jump; a two-finger
    /// mode survives as long as two contacts remain.
    pub fn set_contacts(&mut self, touches: &[TouchPoint]) {
        *self = match (touches, *self) {
            ([], _) => TouchGesture::Idle,
            ([only], _) => TouchGesture::Single { last: *only },
            ([first, second, ..], TouchGesture::Dual { mode, .. }) => TouchGesture::Dual {
                mode,
                last: [*first, *second],
            },
            ([first, second, ..], _) => TouchGesture::Dual {
                mode: None,
                last: [*first, *second],
            },
        };
    }

    /// Consume a touch move and return the motion it implies.
    pub fn advance(&mut self, touches: &[TouchPoint]) -> GestureMotion {
        match (touches, self) {
            ([only], TouchGesture::Single { last }) if only.id == last.id => {
                let delta = only.position - last.position;
                *last = *only;
                GestureMotion::Orbit(delta)
            }
            ([first, second, ..], TouchGesture::Dual { mode, last })
                if first.id == last[0].id && second.id == last[1].id =>
            {
                let previous = [last[0].position, last[1].position];
                let current = [first.position, second.position];
                if mode.is_none() {
                    *mode = classify(previous, current);
                    if let Some(decided) = mode {
                        log::debug!("Two-finger gesture classified as {:?}", decided);
                    }
                }
                let motion = match mode {
                    Some(TouchMode::Zoom) => pinch_ratio(previous, current)
                        .map(GestureMotion::Pinch)
                        .unwrap_or(GestureMotion::None),
                    Some(TouchMode::Rotate) => {
                        let delta = ((current[0] - previous[0]) + (current[1] - previous[1])) * 0.5;
                        GestureMotion::Orbit(delta)
                    }
                    None => GestureMotion::None,
                };
                *last = [*first, *second];
                motion
            }
            (touches, gesture) => {
                gesture.set_contacts(touches);
                GestureMotion::None
            }
        }
    }
}

/// Decide the two-finger mode from one movement sample of the pair.
///
/// Opposed motion along the line joining the contacts is a pinch; motion the
/// two contacts share is a rotation. Returns `None` while neither contact moved.
pub fn classify(previous: [Vec2; 2], current: [Vec2; 2]) -> Option<TouchMode> {
    let first_delta = current[0] - previous[0];
    let second_delta = current[1] - previous[1];
    if first_delta == Vec2::ZERO && second_delta == Vec2::ZERO {
        return None;
    }

    let axis = (previous[1] - previous[0]).normalize_or_zero();
    let radial = (second_delta - first_delta).dot(axis).abs();
    let common = ((first_delta + second_delta) * 0.5).length();

    Some(if radial > common {
        TouchMode::Zoom
    } else {
        TouchMode::Rotate
    })
}

fn pinch_ratio(previous: [Vec2; 2], current: [Vec2; 2]) -> Option<f32> {
    let previous_distance = previous[0].distance(previous[1]);
    let current_distance = current[0].distance(current[1]);
    if previous_distance < MIN_PINCH_DISTANCE || current_distance < MIN_PINCH_DISTANCE {
        return None;
    }
    Some(current_distance / previous_distance)
}
