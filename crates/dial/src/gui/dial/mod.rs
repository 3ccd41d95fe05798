use std::f64::consts::PI;

pub mod view;

pub use view::draw;

pub const REFERENCE_RADIUS: f64 = 180.0;
pub const FACE_MARGIN: f64 = 0.92; // share of the half-size used by the face
pub const TICK_INSET: f64 = 14.0; // gap between face edge and tick tips
pub const MAJOR_TICK_LENGTH: f64 = 28.0;
pub const MINOR_TICK_LENGTH: f64 = 14.0;
pub const SELECTED_TICK_LENGTH: f64 = 40.0;
pub const MAJOR_TICK_WIDTH: f64 = 2.5;
pub const MINOR_TICK_WIDTH: f64 = 1.5;
pub const SELECTED_TICK_WIDTH: f64 = 4.0;
pub const LABEL_GAP: f64 = 14.0;
pub const LABEL_FONT_SIZE: f64 = 13.0;
pub const VALUE_FONT_SIZE: f64 = 44.0;
pub const INDICATOR_SIZE: f64 = 12.0;
pub const EDGE_FADE: f64 = 0.75; // alpha lost by ticks at the edge of the arc
pub const INDICATOR_ANGLE: f64 = -PI / 2.0; // top of the face

/// Where the dial sits in the drawing area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DialGeometry {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    pub scale: f64,
}

impl DialGeometry {
    pub fn fit(width: f64, height: f64) -> Self {
        let radius = (width.min(height) / 2.0 * FACE_MARGIN).max(1.0);
        Self {
            cx: width / 2.0,
            cy: height / 2.0,
            radius,
            scale: radius / REFERENCE_RADIUS,
        }
    }

    /// Screen angle (radians, cairo convention) of a tick `offset` degrees
    /// clockwise from the indicator.
    pub fn screen_angle(offset: f64) -> f64 {
        INDICATOR_ANGLE + offset.to_radians()
    }

    pub fn point_at(&self, angle: f64, radius: f64) -> (f64, f64) {
        (
            self.cx + radius * angle.cos(),
            self.cy + radius * angle.sin(),
        )
    }
}
