use super::{
    DialGeometry, EDGE_FADE, INDICATOR_ANGLE, INDICATOR_SIZE, LABEL_FONT_SIZE, LABEL_GAP,
    MAJOR_TICK_LENGTH, MAJOR_TICK_WIDTH, MINOR_TICK_LENGTH, MINOR_TICK_WIDTH,
    SELECTED_TICK_LENGTH, SELECTED_TICK_WIDTH, TICK_INSET, VALUE_FONT_SIZE,
};
use crate::gui::theme::ThemeColors;
use cairo::Context;
use palette::Srgba;
use rotary::{RotaryValueSelector, Tick, Tone};
use std::f64::consts::PI;

struct TickRenderer<'a> {
    tick: &'a Tick,
    label: Option<String>,
    geometry: &'a DialGeometry,
    half_arc: f64,
}

impl<'a> TickRenderer<'a> {
    fn new(
        tick: &'a Tick,
        label: Option<String>,
        geometry: &'a DialGeometry,
        half_arc: f64,
    ) -> Self {
        Self {
            tick,
            label,
            geometry,
            half_arc,
        }
    }

    fn draw(&self, cr: &Context, colors: &ThemeColors) -> Result<(), cairo::Error> {
        let color = self.faded(colors.tone(self.tick.tone));
        self.draw_line(cr, color)?;
        if let Some(label) = &self.label {
            self.draw_label(cr, label, color)?;
        }
        Ok(())
    }

    /// Ticks fade out towards the edges of the visible arc.
    fn faded(&self, color: Srgba<f64>) -> Srgba<f64> {
        let edge = (self.tick.offset.abs() / self.half_arc).min(1.0);
        let (r, g, b, a) = color.into_components();
        Srgba::new(r, g, b, a * (1.0 - EDGE_FADE * edge * edge))
    }

    fn length_and_width(&self) -> (f64, f64) {
        if self.tick.tone == Tone::Selected {
            (SELECTED_TICK_LENGTH, SELECTED_TICK_WIDTH)
        } else if self.tick.is_major() {
            (MAJOR_TICK_LENGTH, MAJOR_TICK_WIDTH)
        } else {
            (MINOR_TICK_LENGTH, MINOR_TICK_WIDTH)
        }
    }

    fn draw_line(&self, cr: &Context, color: Srgba<f64>) -> Result<(), cairo::Error> {
        let scale = self.geometry.scale;
        let (length, width) = self.length_and_width();
        let angle = DialGeometry::screen_angle(self.tick.offset);
        let outer = self.geometry.radius - TICK_INSET * scale;

        let (x0, y0) = self.geometry.point_at(angle, outer);
        let (x1, y1) = self.geometry.point_at(angle, outer - length * scale);

        let (r, g, b, a) = color.into_components();
        cr.set_source_rgba(r, g, b, a);
        cr.set_line_width(width * scale);
        cr.set_line_cap(cairo::LineCap::Round);
        cr.move_to(x0, y0);
        cr.line_to(x1, y1);
        cr.stroke()
    }

    fn draw_label(&self, cr: &Context, text: &str, color: Srgba<f64>) -> Result<(), cairo::Error> {
        let scale = self.geometry.scale;
        let angle = DialGeometry::screen_angle(self.tick.offset);
        let distance = self.geometry.radius
            - (TICK_INSET + MAJOR_TICK_LENGTH.max(SELECTED_TICK_LENGTH) + LABEL_GAP) * scale;
        let (x, y) = self.geometry.point_at(angle, distance);

        let (r, g, b, a) = color.into_components();
        cr.set_source_rgba(r, g, b, a);
        cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Normal);
        cr.set_font_size(LABEL_FONT_SIZE * scale);
        if let Ok(ext) = cr.text_extents(text) {
            cr.move_to(
                x - ext.width() / 2.0 - ext.x_bearing(),
                y - ext.height() / 2.0 - ext.y_bearing(),
            );
            cr.show_text(text)?;
        }
        Ok(())
    }
}

pub fn draw(
    cr: &Context,
    selector: &RotaryValueSelector,
    colors: &ThemeColors,
    width: f64,
    height: f64,
) -> Result<(), cairo::Error> {
    let geometry = DialGeometry::fit(width, height);
    let half_arc = selector.config().visible_arc / 2.0;

    draw_face(cr, &geometry, colors)?;

    cr.save()?;
    clip_to_arc(cr, &geometry, half_arc);

    // one step of slack so ticks sliding in at the clip edge are drawn
    let slack = rotary::angle::degrees_per_step(selector.range()).unwrap_or(0.0);
    let ticks = selector.visible_ticks(slack);
    let (selected, others): (Vec<&Tick>, Vec<&Tick>) =
        ticks.iter().partition(|t| t.tone == Tone::Selected);

    // selected last so it stays on top of a tick sharing its angle
    for tick in others.into_iter().chain(selected) {
        TickRenderer::new(tick, selector.tick_label(tick), &geometry, half_arc)
            .draw(cr, colors)?;
    }
    cr.restore()?;

    draw_indicator(cr, &geometry, colors)?;
    draw_value(cr, &geometry, colors, &selector.label())
}

fn clip_to_arc(cr: &Context, geometry: &DialGeometry, half_arc: f64) {
    if half_arc >= 180.0 {
        return;
    }
    let spread = half_arc.to_radians();
    cr.move_to(geometry.cx, geometry.cy);
    cr.arc(
        geometry.cx,
        geometry.cy,
        geometry.radius,
        INDICATOR_ANGLE - spread,
        INDICATOR_ANGLE + spread,
    );
    cr.close_path();
    cr.clip();
}

fn draw_face(
    cr: &Context,
    geometry: &DialGeometry,
    colors: &ThemeColors,
) -> Result<(), cairo::Error> {
    let (r, g, b, a) = colors.face.into_components();
    cr.set_source_rgba(r, g, b, a);
    cr.arc(geometry.cx, geometry.cy, geometry.radius, 0.0, 2.0 * PI);
    cr.fill()
}

fn draw_indicator(
    cr: &Context,
    geometry: &DialGeometry,
    colors: &ThemeColors,
) -> Result<(), cairo::Error> {
    let size = INDICATOR_SIZE * geometry.scale;
    let (tip_x, tip_y) = geometry.point_at(INDICATOR_ANGLE, geometry.radius - size);

    let (r, g, b, a) = colors.selected.into_components();
    cr.set_source_rgba(r, g, b, a);
    cr.move_to(tip_x, tip_y);
    cr.line_to(tip_x - size, tip_y - size);
    cr.line_to(tip_x + size, tip_y - size);
    cr.close_path();
    cr.fill()
}

fn draw_value(
    cr: &Context,
    geometry: &DialGeometry,
    colors: &ThemeColors,
    text: &str,
) -> Result<(), cairo::Error> {
    let (r, g, b, a) = colors.label.into_components();
    cr.set_source_rgba(r, g, b, a);
    cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Bold);
    cr.set_font_size(VALUE_FONT_SIZE * geometry.scale);
    if let Ok(ext) = cr.text_extents(text) {
        cr.move_to(
            geometry.cx - ext.width() / 2.0 - ext.x_bearing(),
            geometry.cy + geometry.radius * 0.35 - ext.height() / 2.0 - ext.y_bearing(),
        );
        cr.show_text(text)?;
    }
    Ok(())
}
