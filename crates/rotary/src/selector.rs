use crate::angle;
use crate::range::{HighlightBand, StepIndex, ValueRange};
use crate::settle::{SettleAnimation, SpringParams};
use crate::tick::{Emphasis, Tick, Tone};
use crate::unit::{self, Unit};
use std::time::Duration;

pub const DEFAULT_SENSITIVITY: f64 = 1.0; // degrees of rotation per pixel dragged
pub const DEFAULT_VISIBLE_ARC: f64 = 120.0;
pub const DEFAULT_MAJOR_EVERY: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct SelectorConfig {
    pub range: ValueRange,
    pub band: Option<HighlightBand>,
    pub unit: Option<Unit>,
    pub sensitivity: f64,
    pub visible_arc: f64,
    pub major_every: usize,
    pub spring: SpringParams,
}

impl SelectorConfig {
    pub fn new(range: ValueRange) -> Self {
        Self {
            range,
            band: None,
            unit: None,
            sensitivity: DEFAULT_SENSITIVITY,
            visible_arc: DEFAULT_VISIBLE_ARC,
            major_every: DEFAULT_MAJOR_EVERY,
            spring: SpringParams::default(),
        }
    }

    pub fn with_band(mut self, band: Option<HighlightBand>) -> Self {
        self.band = band;
        self
    }

    pub fn with_unit(mut self, unit: Option<Unit>) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_visible_arc(mut self, visible_arc: f64) -> Self {
        self.visible_arc = visible_arc;
        self
    }

    pub fn with_major_every(mut self, major_every: usize) -> Self {
        self.major_every = major_every;
        self
    }

    pub fn with_spring(mut self, spring: SpringParams) -> Self {
        self.spring = spring;
        self
    }

    fn sanitized(mut self) -> Self {
        if !(self.sensitivity.is_finite() && self.sensitivity > 0.0) {
            log::warn!(
                "Drag sensitivity {} must be positive, using {}",
                self.sensitivity,
                DEFAULT_SENSITIVITY
            );
            self.sensitivity = DEFAULT_SENSITIVITY;
        }
        if !(self.visible_arc.is_finite() && self.visible_arc > 0.0) {
            log::warn!(
                "Visible arc {} must be positive, using {}",
                self.visible_arc,
                DEFAULT_VISIBLE_ARC
            );
            self.visible_arc = DEFAULT_VISIBLE_ARC;
        }
        self.visible_arc = self.visible_arc.min(angle::FULL_TURN);
        self.spring = self.spring.sanitized();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Idle,
    /// `origin` is the rotation the drag started from.
    Dragging { origin: f64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GestureAction {
    pub should_redraw: bool,
    pub should_animate: bool,
}

impl GestureAction {
    pub fn new(should_redraw: bool, should_animate: bool) -> Self {
        Self {
            should_redraw,
            should_animate,
        }
    }
}

type ValueCallback = Box<dyn FnMut(f64)>;

/// Dial that turns a one-axis drag into a value snapped to a [`ValueRange`].
///
/// The rotation is written only by the active drag and by the settle animation
/// that follows a release. The selected value changes only when a gesture
/// completes (or through [`set_value`](Self::set_value), which never notifies).
pub struct RotaryValueSelector {
    config: SelectorConfig,
    value: f64,
    angle: f64,
    phase: Phase,
    settle: Option<SettleAnimation>,
    on_value_change: Option<ValueCallback>,
}

impl RotaryValueSelector {
    pub fn new(config: SelectorConfig, value: f64) -> Self {
        let config = config.sanitized();
        let value = Self::clamp_value(&config.range, value);
        let angle = angle::angle_for_index(&config.range, config.range.index_of(value));

        Self {
            config,
            value,
            angle,
            phase: Phase::Idle,
            settle: None,
            on_value_change: None,
        }
    }

    /// Registers the callback fired once per completed gesture that changed the value.
    pub fn connect_value_changed(&mut self, f: impl FnMut(f64) + 'static) {
        self.on_value_change = Some(Box::new(f));
    }

    fn clamp_value(range: &ValueRange, value: f64) -> f64 {
        let clamped = range.clamp(value);
        if clamped != value {
            log::warn!("Value {value} is not a step of the range, clamped to {clamped}");
        }
        clamped
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn range(&self) -> &ValueRange {
        &self.config.range
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn selected_index(&self) -> StepIndex {
        self.config.range.index_of(self.value)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    pub fn is_interactive(&self) -> bool {
        !self.config.range.is_static()
    }

    pub fn is_animating(&self) -> bool {
        self.settle.is_some()
    }

    /// Rotation as currently drawn, including any in-flight settle motion.
    pub fn live_angle(&self) -> f64 {
        self.angle
    }

    /// Rotation at which the selected value sits under the indicator.
    pub fn target_angle(&self) -> f64 {
        angle::angle_for_index(&self.config.range, self.selected_index())
    }

    /// Value that a release right now would pick.
    pub fn projected_value(&self) -> f64 {
        let range = &self.config.range;
        range.value_at(angle::index_for_angle(range, self.angle))
    }

    /// Display text for the value under the indicator.
    pub fn label(&self) -> String {
        let shown = if self.is_dragging() {
            self.projected_value()
        } else {
            self.value
        };
        unit::format_with_unit(shown, self.config.range.decimals(), self.config.unit.as_ref())
    }

    pub fn tick_label(&self, tick: &Tick) -> Option<String> {
        tick.is_major()
            .then(|| self.config.range.format(tick.value))
    }

    /// Out-of-band value change, e.g. a programmatic reset. Never notifies.
    pub fn set_value(&mut self, value: f64) -> GestureAction {
        let value = Self::clamp_value(&self.config.range, value);
        if value == self.value {
            return GestureAction::default();
        }

        log::debug!("Value set externally to {value}");
        self.value = value;
        if self.is_dragging() {
            // the running drag decides where the dial goes
            return GestureAction::new(true, false);
        }
        self.start_settle()
    }

    /// Applies a new configuration, keeping the current value where possible.
    pub fn reconfigure(&mut self, config: SelectorConfig) -> GestureAction {
        if self.is_dragging() {
            log::debug!("Drag aborted by reconfiguration");
            self.phase = Phase::Idle;
        }
        self.config = config.sanitized();
        self.value = Self::clamp_value(&self.config.range, self.value);
        let action = self.start_settle();
        GestureAction::new(true, action.should_animate)
    }

    pub fn begin_drag(&mut self) -> GestureAction {
        if !self.is_interactive() || self.is_dragging() {
            return GestureAction::default();
        }

        // take over from wherever the settle motion has got to
        self.settle = None;
        self.phase = Phase::Dragging { origin: self.angle };
        log::debug!("Drag started at {:.2}°", self.angle);
        GestureAction::default()
    }

    /// `translation` is the total distance dragged since [`begin_drag`](Self::begin_drag),
    /// in pixels. Positive is rightwards.
    pub fn update_drag(&mut self, translation: f64) -> GestureAction {
        let Phase::Dragging { origin } = self.phase else {
            return GestureAction::default();
        };
        if !translation.is_finite() {
            return GestureAction::default();
        }

        self.angle = origin + translation * self.config.sensitivity;
        GestureAction::new(true, false)
    }

    pub fn end_drag(&mut self) -> GestureAction {
        if !self.is_dragging() {
            return GestureAction::default();
        }
        self.phase = Phase::Idle;

        let range = self.config.range;
        let index = angle::index_for_angle(&range, self.angle);
        log::debug!("Drag released at {:.2}°, snapping to step {}", self.angle, index);
        self.commit(range.value_at(index));
        self.start_settle()
    }

    /// Moves the selection by `steps` as a single discrete gesture.
    pub fn step_by(&mut self, steps: i64) -> GestureAction {
        if !self.is_interactive() || self.is_dragging() || steps == 0 {
            return GestureAction::default();
        }

        let range = self.config.range;
        let raw = *self.selected_index() as f64 + steps as f64;
        self.commit(range.value_at(range.clamp_index(raw)));
        self.start_settle()
    }

    /// Advances the settle animation. Returns whether it is still running.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let Some(settle) = self.settle.as_mut() else {
            return false;
        };

        self.angle = settle.advance(dt);
        if settle.is_settled() {
            self.settle = None;
        }
        self.settle.is_some()
    }

    /// Every tick of the range, in index order.
    pub fn ticks(&self) -> Vec<Tick> {
        let selected = self.selected_index();
        (0..self.config.range.total_steps())
            .map(|i| self.tick_at(StepIndex::new(i), selected))
            .collect()
    }

    /// Ticks no further than `margin` degrees outside the visible arc, in index
    /// order. Only the steps around the indicator are visited.
    pub fn visible_ticks(&self, margin: f64) -> Vec<Tick> {
        let reach = self.config.visible_arc / 2.0 + margin.max(0.0);
        let within = |t: &Tick| t.offset.abs() <= reach;

        let Some(per_step) = angle::degrees_per_step(&self.config.range) else {
            return self.ticks().into_iter().filter(within).collect();
        };
        // offsets repeat every `period` steps: the first and last tick coincide
        let period = *self.config.range.last_index() as i64;
        let span = (reach / per_step).ceil() as i64 + 1;
        if 2 * span + 1 >= period {
            return self.ticks().into_iter().filter(within).collect();
        }

        let centre = (-self.angle / per_step)
            .round()
            .rem_euclid(period as f64) as i64;
        let mut indices: Vec<usize> = (centre - span..=centre + span)
            .map(|j| j.rem_euclid(period) as usize)
            .collect();
        if indices.contains(&0) {
            indices.push(period as usize);
        }
        indices.sort_unstable();
        indices.dedup();

        let selected = self.selected_index();
        indices
            .into_iter()
            .map(|i| self.tick_at(StepIndex::new(i), selected))
            .filter(within)
            .collect()
    }

    fn tick_at(&self, index: StepIndex, selected: StepIndex) -> Tick {
        let range = &self.config.range;
        let value = range.value_at(index);
        let offset = angle::tick_offset(range, self.angle, index);
        Tick {
            index,
            value,
            offset,
            emphasis: Emphasis::for_index(index, self.config.major_every),
            tone: Tone::resolve(index, value, selected, self.config.band.as_ref()),
            visible: offset.abs() <= self.config.visible_arc / 2.0,
        }
    }

    fn commit(&mut self, new_value: f64) {
        if new_value == self.value {
            return;
        }
        log::info!("Value changed from {} to {}", self.value, new_value);
        self.value = new_value;
        if let Some(callback) = self.on_value_change.as_mut() {
            callback(new_value);
        }
    }

    fn start_settle(&mut self) -> GestureAction {
        let settle = SettleAnimation::new(self.angle, self.target_angle(), self.config.spring);
        if settle.is_settled() {
            self.angle = settle.position();
            self.settle = None;
            GestureAction::new(true, false)
        } else {
            self.settle = Some(settle);
            GestureAction::new(true, true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const FRAME: Duration = Duration::from_millis(16);

    fn weight_config() -> SelectorConfig {
        SelectorConfig::new(ValueRange::try_new(10.0, 300.0, 2.0).unwrap())
    }

    fn recording(
        config: SelectorConfig,
        value: f64,
    ) -> (RotaryValueSelector, Rc<RefCell<Vec<f64>>>) {
        let emitted = Rc::new(RefCell::new(Vec::new()));
        let mut selector = RotaryValueSelector::new(config, value);
        let sink = emitted.clone();
        selector.connect_value_changed(move |v| sink.borrow_mut().push(v));
        (selector, emitted)
    }

    fn drag(selector: &mut RotaryValueSelector, translation: f64) -> GestureAction {
        selector.begin_drag();
        selector.update_drag(translation);
        selector.end_drag()
    }

    fn settle(selector: &mut RotaryValueSelector) {
        for _ in 0..1000 {
            if !selector.tick(FRAME) {
                return;
            }
        }
        panic!("settle animation did not finish");
    }

    #[test]
    fn test_half_turn_drag_emits_middle_value() {
        let (mut selector, emitted) = recording(weight_config(), 10.0);
        assert_eq!(*selector.selected_index(), 0);

        let action = drag(&mut selector, -180.0);

        assert_eq!(*emitted.borrow(), vec![156.0]);
        assert_eq!(selector.value(), 156.0);
        assert_eq!(*selector.selected_index(), 73);
        assert!(action.should_animate);
    }

    #[test]
    fn test_zero_translation_emits_nothing() {
        let (mut selector, emitted) = recording(weight_config(), 120.0);

        drag(&mut selector, 0.0);
        selector.begin_drag();
        selector.end_drag();

        assert!(emitted.borrow().is_empty());
        assert_eq!(selector.value(), 120.0);
    }

    #[test]
    fn test_no_emission_while_dragging() {
        let (mut selector, emitted) = recording(weight_config(), 10.0);

        selector.begin_drag();
        for px in (0..200).map(|p| -(p as f64)) {
            selector.update_drag(px);
        }
        assert!(emitted.borrow().is_empty());
        assert_eq!(selector.projected_value(), selector.range().value_at(StepIndex::new(80)));

        selector.end_drag();
        assert_eq!(emitted.borrow().len(), 1);
    }

    #[test]
    fn test_drag_far_past_ends_saturates() {
        let (mut selector, emitted) = recording(weight_config(), 156.0);

        drag(&mut selector, 10_000.0);
        assert_eq!(selector.value(), 10.0);
        settle(&mut selector);

        drag(&mut selector, -10_000.0);
        assert_eq!(selector.value(), 300.0);

        assert_eq!(*emitted.borrow(), vec![10.0, 300.0]);
    }

    #[test]
    fn test_emitted_values_are_step_values() {
        let (mut selector, emitted) = recording(weight_config(), 10.0);

        for translation in [-1.3, -7.77, -91.41, 33.3, -250.5, -3.2, 12.9] {
            drag(&mut selector, translation);
            settle(&mut selector);
        }

        let range = *selector.range();
        assert!(!emitted.borrow().is_empty());
        for value in emitted.borrow().iter() {
            assert!(range.is_step_value(*value), "{value} is not a step");
            assert_eq!(range.value_at(range.index_of(*value)), *value);
        }
    }

    #[test]
    fn test_release_settles_exactly_on_step() {
        let (mut selector, _) = recording(weight_config(), 10.0);

        drag(&mut selector, -101.0);
        assert!(selector.is_animating());
        settle(&mut selector);

        assert!(!selector.is_animating());
        assert_eq!(selector.live_angle(), selector.target_angle());
    }

    #[test]
    fn test_external_value_resettles_without_emitting() {
        let (mut selector, emitted) = recording(weight_config(), 10.0);

        let action = selector.set_value(200.0);

        assert!(action.should_animate);
        assert_eq!(*selector.selected_index(), 95);
        settle(&mut selector);
        assert_eq!(
            selector.live_angle(),
            angle::angle_for_index(selector.range(), StepIndex::new(95))
        );
        assert!(emitted.borrow().is_empty());
    }

    #[test]
    fn test_drag_takes_over_from_live_angle() {
        let (mut selector, _) = recording(weight_config(), 10.0);
        selector.set_value(200.0);
        selector.tick(FRAME);
        selector.tick(FRAME);

        let live = selector.live_angle();
        assert_ne!(live, selector.target_angle());

        selector.begin_drag();
        assert!(!selector.is_animating());
        assert_eq!(selector.phase(), Phase::Dragging { origin: live });

        selector.update_drag(0.0);
        assert_eq!(selector.live_angle(), live);
    }

    #[test]
    fn test_out_of_range_value_clamps() {
        let selector = RotaryValueSelector::new(weight_config(), 1000.0);
        assert_eq!(selector.value(), 300.0);

        let selector = RotaryValueSelector::new(weight_config(), 11.1);
        assert_eq!(selector.value(), 12.0);
    }

    #[test]
    fn test_static_range_ignores_gestures() {
        let config = SelectorConfig::new(ValueRange::new(5.0, 5.0, 1.0));
        let (mut selector, emitted) = recording(config, 5.0);

        assert!(!selector.is_interactive());
        drag(&mut selector, -300.0);
        selector.step_by(3);

        assert_eq!(selector.phase(), Phase::Idle);
        assert_eq!(selector.live_angle(), 0.0);
        assert_eq!(selector.value(), 5.0);
        assert!(emitted.borrow().is_empty());
        assert_eq!(selector.ticks().len(), 1);
    }

    #[test]
    fn test_band_highlighting() {
        let config = weight_config().with_band(Some(HighlightBand::new(100.0, 50.0)));
        let selector = RotaryValueSelector::new(config, 10.0);
        let ticks = selector.ticks();
        let tone_of = |v: f64| ticks.iter().find(|t| t.value == v).unwrap().tone;

        for v in (50..=100).step_by(2) {
            assert_eq!(tone_of(v as f64), Tone::InRange, "tick {v}");
        }
        assert_eq!(tone_of(48.0), Tone::Neutral);
        assert_eq!(tone_of(102.0), Tone::Neutral);
        assert_eq!(tone_of(10.0), Tone::Selected);
    }

    #[test]
    fn test_visible_arc() {
        let selector = RotaryValueSelector::new(weight_config(), 156.0);
        let visible: Vec<_> = selector
            .ticks()
            .into_iter()
            .filter(|t| t.visible)
            .map(|t| *t.index)
            .collect();

        assert_eq!(visible.len(), 49);
        assert_eq!(visible.first(), Some(&49));
        assert_eq!(visible.last(), Some(&97));
    }

    #[test]
    fn test_visible_ticks_match_full_scan() {
        let mut selector = RotaryValueSelector::new(weight_config(), 10.0);
        let margin = angle::degrees_per_step(selector.range()).unwrap();
        let reach = selector.config().visible_arc / 2.0 + margin;

        for translation in [0.0, -3.7, -90.0, -180.0, -359.0, -360.0, 25.0] {
            selector.begin_drag();
            selector.update_drag(translation);
            let expected: Vec<Tick> = selector
                .ticks()
                .into_iter()
                .filter(|t| t.offset.abs() <= reach)
                .collect();
            assert_eq!(selector.visible_ticks(margin), expected, "at {translation}");
            selector.end_drag();
            settle(&mut selector);
        }
    }

    #[test]
    fn test_visible_ticks_on_dense_range() {
        let range = ValueRange::try_new(0.0, 99_999.0, 1.0).unwrap();
        for value in [0.0, 5.0, 50_000.0, 99_999.0] {
            let selector = RotaryValueSelector::new(SelectorConfig::new(range), value);
            let expected: Vec<Tick> = selector.ticks().into_iter().filter(|t| t.visible).collect();
            let window = selector.visible_ticks(0.0);

            assert_eq!(window, expected, "at {value}");
            assert!(window.len() < 35_000);
            assert!(window.iter().any(|t| t.tone == Tone::Selected));
        }
    }

    #[test]
    fn test_offset_minimum_keeps_fraction_in_labels() {
        let config = SelectorConfig::new(ValueRange::try_new(0.5, 10.5, 1.0).unwrap())
            .with_major_every(2);
        let (mut selector, emitted) = recording(config, 2.5);
        assert_eq!(selector.label(), "2.5");

        selector.step_by(1);
        assert_eq!(*emitted.borrow(), vec![3.5]);
        assert_eq!(selector.label(), "3.5");

        let ticks = selector.ticks();
        assert_eq!(selector.tick_label(&ticks[0]).as_deref(), Some("0.5"));
        assert_eq!(selector.tick_label(&ticks[2]).as_deref(), Some("2.5"));
        assert_eq!(selector.tick_label(&ticks[1]), None);
    }

    #[test]
    fn test_sensitivity_scales_drag() {
        let config = weight_config().with_sensitivity(2.0);
        let (mut selector, emitted) = recording(config, 10.0);

        drag(&mut selector, -90.0);

        assert_eq!(*emitted.borrow(), vec![156.0]);
    }

    #[test]
    fn test_invalid_sensitivity_falls_back() {
        let selector = RotaryValueSelector::new(weight_config().with_sensitivity(0.0), 10.0);
        assert_eq!(selector.config().sensitivity, DEFAULT_SENSITIVITY);
    }

    #[test]
    fn test_step_by_clamps_and_emits_once() {
        let (mut selector, emitted) = recording(weight_config(), 296.0);

        selector.step_by(5);
        selector.step_by(1);
        selector.step_by(-1);

        assert_eq!(*emitted.borrow(), vec![300.0, 298.0]);
    }

    #[test]
    fn test_step_by_ignored_while_dragging() {
        let (mut selector, emitted) = recording(weight_config(), 100.0);
        selector.begin_drag();
        assert_eq!(selector.step_by(1), GestureAction::default());
        assert!(emitted.borrow().is_empty());
    }

    #[test]
    fn test_reconfigure_keeps_value_without_emitting() {
        let (mut selector, emitted) = recording(weight_config(), 250.0);

        let narrower = SelectorConfig::new(ValueRange::try_new(0.0, 200.0, 5.0).unwrap());
        selector.reconfigure(narrower);

        assert_eq!(selector.value(), 200.0);
        assert!(emitted.borrow().is_empty());
        settle(&mut selector);
        assert_eq!(selector.live_angle(), selector.target_angle());
    }

    #[test]
    fn test_label_follows_drag() {
        let config = weight_config().with_unit(Some(Unit::new("kg")));
        let mut selector = RotaryValueSelector::new(config, 10.0);
        assert_eq!(selector.label(), "10 kg");

        selector.begin_drag();
        selector.update_drag(-180.0);
        assert_eq!(selector.label(), "156 kg");
    }
}
