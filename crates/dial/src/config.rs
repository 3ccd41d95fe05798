use crate::events::AppEvent;
use async_channel::{Receiver, Sender};
use directories::ProjectDirs;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rotary::{HighlightBand, RangeError, SelectorConfig, SpringParams, Unit, ValueRange};
use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strum::{Display as StrumDisplay, EnumIter, EnumString};
use thiserror::Error;

/// Which component of a drag turns the dial.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DragAxis {
    #[default]
    #[strum(serialize = "Horizontal", serialize = "h", serialize = "x")]
    Horizontal,
    #[strum(serialize = "Vertical", serialize = "v", serialize = "y")]
    Vertical,
}

impl DragAxis {
    /// Signed translation fed to the dial. Dragging right (or down, on the
    /// vertical axis) turns the ticks with the pointer, bringing lower values
    /// under the indicator.
    pub fn translation(&self, dx: f64, dy: f64) -> f64 {
        match self {
            Self::Horizontal => dx,
            Self::Vertical => dy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RangeConfig {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
            step: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct BandConfig {
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DialConfig {
    pub sensitivity: f64,
    pub visible_arc: f64,
    pub major_every: usize,
    pub drag_axis: DragAxis,
    pub overlay: bool,
    pub spring: SpringParams,
}

impl Default for DialConfig {
    fn default() -> Self {
        Self {
            sensitivity: rotary::selector::DEFAULT_SENSITIVITY,
            visible_arc: rotary::selector::DEFAULT_VISIBLE_ARC,
            major_every: rotary::selector::DEFAULT_MAJOR_EVERY,
            drag_axis: DragAxis::default(),
            overlay: true,
            spring: SpringParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub range: RangeConfig,
    pub value: Option<f64>,
    pub unit: Option<Unit>,
    pub band: Option<BandConfig>,
    #[serde(default)]
    pub dial: DialConfig,
}

impl Config {
    pub fn value_range(&self) -> Result<ValueRange, RangeError> {
        ValueRange::try_new(self.range.min, self.range.max, self.range.step)
    }

    pub fn selector_config(&self) -> Result<SelectorConfig, RangeError> {
        Ok(SelectorConfig::new(self.value_range()?)
            .with_band(self.band.map(|b| HighlightBand::new(b.start, b.end)))
            .with_unit(self.unit.clone())
            .with_sensitivity(self.dial.sensitivity)
            .with_visible_arc(self.dial.visible_arc)
            .with_major_every(self.dial.major_every)
            .with_spring(self.dial.spring))
    }

    /// The configured starting value, or the bottom of the range.
    pub fn initial_value(&self) -> f64 {
        self.value.unwrap_or(self.range.min)
    }
}

/// Command line settings layered over the config file.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct Overrides {
    /// Smallest selectable value
    #[arg(long, allow_negative_numbers = true)]
    pub min: Option<f64>,

    /// Largest selectable value
    #[arg(long, allow_negative_numbers = true)]
    pub max: Option<f64>,

    /// Distance between neighbouring values
    #[arg(long)]
    pub step: Option<f64>,

    /// Initially selected value
    #[arg(long, allow_negative_numbers = true)]
    pub value: Option<f64>,

    /// Start of the highlighted band
    #[arg(long, allow_negative_numbers = true, requires = "range_end")]
    pub range_start: Option<f64>,

    /// End of the highlighted band
    #[arg(long, allow_negative_numbers = true, requires = "range_start")]
    pub range_end: Option<f64>,

    /// Unit shown next to the value (e.g. "kg")
    #[arg(short = 'u', long)]
    pub unit: Option<String>,

    /// Degrees of rotation per pixel dragged
    #[arg(long)]
    pub sensitivity: Option<f64>,

    /// Open as a regular window instead of an overlay
    #[arg(short = 'w', long)]
    pub window: bool,
}

impl Overrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(min) = self.min {
            config.range.min = min;
        }
        if let Some(max) = self.max {
            config.range.max = max;
        }
        if let Some(step) = self.step {
            config.range.step = step;
        }
        if let Some(value) = self.value {
            config.value = Some(value);
        }
        if let (Some(start), Some(end)) = (self.range_start, self.range_end) {
            config.band = Some(BandConfig { start, end });
        }
        if let Some(unit) = &self.unit {
            config.unit = Some(Unit::new(unit.as_str()));
        }
        if let Some(sensitivity) = self.sensitivity {
            config.dial.sensitivity = sensitivity;
        }
        if self.window {
            config.dial.overlay = false;
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Cannot watch config directory: {0}")]
    Notify(#[from] notify::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "troia", "dial").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

/// `DIAL_<SECTION>__<KEY>` variables, e.g. `DIAL_RANGE__MAX=250`.
fn environment() -> config::Environment {
    config::Environment::with_prefix("DIAL")
        .prefix_separator("_")
        .separator("__")
}

pub fn load_config() -> Result<Config, ConfigError> {
    let config_path = get_config_path()?;

    let s = config::Config::builder()
        .add_source(config::File::from(config_path).required(false))
        .add_source(environment())
        .build()?;

    Ok(s.try_deserialize()?)
}

pub fn load_or_default() -> Config {
    match load_config() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to load config, using defaults: {}", e);
            Config::default()
        }
    }
}

/// Writes the commented default file unless one exists, returning its path.
pub fn write_default_config() -> Result<PathBuf, ConfigError> {
    let path = get_config_path()?;
    if path.exists() {
        log::info!("Keeping existing config at {}", path.display());
        return Ok(path);
    }
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    fs_err::write(&path, DEFAULT_CONFIG)?;
    Ok(path)
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

/// Quiet period after a change before the file is read back. Editors tend to
/// save in several writes (truncate, write, rename).
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(150);

type WatchEvents = Receiver<notify::Result<notify::Event>>;

fn is_config_change(event: &notify::Event, config_path: &Path) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    ) && event.paths.iter().any(|p| p == config_path)
}

fn watch_dir(dir: &Path) -> Result<(RecommendedWatcher, WatchEvents), ConfigError> {
    let (bridge_tx, bridge_rx) = async_channel::unbounded();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    )?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok((watcher, bridge_rx))
}

/// Reloads the config file whenever it changes and hands the result to the
/// GUI. A file that fails to parse is logged and skipped.
pub async fn run_async_watcher(tx: Sender<AppEvent>) {
    if let Err(e) = watch_config(tx).await {
        log::error!("Config watcher stopped: {}", e);
    }
}

async fn watch_config(tx: Sender<AppEvent>) -> Result<(), ConfigError> {
    let config_path = get_config_path()?;
    let config_dir = config_path
        .parent()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .to_path_buf();
    fs_err::create_dir_all(&config_dir)?;

    // the watcher stops when dropped
    let (_watcher, events) = watch_dir(&config_dir)?;
    log::debug!("Watching {}", config_path.display());

    while let Ok(res) = events.recv().await {
        match res {
            Ok(event) if is_config_change(&event, &config_path) => {}
            Ok(_) => continue,
            Err(e) => {
                log::warn!("Watch error: {}", e);
                continue;
            }
        }

        tokio::time::sleep(RELOAD_DEBOUNCE).await;
        let coalesced = std::iter::from_fn(|| events.try_recv().ok()).count();
        log::debug!("Config file changed ({} further events coalesced)", coalesced);

        match load_config() {
            Ok(config) => {
                if tx.send(AppEvent::ConfigReload(Box::new(config))).await.is_err() {
                    break;
                }
            }
            Err(e) => log::error!("Failed to reload config: {}", e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_axis_deserialization() {
        let cases = vec![
            ("\"horizontal\"", DragAxis::Horizontal),
            ("\"Horizontal\"", DragAxis::Horizontal),
            ("\"HORIZONTAL\"", DragAxis::Horizontal),
            ("\"h\"", DragAxis::Horizontal),
            ("\"X\"", DragAxis::Horizontal),
            ("\"vertical\"", DragAxis::Vertical),
            ("\"V\"", DragAxis::Vertical),
            ("\"y\"", DragAxis::Vertical),
        ];

        for (json, expected) in cases {
            let deserialized: DragAxis = serde_json::from_str(json).unwrap();
            assert_eq!(deserialized, expected);
        }
    }

    #[test]
    fn test_drag_axis_direction() {
        assert_eq!(DragAxis::Horizontal.translation(10.0, 3.0), 10.0);
        // dragging down behaves like dragging right
        assert_eq!(DragAxis::Vertical.translation(3.0, 10.0), 10.0);
        assert_eq!(DragAxis::Vertical.translation(-3.0, -10.0), -10.0);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{
            "range": { "min": 10, "max": 300, "step": 2 },
            "unit": "kg",
            "band": { "start": 100, "end": 50 },
            "dial": { "drag_axis": "v" }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.initial_value(), 10.0);
        assert_eq!(config.dial.drag_axis, DragAxis::Vertical);
        assert_eq!(config.dial.sensitivity, 1.0);
        assert!(config.dial.overlay);

        let selector = config.selector_config().unwrap();
        assert_eq!(selector.range.total_steps(), 146);
        assert_eq!(selector.band, Some(HighlightBand::new(50.0, 100.0)));
        assert_eq!(selector.unit, Some(Unit::new("kg")));
    }

    #[test]
    fn test_invalid_range_is_reported() {
        let mut config = Config::default();
        config.range.step = 0.0;
        assert_eq!(
            config.selector_config().unwrap_err(),
            RangeError::InvalidStep(0.0)
        );
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = Config::default();
        let overrides = Overrides {
            min: Some(-20.0),
            value: Some(5.0),
            range_start: Some(0.0),
            range_end: Some(10.0),
            unit: Some("°C".to_string()),
            window: true,
            ..Overrides::default()
        };

        overrides.apply(&mut config);

        assert_eq!(config.range.min, -20.0);
        assert_eq!(config.range.max, 100.0);
        assert_eq!(config.value, Some(5.0));
        assert_eq!(config.band, Some(BandConfig { start: 0.0, end: 10.0 }));
        assert_eq!(config.unit, Some(Unit::new("°C")));
        assert!(!config.dial.overlay);
    }

    #[test]
    fn test_environment_overrides_file() {
        let env = environment().source(Some(config::Map::from([
            ("DIAL_RANGE__MAX".to_string(), "250".to_string()),
            ("DIAL_DIAL__DRAG_AXIS".to_string(), "vertical".to_string()),
            ("DIALX_RANGE__MIN".to_string(), "5".to_string()),
        ])));
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(env)
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.range.max, 250.0);
        assert_eq!(config.range.min, 0.0);
        assert_eq!(config.dial.drag_axis, DragAxis::Vertical);
    }

    #[test]
    fn test_config_change_detection() {
        use notify::event::{AccessKind, CreateKind, ModifyKind};

        let config_path = PathBuf::from("/tmp/dial/config.toml");
        let on = |kind, path: &str| notify::Event::new(kind).add_path(PathBuf::from(path));

        assert!(is_config_change(
            &on(EventKind::Modify(ModifyKind::Any), "/tmp/dial/config.toml"),
            &config_path
        ));
        assert!(is_config_change(
            &on(EventKind::Create(CreateKind::File), "/tmp/dial/config.toml"),
            &config_path
        ));
        assert!(!is_config_change(
            &on(EventKind::Modify(ModifyKind::Any), "/tmp/dial/config.toml~"),
            &config_path
        ));
        assert!(!is_config_change(
            &on(EventKind::Access(AccessKind::Any), "/tmp/dial/config.toml"),
            &config_path
        ));
    }

    #[test]
    fn test_default_config_file_parses() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(config.selector_config().is_ok());
        assert_eq!(config.range, RangeConfig::default());
    }
}
