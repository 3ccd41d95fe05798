use crate::config::Config;

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The config file changed and parsed cleanly.
    ConfigReload(Box<Config>),
}
