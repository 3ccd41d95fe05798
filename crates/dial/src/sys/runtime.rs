use crate::events::AppEvent;
use async_channel::Sender;
use std::thread;
use tokio::runtime::Builder;

/// Runs the config watcher on its own thread with a single-threaded runtime.
/// Failing to start only disables hot reload.
pub fn start_background_services(tx: Sender<AppEvent>) {
    let spawned = thread::Builder::new()
        .name("config-watcher".into())
        .spawn(move || {
            let rt = match Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Failed to create Tokio runtime, config reload disabled: {}", e);
                    return;
                }
            };
            rt.block_on(crate::config::run_async_watcher(tx));
            log::debug!("Config watcher exited");
        });

    if let Err(e) = spawned {
        log::error!("Failed to start config watcher thread: {}", e);
    }
}
