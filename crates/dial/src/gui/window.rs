use gtk::prelude::*;
use gtk4 as gtk;
use gtk4_layer_shell::{Layer, LayerShell};

pub const DEFAULT_SIZE: i32 = 420;

/// Turns `window` into a centred overlay surface when the compositor speaks the
/// layer shell protocol. Returns whether it did.
pub fn init_layer_shell(window: &gtk::ApplicationWindow) -> bool {
    if !gtk4_layer_shell::is_supported() {
        log::info!("Layer shell not supported, opening a regular window");
        return false;
    }

    window.init_layer_shell();
    window.set_layer(Layer::Overlay);
    window.set_namespace(Some("dial"));
    // no anchors: the compositor centres the surface
    window.set_exclusive_zone(-1);
    window.set_keyboard_mode(gtk4_layer_shell::KeyboardMode::Exclusive);
    true
}

pub fn init_window(window: &gtk::ApplicationWindow, overlay: bool) {
    window.set_default_size(DEFAULT_SIZE, DEFAULT_SIZE);
    if overlay && init_layer_shell(window) {
        window.set_decorated(false);
    }
}
