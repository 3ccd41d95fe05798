use crate::config::{Config, DragAxis, Overrides};
use crate::events::AppEvent;
use crate::gui::dial;
use crate::gui::theme::{self, ThemeColors};
use crate::gui::window;
use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::prelude::*;
use rotary::{GestureAction, RotaryValueSelector};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

pub struct AppModel {
    pub selector: Rc<RefCell<RotaryValueSelector>>,
    pub drag_axis: DragAxis,
    pub configured_value: Option<f64>,
    pub overrides: Overrides,
    pub animating: Rc<Cell<bool>>,
    pub root: gtk::ApplicationWindow,
    pub drawing_area: gtk::DrawingArea,
}

#[derive(Debug)]
pub enum AppMsg {
    DragBegin,
    DragUpdate(f64, f64),
    DragEnd,
    Step(i64),
    Page(i64),
    ValueChanged(f64),
    Accept,
    Cancel,
    ConfigReload(Box<Config>),
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::ConfigReload(config) => AppMsg::ConfigReload(config),
        }
    }
}

fn key_message(key: gdk::Key) -> Option<AppMsg> {
    if key == gdk::Key::Escape {
        Some(AppMsg::Cancel)
    } else if key == gdk::Key::Return || key == gdk::Key::KP_Enter {
        Some(AppMsg::Accept)
    } else if key == gdk::Key::Right || key == gdk::Key::Up {
        Some(AppMsg::Step(1))
    } else if key == gdk::Key::Left || key == gdk::Key::Down {
        Some(AppMsg::Step(-1))
    } else if key == gdk::Key::Page_Up {
        Some(AppMsg::Page(1))
    } else if key == gdk::Key::Page_Down {
        Some(AppMsg::Page(-1))
    } else {
        None
    }
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = (
        RotaryValueSelector,
        Config,
        Overrides,
        async_channel::Receiver<AppEvent>,
    );
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        #[name = "window"]
        gtk::ApplicationWindow {
            set_title: Some("Dial"),
            add_css_class: "dial-window",

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[sender] => move |_, key, _, _| {
                    match key_message(key) {
                        Some(msg) => {
                            sender.input(msg);
                            glib::Propagation::Stop
                        }
                        None => glib::Propagation::Proceed,
                    }
                }
            },

            #[name = "drawing_area"]
            gtk::DrawingArea {
                set_hexpand: true,
                set_vexpand: true,
                add_css_class: "dial-drawing-area",

                add_controller = gtk::GestureDrag {
                    connect_drag_begin[sender] => move |_, _, _| {
                        sender.input(AppMsg::DragBegin);
                    },
                    connect_drag_update[sender] => move |_, dx, dy| {
                        sender.input(AppMsg::DragUpdate(dx, dy));
                    },
                    connect_drag_end[sender] => move |_, _, _| {
                        sender.input(AppMsg::DragEnd);
                    }
                }
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let (mut selector, config, overrides, rx) = init;

        theme::load_css(&root.display());
        window::init_window(&root, config.dial.overlay);

        let input = sender.input_sender().clone();
        selector.connect_value_changed(move |value| input.emit(AppMsg::ValueChanged(value)));

        let model = AppModel {
            selector: Rc::new(RefCell::new(selector)),
            drag_axis: config.dial.drag_axis,
            configured_value: config.value,
            overrides,
            animating: Rc::new(Cell::new(false)),
            root: root.clone(),
            drawing_area: gtk::DrawingArea::default(),
        };

        let widgets = view_output!();

        let mut model = model;
        model.drawing_area = widgets.drawing_area.clone();

        let selector_draw = model.selector.clone();
        widgets
            .drawing_area
            .set_draw_func(move |drawing_area, cr, width, height| {
                let style_context = drawing_area.style_context();
                let colors = ThemeColors::from_context(&style_context);
                if let Err(e) = dial::draw(
                    cr,
                    &selector_draw.borrow(),
                    &colors,
                    width as f64,
                    height as f64,
                ) {
                    log::error!("Drawing error: {}", e);
                }
            });

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, _sender: ComponentSender<Self>) {
        let action = match msg {
            AppMsg::DragBegin => self.selector.borrow_mut().begin_drag(),
            AppMsg::DragUpdate(dx, dy) => {
                let translation = self.drag_axis.translation(dx, dy);
                self.selector.borrow_mut().update_drag(translation)
            }
            AppMsg::DragEnd => self.selector.borrow_mut().end_drag(),
            AppMsg::Step(steps) => self.selector.borrow_mut().step_by(steps),
            AppMsg::Page(pages) => {
                let mut selector = self.selector.borrow_mut();
                let every = selector.config().major_every.max(1) as i64;
                selector.step_by(pages * every)
            }
            AppMsg::ValueChanged(_) => {
                let label = self.selector.borrow().label();
                self.root.set_title(Some(&format!("Dial: {label}")));
                GestureAction::default()
            }
            AppMsg::Accept => {
                self.accept();
                return;
            }
            AppMsg::Cancel => {
                log::info!("Selection cancelled");
                relm4::main_application().quit();
                return;
            }
            AppMsg::ConfigReload(config) => self.reload_config(*config),
        };
        self.apply(action);
    }
}

impl AppModel {
    fn apply(&self, action: GestureAction) {
        if action.should_animate {
            self.start_animation();
        }
        if action.should_redraw {
            self.drawing_area.queue_draw();
        }
    }

    /// Drives the settle animation from the frame clock until it comes to rest.
    fn start_animation(&self) {
        if self.animating.replace(true) {
            return;
        }

        let selector = self.selector.clone();
        let animating = self.animating.clone();
        let last_frame = Cell::new(None::<i64>);
        self.drawing_area.add_tick_callback(move |area, clock| {
            let now = clock.frame_time();
            let dt = last_frame
                .replace(Some(now))
                .map(|prev| Duration::from_micros(now.saturating_sub(prev).max(0) as u64))
                .unwrap_or_default();

            let running = selector.borrow_mut().tick(dt);
            area.queue_draw();
            if running {
                glib::ControlFlow::Continue
            } else {
                animating.set(false);
                glib::ControlFlow::Break
            }
        });
    }

    fn accept(&self) {
        let mut selector = self.selector.borrow_mut();
        if selector.is_dragging() {
            selector.end_drag();
        }
        let value = selector.value();
        log::info!("Accepted {}", value);
        println!("{}", selector.range().format(value));
        relm4::main_application().quit();
    }

    /// Applies a freshly loaded config file. Command line overrides still win.
    fn reload_config(&mut self, mut config: Config) -> GestureAction {
        self.overrides.apply(&mut config);

        let selector_config = match config.selector_config() {
            Ok(c) => c,
            Err(e) => {
                log::error!("Ignoring reloaded config: {}", e);
                return GestureAction::default();
            }
        };

        self.drag_axis = config.dial.drag_axis;
        let mut selector = self.selector.borrow_mut();
        let mut action = selector.reconfigure(selector_config);

        // a changed `value` in the file is a programmatic reset
        if config.value != self.configured_value {
            self.configured_value = config.value;
            if let Some(value) = config.value {
                action.should_animate |= selector.set_value(value).should_animate;
            }
        }

        log::info!("Configuration reloaded");
        action
    }
}
