use anyhow::Context;
use clap::{Parser, Subcommand};
use dial::config::{self, Overrides};
use dial::gui::app::AppModel;
use dial::sys::runtime;
use gtk4 as gtk;
use gtk::gio;
use relm4::prelude::*;
use rotary::RotaryValueSelector;

/// Pick a number by turning a dial. The accepted value is printed on stdout.
#[derive(Parser, Debug)]
#[command(name = "dial", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Write the default configuration file (if missing) and print its path
    InitConfig,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(Commands::InitConfig) = cli.command {
        let path = config::write_default_config().context("Failed to write default config")?;
        println!("{}", path.display());
        return Ok(());
    }

    let mut config = config::load_or_default();
    cli.overrides.apply(&mut config);
    let selector_config = config.selector_config().context("Invalid value range")?;
    let selector = RotaryValueSelector::new(selector_config, config.initial_value());

    let (tx, rx) = async_channel::bounded(32);

    // Start Background Services
    runtime::start_background_services(tx);

    // several pickers may be open at once
    let application = gtk::Application::builder()
        .application_id("org.troia.dial")
        .flags(gio::ApplicationFlags::NON_UNIQUE)
        .build();
    let app = RelmApp::from_app(application);

    app.run::<AppModel>((selector, config, cli.overrides, rx));
    Ok(())
}
