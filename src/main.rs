//! Candlelight: a candle still-life viewer.
//!
//! Loads a glTF scene of candles on a table, binds translucent wax, wind-blown
//! flame and shadow settings onto its named nodes, flickers the candle lights
//! and renders through bloom, saturation and vignette. The overlay offers an
//! "Explore" transition into orbit mode and an "Exit" back to the overview.

mod app;
mod assets;
mod config;
mod render;
mod scene;
mod ui;

use config::AppConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("Candlelight starting");
    log::info!("   E explore, Backspace exit, F1 wax panel, Esc quit");

    let config = AppConfig::discover()?;
    app::run(config)?;

    log::info!("Goodbye");
    Ok(())
}
