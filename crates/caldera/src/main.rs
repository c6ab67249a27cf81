//! Caldera: a volcano island demo on ember_engine

mod app;
mod components;
mod scripts;

use std::path::Path;
use std::process::ExitCode;

use ember_engine::foundation::logging;
use ember_engine::prelude::*;

use crate::app::CalderaApp;

fn main() -> ExitCode {
    let settings = match EngineSettings::load_or_default(Path::new("caldera.toml")) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("failed to load caldera.toml: {err}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&settings.logging.filter);

    let mut game = CalderaApp::new();
    if let Err(err) = Engine::run(settings, &mut game) {
        log::error!("engine stopped: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
