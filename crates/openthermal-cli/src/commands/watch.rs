//! The live TUI viewer.

use openthermal_client::HttpStreamStore;

pub fn run(endpoint: Option<String>, stream: Option<String>, token: Option<String>, refresh: f64) {
    let config = super::resolve_config(endpoint, stream, token);
    let store = match HttpStreamStore::new(config) {
        Ok(store) => store,
        Err(err) => super::fail(&err),
    };

    let mut app = crate::tui::app::App::new(store, refresh);
    if let Err(err) = app.run() {
        eprintln!("TUI error: {err}");
        std::process::exit(1);
    }
    // A dead stream leaves its last frame on screen until the user quits,
    // but the process still reports the failure.
    if let Some(message) = app.failure() {
        eprintln!("stream error: {message}");
        std::process::exit(1);
    }
}
