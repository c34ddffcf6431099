pub mod check;
pub mod simulate;
pub mod tail;
pub mod watch;

use openthermal_core::{SensorFrame, StreamConfig, StreamError};
use tokio_util::sync::CancellationToken;

/// Resolve flags, `OPENTHERMAL_*` environment variables, and defaults into
/// connection settings. Flags win.
pub fn resolve_config(
    endpoint: Option<String>,
    stream: Option<String>,
    token: Option<String>,
) -> StreamConfig {
    StreamConfig::resolve(endpoint, stream, token)
}

/// Print the error and exit non-zero.
pub fn fail(err: &StreamError) -> ! {
    eprintln!("error: {err}");
    std::process::exit(1);
}

/// Cancellation token that trips on Ctrl-C. Must be called on a runtime.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trip = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trip.cancel();
        }
    });
    cancel
}

/// One human-readable line per applied frame.
pub fn frame_line(position: u64, frame: &SensorFrame) -> String {
    let occupancy = if frame.occupied { "occupied" } else { "clear" };
    match frame.peak() {
        Some(peak) => format!(
            "#{position}  {occupancy:<8}  {}x{} cells  peak {peak:.2}°C",
            frame.rows(),
            frame.cols()
        ),
        None => format!("#{position}  {occupancy:<8}  empty grid"),
    }
}

/// One JSON object per applied frame, for piping into other tools.
pub fn frame_json(position: u64, frame: &SensorFrame) -> String {
    serde_json::json!({
        "position": position,
        "occupied": frame.occupied,
        "grid": frame.grid,
    })
    .to_string()
}
