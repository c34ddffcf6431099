//! Run the local stream service with a synthetic thermal camera.

use std::time::Duration;

use openthermal_sim::{GRID_COLS, GRID_ROWS, SimOptions};

pub fn run(
    host: &str,
    port: u16,
    stream: String,
    interval_ms: u64,
    token: Option<String>,
    keepalive_ms: u64,
) {
    let base = format!("http://{host}:{port}");
    let suggested_token = token.as_deref().unwrap_or("dev");

    println!("🌡 openthermal simulator v{}", openthermal_core::VERSION);
    println!("   {base}");
    println!("   stream: {stream}  ({GRID_ROWS}x{GRID_COLS} cells every {interval_ms}ms)");
    if token.is_some() {
        println!("   bearer token required on every request");
    }
    println!();
    println!("   Endpoints:");
    println!("     GET /v1/streams/{stream}/records/tail");
    println!("     GET /v1/streams/{stream}/records?start_seq_num=N   (SSE)");
    println!();
    println!("   Try:");
    println!("     openthermal watch --endpoint {base} --stream {stream} --token {suggested_token}");
    println!("     curl {base}/v1/streams/{stream}/records/tail");
    println!();

    let options = SimOptions {
        stream,
        interval: Duration::from_millis(interval_ms),
        token,
        keepalive: Duration::from_millis(keepalive_ms),
    };

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(openthermal_sim::run_sim(host, port, options));
}
