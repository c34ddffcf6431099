//! One-shot connectivity check: resolve the stream tail and report it.

use openthermal_client::HttpStreamStore;
use openthermal_core::StreamStore;

pub fn run(endpoint: Option<String>, stream: Option<String>, token: Option<String>, json: bool) {
    let config = super::resolve_config(endpoint, stream, token);
    let store = match HttpStreamStore::new(config.clone()) {
        Ok(store) => store,
        Err(err) => super::fail(&err),
    };

    let rt = tokio::runtime::Runtime::new().unwrap();
    match rt.block_on(store.check_tail(&config.stream)) {
        Ok(cursor) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "endpoint": config.endpoint,
                        "stream": config.stream,
                        "next_position": cursor.0,
                    })
                );
            } else {
                println!("🌡 {} is reachable", config.endpoint);
                println!("   stream: {}", config.stream);
                println!("   next position: {cursor}");
            }
        }
        Err(err) => super::fail(&err),
    }
}
