//! Shared startup plumbing for every service binary in this crate: tracing
//! initialization and the `--json-logs` flag, grounded in chronx-node's
//! `tracing_subscriber::fmt()...init()` startup line.

pub fn init_tracing(json_logs: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,duel=debug".parse().unwrap());
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
