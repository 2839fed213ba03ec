use selfie_timemachine::{Config, TimeMachineClient};

pub const SESSION_COOKIE: &str = "connect.sid=s%3Atest-session";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Fresh state file path under target/, cleared of any previous test run.
pub fn state_path(name: &str) -> String {
    std::fs::create_dir_all("target").ok();
    let path = format!("target/{name}");
    std::fs::remove_file(&path).ok();
    path
}

pub fn client(base_url: &str, state_path: &str) -> TimeMachineClient {
    TimeMachineClient::new(Config {
        base_url: base_url.to_string(),
        session_cookie: SESSION_COOKIE.to_string(),
        state_path: state_path.to_string(),
    })
    .expect("client construction")
}
