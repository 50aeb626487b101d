pub const ADVANCE_INTERVAL_MS: u64 = 2000;     // Time between two `advance()` calls in the CLI (ms)
pub const ADVANCE_COUNT: usize = 10;           // Number of advances before the CLI exits
pub const TUTORIAL_DURATION_MS: u64 = 0;       // Simulated tutorial length before the gate opens (ms)

pub const REQUEST_TIMEOUT_SECS: u64 = 30;      // Per-request timeout for HTTP fetches (seconds)
pub const MAX_SIMULATED_LATENCY_MS: u64 = 750; // Upper bound of the random delay for file fetches (ms)
pub const USER_AGENT: &str = concat!("carousel/", env!("CARGO_PKG_VERSION"));

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];
