//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Reference frame the offsets are expressed in
pub mod reference {
    /// Width of the reference frame in pixels
    pub const WIDTH: f64 = 1920.0;

    /// Height of the reference frame in pixels
    pub const HEIGHT: f64 = 1080.0;
}

/// Character scale bounds and step sizes
pub mod scale {
    pub const MIN: f64 = 0.3;
    pub const MAX: f64 = 2.0;

    /// Baseline scale when the server has no override
    pub const DEFAULT: f64 = 1.0;

    /// Step applied per scroll-wheel notch
    pub const WHEEL_STEP: f64 = 0.02;

    /// Step applied per fine-adjust keypress
    pub const FINE_STEP: f64 = 0.01;

    /// Scale is kept at this many decimal places (10^2)
    pub const PRECISION: f64 = 100.0;
}

/// Timer windows used by the editor session
pub mod timing {
    /// Leading+trailing throttle window for preview renders
    pub const RENDER_THROTTLE_MS: u64 = 40;

    /// Quiet period before an autosave fires
    pub const AUTOSAVE_DELAY_MS: u64 = 1000;

    /// How long the "Saved" acknowledgment stays up
    pub const SAVED_FLASH_MS: u64 = 1500;

    /// Upper bound on waiting for the session's final flush at exit
    pub const SHUTDOWN_GRACE_MS: u64 = 3000;
}

/// Page layout
pub mod pages {
    /// Character shown on pages 0 and 1 (both sides)
    pub const DEFAULT_ANCHOR: &str = "Fox";

    /// Pages reserved for the anchor character
    pub const ANCHOR_PAGES: i64 = 2;
}

/// Editor server routes and wire values
pub mod http {
    pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub const ROUTE_CHARACTERS: &str = "/api/characters";
    pub const ROUTE_PAGE: &str = "/api/page";
    pub const ROUTE_RENDER: &str = "/api/render";
    pub const ROUTE_COMMIT: &str = "/api/commit";
    pub const ROUTE_SAVE: &str = "/api/save";
    pub const ROUTE_RESET: &str = "/api/reset";

    /// Error bodies are truncated to this many characters in messages
    pub const ERROR_BODY_LIMIT: usize = 200;
}

/// Config file location
pub mod config {
    /// Application directory name under the user config dir
    pub const APP_DIR: &str = "vs-offset-editor";

    /// Config file name
    pub const FILENAME: &str = "config.json";

    pub const DEFAULT_LOG_LEVEL: &str = "info";
    pub const DEFAULT_WINDOW_WIDTH: u32 = 1280;
    pub const DEFAULT_WINDOW_HEIGHT: u32 = 860;
}
