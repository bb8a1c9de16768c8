pub const APP_DIR: &str = "tuxyclean";
pub const SETTINGS_FILE: &str = "settings.json";
pub const LOGS_DIR: &str = "logs";
pub const DIAGNOSTICS_LOG: &str = "diagnostics.log";

pub const DEFAULT_MAX_SIZE_MB: u64 = 2048;

// Progress ranges, in percent.
pub const TEMP_PROGRESS_END: u8 = 60;
pub const BROWSER_PROGRESS_END: u8 = 90;
pub const PROGRESS_EVERY: usize = 50;

#[cfg(target_os = "windows")]
pub const CHROME_CACHE: &str = "Google/Chrome/User Data/Default/Cache";
#[cfg(target_os = "windows")]
pub const EDGE_CACHE: &str = "Microsoft/Edge/User Data/Default/Cache";
#[cfg(target_os = "windows")]
pub const BRAVE_CACHE: &str = "BraveSoftware/Brave-Browser/User Data/Default/Cache";
#[cfg(target_os = "windows")]
pub const FIREFOX_PROFILES: &str = "Mozilla/Firefox/Profiles";

#[cfg(target_os = "macos")]
pub const CHROME_CACHE: &str = "Google/Chrome/Default/Cache";
#[cfg(target_os = "macos")]
pub const EDGE_CACHE: &str = "Microsoft Edge/Default/Cache";
#[cfg(target_os = "macos")]
pub const BRAVE_CACHE: &str = "BraveSoftware/Brave-Browser/Default/Cache";
#[cfg(target_os = "macos")]
pub const FIREFOX_PROFILES: &str = "Firefox/Profiles";

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const CHROME_CACHE: &str = "google-chrome/Default/Cache";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const EDGE_CACHE: &str = "microsoft-edge/Default/Cache";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const BRAVE_CACHE: &str = "BraveSoftware/Brave-Browser/Default/Cache";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const FIREFOX_PROFILES: &str = "mozilla/firefox";

pub const FIREFOX_PROFILE_CACHE: &str = "cache2";

pub const SCHEDULE_TASK_NAME: &str = "TuxyClean Weekly";
pub const CRONTAB_TAG: &str = "# tuxyclean-weekly";
