pub const CONFIG_PATH_ENV: &str = "AWR_GATHER_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "awr-gather.json";
pub const DEFAULT_STORE_DIR: &str = "./";

pub const OCP_URL_ENV: &str = "OCP_URL";
pub const OCP_USER_ENV: &str = "OCP_USER";
pub const OCP_PASSWORD_ENV: &str = "OCP_PASSWORD";

pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 60;
pub const DEFAULT_TARGET_TIMEOUT_SECONDS: u64 = 2 * 60 * 60;
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 20;
pub const DEFAULT_POLL_MAX_INTERVAL_SECONDS: u64 = 60;
pub const MAX_POLL_INTERVAL_SECONDS: u64 = 24 * 60 * 60;
pub const DEFAULT_POLL_BACKOFF_FACTOR: f64 = 1.5;
pub const DEFAULT_TASK_TIMEOUT_SECONDS: u64 = 60 * 60;

pub const CLUSTER_API_ROOT: &str = "/api/v2/ob/clusters";
pub const TASK_API_ROOT: &str = "/api/v2/tasks/instances";

pub const PACK_DIR_PREFIX: &str = "gather_pack_";
pub const SUMMARY_FILE: &str = "result_summary.txt";
pub const REPORT_NAME_PREFIX: &str = "OBAWR_obcluster";
pub const REPORT_FILE_EXT: &str = "html";

/// Minimum look-back for `--since`.
pub const MIN_SINCE_SECONDS: i64 = 60 * 60;
/// Slack added past the rounded hour so the widened window still catches a snapshot.
pub const WIDEN_SLACK_MINUTES: i64 = 3;
