use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "ysync.yaml";
pub const TOOL_CONFIG_FILE: &str = "elog.config.json";
pub const DEFAULT_OUTPUT_DIR: &str = "content/yuque";
pub const DEFAULT_ENV_FILE: &str = ".elog.env";
pub const DEFAULT_TOOL_PROGRAM: &str = "elog";
pub const DEFAULT_SCHEDULE_LABEL: &str = "com.ysync.sync";

pub const INDEX_FILE: &str = "index.json";
pub const STATE_FILE: &str = ".sync-state.json";
pub const REPORT_FILE: &str = ".sync-report.json";

pub fn settings_path(workspace: &Path) -> PathBuf {
    workspace.join(SETTINGS_FILE)
}

pub fn tool_config_path(workspace: &Path) -> PathBuf {
    workspace.join(TOOL_CONFIG_FILE)
}

pub fn index_path(output_dir: &Path) -> PathBuf {
    output_dir.join(INDEX_FILE)
}

pub fn state_path(output_dir: &Path) -> PathBuf {
    output_dir.join(STATE_FILE)
}

pub fn report_path(output_dir: &Path) -> PathBuf {
    output_dir.join(REPORT_FILE)
}

pub fn launch_agents_dir(home: &Path) -> PathBuf {
    home.join("Library").join("LaunchAgents")
}
