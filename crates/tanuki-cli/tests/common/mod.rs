#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::Path;
use std::time::Duration;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

/// Create a `tanuki` command isolated from the user's environment.
#[allow(dead_code)]
pub fn tanuki_cmd(config_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tanuki"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env_remove("TANUKI_SERVER");
    cmd.env_remove("TANUKI_TOKEN");
    cmd.env("TANUKI_CONFIG_DIR", config_dir);
    cmd.env("NO_COLOR", "1");
    cmd
}
