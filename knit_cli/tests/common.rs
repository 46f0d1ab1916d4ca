use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn knit_cmd(dir: &Path) -> Command {
	let mut cmd = Command::new(get_cargo_bin("knit"));
	cmd.env("NO_COLOR", "1").env_remove("KNIT_LOG").current_dir(dir);
	cmd
}
