mod common;

use clap::Parser;
use knit_cli::Commands;
use knit_cli::KnitCli;
use knit_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;

const STALE_TREE: &str = "# Project\n\n<!-- docs TREE -->\nold listing\n<!-- /docs -->\n";
const FRESH_TREE: &str =
	"# Project\n\n<!-- docs TREE -->\n\n```\n.\n├── src\n└── readme.md\n```\n\n<!-- /docs -->\n";

fn tree_project() -> std::io::Result<tempfile::TempDir> {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("src"))?;
	std::fs::write(tmp.path().join("src/lib.rs"), "")?;
	std::fs::write(tmp.path().join("readme.md"), STALE_TREE)?;
	Ok(tmp)
}

#[test]
fn sync_renders_blocks_in_place() -> AnyEmptyResult {
	let tmp = tree_project()?;

	common::knit_cmd(tmp.path())
		.arg("sync")
		.assert()
		.success()
		.stdout(predicates::str::contains("Files processed: 1"))
		.stdout(predicates::str::contains("Files modified: 1"));

	let content = std::fs::read_to_string(tmp.path().join("readme.md"))?;
	assert_eq!(content, FRESH_TREE);

	Ok(())
}

#[test]
fn sync_check_exits_with_one_when_stale() -> AnyEmptyResult {
	let tmp = tree_project()?;

	common::knit_cmd(tmp.path())
		.arg("sync")
		.arg("--check")
		.assert()
		.code(1)
		.stdout(predicates::str::contains("Would modify: readme.md"))
		.stdout(predicates::str::contains("Files to modify: 1"));

	let content = std::fs::read_to_string(tmp.path().join("readme.md"))?;
	assert_eq!(content, STALE_TREE);

	Ok(())
}

#[test]
fn sync_check_passes_after_sync() -> AnyEmptyResult {
	let tmp = tree_project()?;

	common::knit_cmd(tmp.path()).arg("sync").assert().success();
	common::knit_cmd(tmp.path())
		.arg("sync")
		.arg("--check")
		.assert()
		.success()
		.stdout(predicates::str::contains("Files to modify: 0"))
		.stdout(predicates::str::contains("Would modify").not());

	Ok(())
}

#[test]
fn sync_diff_shows_changed_lines() -> AnyEmptyResult {
	let tmp = tree_project()?;

	common::knit_cmd(tmp.path())
		.args(["sync", "--check", "--diff"])
		.assert()
		.code(1)
		.stderr(predicates::str::contains("-old listing"))
		.stderr(predicates::str::contains("+└── readme.md"));

	Ok(())
}

#[test]
fn sync_verbose_lists_modified_files() -> AnyEmptyResult {
	let tmp = tree_project()?;

	common::knit_cmd(tmp.path())
		.args(["sync", "--verbose"])
		.assert()
		.success()
		.stdout(predicates::str::contains("No config file found"))
		.stdout(predicates::str::contains("Modified: readme.md"));

	Ok(())
}

#[test]
fn sync_writes_error_markers_for_unknown_generators() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("readme.md"),
		"intro\n<!-- docs FOO -->\nkeep?\n<!-- /docs -->\noutro\n",
	)?;

	common::knit_cmd(tmp.path())
		.arg("sync")
		.assert()
		.success()
		.stdout(predicates::str::contains("Blocks with errors: 1"))
		.stderr(predicates::str::contains("Extension 'FOO' not found"));

	let content = std::fs::read_to_string(tmp.path().join("readme.md"))?;
	assert_eq!(
		content,
		"intro\n<!-- docs FOO -->\n\n<!-- Error: Extension 'FOO' not found -->\n\n<!-- /docs \
		 -->\noutro\n"
	);

	Ok(())
}

#[test]
fn sync_renders_just_recipes() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("justfile"),
		"[doc('Run tests')]\ntest:\n    cargo test\n",
	)?;
	std::fs::create_dir_all(tmp.path().join("docs"))?;
	std::fs::write(
		tmp.path().join("docs/guide.qmd"),
		"<!-- docs JUST recipe=\"test\" -->\n<!-- /docs -->\n",
	)?;

	common::knit_cmd(tmp.path()).arg("sync").assert().success();

	let content = std::fs::read_to_string(tmp.path().join("docs/guide.qmd"))?;
	assert_eq!(
		content,
		"<!-- docs JUST recipe=\"test\" -->\n\nRun tests\n\n```bash\njust test\n```\n\n<!-- /docs \
		 -->\n"
	);

	Ok(())
}

#[test]
fn sync_respects_config_and_explicit_paths() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let block = "<!-- docs TREE path=\"empty\" -->\n<!-- /docs -->\n";
	std::fs::create_dir_all(tmp.path().join("empty"))?;
	std::fs::create_dir_all(tmp.path().join("vendor"))?;
	std::fs::write(tmp.path().join("knit.toml"), "[exclude]\npatterns = [\"vendor/\"]\n")?;
	std::fs::write(tmp.path().join("readme.md"), block)?;
	std::fs::write(tmp.path().join("vendor/skipped.md"), block)?;
	std::fs::write(tmp.path().join("notes.txt"), block)?;

	common::knit_cmd(tmp.path())
		.args(["sync", ".", "notes.txt"])
		.assert()
		.success()
		.stdout(predicates::str::contains("Files processed: 2"));

	let rendered = "<!-- docs TREE path=\"empty\" -->\n\n```\nempty\n```\n\n<!-- /docs -->\n";
	assert_eq!(std::fs::read_to_string(tmp.path().join("readme.md"))?, rendered);
	assert_eq!(std::fs::read_to_string(tmp.path().join("notes.txt"))?, rendered);
	assert_eq!(
		std::fs::read_to_string(tmp.path().join("vendor/skipped.md"))?,
		block
	);

	Ok(())
}

#[test]
fn sync_missing_path_is_a_failure() -> AnyEmptyResult {
	let tmp = tree_project()?;

	common::knit_cmd(tmp.path())
		.args(["sync", "readme.md", "missing.md"])
		.assert()
		.code(2)
		.stderr(predicates::str::contains("path not found: missing.md"));

	let content = std::fs::read_to_string(tmp.path().join("readme.md"))?;
	assert_eq!(content, FRESH_TREE);

	Ok(())
}

#[test]
fn sync_reports_invalid_config() -> AnyEmptyResult {
	let tmp = tree_project()?;
	std::fs::write(tmp.path().join("knit.toml"), "extensions = 3\n")?;

	common::knit_cmd(tmp.path())
		.arg("sync")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to parse config file"));

	Ok(())
}

#[test]
fn parse_sync_arguments() {
	let cli = KnitCli::parse_from(["knit", "sync", "--check", "docs"]);
	assert!(matches!(
		cli.command,
		Some(Commands::Sync {
			check: true,
			diff: false,
			ref paths,
		}) if paths == &[std::path::PathBuf::from("docs")]
	));

	let cli = KnitCli::parse_from(["knit", "-v", "sync"]);
	assert!(cli.verbose);
	assert!(matches!(
		cli.command,
		Some(Commands::Sync { ref paths, .. }) if paths == &[std::path::PathBuf::from(".")]
	));
}
