mod common;

use knit_core::AnyEmptyResult;

const FILLED: &str = "# Title\n\n<!-- docs TREE depth=2 -->\n\n```\n.\n```\n\n<!-- /docs -->\n\nProse.\n";
const CLEARED: &str = "# Title\n\n<!-- docs TREE depth=2 -->\n\n<!-- /docs -->\n\nProse.\n";

#[test]
fn clear_empties_block_bodies() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("readme.md"), FILLED)?;

	common::knit_cmd(tmp.path())
		.arg("clear")
		.assert()
		.success()
		.stdout(predicates::str::contains("Files modified: 1"));

	let content = std::fs::read_to_string(tmp.path().join("readme.md"))?;
	assert_eq!(content, CLEARED);

	Ok(())
}

#[test]
fn clear_check_does_not_write() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("readme.md"), FILLED)?;

	common::knit_cmd(tmp.path())
		.args(["clear", "--check"])
		.assert()
		.code(1)
		.stdout(predicates::str::contains("Would modify: readme.md"));

	let content = std::fs::read_to_string(tmp.path().join("readme.md"))?;
	assert_eq!(content, FILLED);

	Ok(())
}

#[test]
fn clear_is_idempotent() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("readme.md"), CLEARED)?;

	common::knit_cmd(tmp.path())
		.args(["clear", "--check"])
		.assert()
		.success()
		.stdout(predicates::str::contains("Files to modify: 0"));

	Ok(())
}

#[test]
fn clear_warns_about_unclosed_blocks() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let content = "<!-- docs TREE -->\nno closing marker\n";
	std::fs::write(tmp.path().join("readme.md"), content)?;

	common::knit_cmd(tmp.path())
		.arg("clear")
		.assert()
		.success()
		.stderr(predicates::str::contains("has no closing"));

	assert_eq!(std::fs::read_to_string(tmp.path().join("readme.md"))?, content);

	Ok(())
}
