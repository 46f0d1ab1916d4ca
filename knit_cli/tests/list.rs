mod common;

use knit_core::AnyEmptyResult;
use serde_json::Value;

fn list_project() -> std::io::Result<tempfile::TempDir> {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("readme.md"),
		"# Readme\n\n<!-- docs TREE depth=2 -->\n<!-- /docs -->\n\n<!-- docs FOO -->\n<!-- /docs \
		 -->\n",
	)?;
	std::fs::write(tmp.path().join("plain.md"), "no blocks here\n")?;
	Ok(tmp)
}

#[test]
fn list_shows_blocks_and_generators() -> AnyEmptyResult {
	let tmp = list_project()?;

	common::knit_cmd(tmp.path())
		.arg("list")
		.assert()
		.success()
		.stdout(predicates::str::contains("3:1 TREE depth=\"2\" [registered]"))
		.stdout(predicates::str::contains("6:1 FOO [unknown]"))
		.stdout(predicates::str::contains("2 block(s) in 1 file(s)"))
		.stdout(predicates::str::contains("Generators: JUST, TREE"));

	Ok(())
}

#[test]
fn list_json_output() -> AnyEmptyResult {
	let tmp = list_project()?;

	let output = common::knit_cmd(tmp.path())
		.args(["list", "--format", "json"])
		.output()?;
	assert!(output.status.success());

	let value: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(value["generators"], serde_json::json!(["JUST", "TREE"]));

	let documents = value["documents"].as_array().cloned().unwrap_or_default();
	assert_eq!(documents.len(), 2);

	let readme = documents
		.iter()
		.find(|document| document["file"] == "readme.md")
		.cloned()
		.unwrap_or_default();
	assert_eq!(readme["blocks"][0]["name"], "TREE");
	assert_eq!(readme["blocks"][0]["options"]["depth"], "2");
	assert_eq!(readme["blocks"][0]["registered"], true);
	assert_eq!(readme["blocks"][1]["name"], "FOO");
	assert_eq!(readme["blocks"][1]["registered"], false);

	Ok(())
}

#[test]
fn list_without_blocks() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("plain.md"), "no blocks here\n")?;

	common::knit_cmd(tmp.path())
		.arg("list")
		.assert()
		.success()
		.stdout(predicates::str::contains("No blocks found."));

	Ok(())
}
