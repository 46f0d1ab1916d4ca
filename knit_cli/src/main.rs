use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use knit_cli::Commands;
use knit_cli::KnitCli;
use knit_cli::OutputFormat;
use knit_core::AnyResult;
use knit_core::GeneratorRegistry;
use knit_core::KnitError;
use knit_core::ParseDiagnostic;
use knit_core::config::KnitConfig;
use knit_core::locate;
use knit_core::project::Discovery;
use knit_core::project::ScanOptions;
use knit_core::project::SyncMode;
use knit_core::project::SyncResult;
use knit_core::project::discover_documents;
use knit_core::project::sync_documents;
use knit_core::project::write_updates;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "KNIT_LOG";

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

/// How a command finished, mapped onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
	Success,
	/// `--check` found documents that would change.
	Changed,
	/// Some documents could not be read or written.
	Failed,
}

impl Outcome {
	fn code(self) -> i32 {
		match self {
			Self::Success => 0,
			Self::Changed => 1,
			Self::Failed => 2,
		}
	}
}

fn main() {
	let args = KnitCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match args.command {
		Some(Commands::Sync { paths, check, diff }) => {
			run_documents(&paths, SyncMode::Render, check, diff, args.verbose)
		}
		Some(Commands::Clear { paths, check }) => {
			run_documents(&paths, SyncMode::Clear, check, false, args.verbose)
		}
		Some(Commands::List { paths, format }) => run_list(&paths, format),
		None => {
			eprintln!("No subcommand specified. Run `knit --help` for usage.");
			process::exit(2);
		}
	};

	match result {
		Ok(outcome) => process::exit(outcome.code()),
		Err(e) => {
			// Try to render through miette for rich diagnostics with help text
			// and error codes.
			match e.downcast::<KnitError>() {
				Ok(knit_err) => {
					let report: miette::Report = (*knit_err).into();
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			process::exit(Outcome::Failed.code());
		}
	}
}

/// Log to stderr. `KNIT_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_directive = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.without_time()
		.try_init();
}

fn resolve_root() -> PathBuf {
	std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Load the config for the working directory and expand `paths` into
/// documents. Missing paths are reported here.
fn discover(root: &Path, paths: &[PathBuf], verbose: bool) -> AnyResult<Discovery> {
	let config = KnitConfig::load(root)?;
	if verbose {
		match KnitConfig::resolve_path(root) {
			Some(path) => println!("Using config {}", make_relative(&path, root)),
			None => println!("No config file found, using defaults"),
		}
	}

	let options = ScanOptions::from_config(root, config.as_ref());
	let discovery = discover_documents(paths, &options)?;

	for missing in &discovery.missing {
		eprintln!(
			"{} path not found: {}",
			colored!("error:", red),
			make_relative(missing, root)
		);
	}

	Ok(discovery)
}

fn run_documents(
	paths: &[PathBuf],
	mode: SyncMode,
	check: bool,
	show_diff: bool,
	verbose: bool,
) -> AnyResult<Outcome> {
	let root = resolve_root();
	let discovery = discover(&root, paths, verbose)?;
	let registry = GeneratorRegistry::with_builtins();
	let result = sync_documents(&discovery.files, mode, &registry);

	print_diagnostics(&result, &root);

	for update in &result.updated_files {
		let rel = make_relative(&update.path, &root);
		if check {
			println!("Would modify: {rel}");
		} else if verbose {
			println!("Modified: {rel}");
		}

		if show_diff {
			print_diff(&update.original, &update.updated);
		}
	}

	let failures = if check {
		Vec::new()
	} else {
		write_updates(&result)
	};

	for failure in result.failures.iter().chain(failures.iter()) {
		let report = miette::Report::msg(failure.error.to_string());
		eprintln!("{report:?}");
	}

	let modified_label = if check { "Files to modify" } else { "Files modified" };
	println!("Files processed: {}", result.processed);
	println!("{modified_label}: {}", result.updated_files.len());
	if !result.block_errors.is_empty() {
		println!(
			"{}",
			colored!(
				format!("Blocks with errors: {}", result.block_errors.len()),
				yellow
			)
		);
	}

	let outcome = if result.has_failures() || !failures.is_empty() || !discovery.missing.is_empty() {
		Outcome::Failed
	} else if check && !result.is_clean() {
		Outcome::Changed
	} else {
		Outcome::Success
	};

	Ok(outcome)
}

/// Unpaired markers are reported as warnings; they never change the exit
/// status.
fn print_diagnostics(result: &SyncResult, root: &Path) {
	for entry in &result.diagnostics {
		let rel = make_relative(&entry.path, root);
		let report = diagnostic_to_report(&entry.diagnostic, &rel);
		eprintln!("{report:?}");
	}
}

fn run_list(paths: &[PathBuf], format: OutputFormat) -> AnyResult<Outcome> {
	let root = resolve_root();
	let discovery = discover(&root, paths, false)?;
	let registry = GeneratorRegistry::with_builtins();
	let mut documents = Vec::new();
	let mut outcome = if discovery.missing.is_empty() {
		Outcome::Success
	} else {
		Outcome::Failed
	};

	for path in &discovery.files {
		match fs::read_to_string(path) {
			Ok(content) => documents.push((make_relative(path, &root), content)),
			Err(source) => {
				let error = KnitError::DocumentIo {
					path: path.clone(),
					source,
				};
				eprintln!("{} {error}", colored!("error:", red));
				outcome = Outcome::Failed;
			}
		}
	}

	match format {
		OutputFormat::Json => print_list_json(&documents, &registry),
		OutputFormat::Text => print_list_text(&documents, &registry),
	}

	Ok(outcome)
}

fn print_list_text(documents: &[(String, String)], registry: &GeneratorRegistry) {
	let mut block_count = 0;
	let mut file_count = 0;

	for (rel, content) in documents {
		let located = locate(content);
		if located.blocks.is_empty() {
			continue;
		}

		file_count += 1;
		println!("{}", colored!(rel, bold));
		for block in &located.blocks {
			block_count += 1;
			let location = format!("{}:{}", block.opening.start.line, block.opening.start.column);
			match block.header() {
				Ok(header) => {
					let options: Vec<String> = header
						.options
						.iter()
						.map(|(key, value)| format!(" {key}=\"{value}\""))
						.collect();
					let status = if registry.contains(&header.name) {
						colored!("[registered]", green)
					} else {
						colored!("[unknown]", red)
					};
					println!("  {location} {}{} {status}", header.name, options.concat());
				}
				Err(error) => {
					println!("  {location} {}", colored!(format!("[{error}]"), red));
				}
			}
		}
	}

	if block_count == 0 {
		println!("No blocks found.");
	}

	println!("\n{block_count} block(s) in {file_count} file(s)");
	println!("Generators: {}", registry.names().join(", "));
}

fn print_list_json(documents: &[(String, String)], registry: &GeneratorRegistry) {
	let documents: Vec<serde_json::Value> = documents
		.iter()
		.map(|(rel, content)| {
			let located = locate(content);
			let blocks: Vec<serde_json::Value> = located
				.blocks
				.iter()
				.map(|block| {
					let line = block.opening.start.line;
					let column = block.opening.start.column;
					match block.header() {
						Ok(header) => {
							serde_json::json!({
								"name": header.name,
								"options": header.options,
								"line": line,
								"column": column,
								"registered": registry.contains(&header.name),
							})
						}
						Err(error) => {
							serde_json::json!({
								"name": null,
								"error": error.to_string(),
								"line": line,
								"column": column,
								"registered": false,
							})
						}
					}
				})
				.collect();
			let diagnostics: Vec<serde_json::Value> = located
				.diagnostics
				.iter()
				.map(|diag| {
					serde_json::json!({
						"line": diag.line(),
						"column": diag.column(),
						"message": diag.message(),
					})
				})
				.collect();

			serde_json::json!({
				"file": rel,
				"blocks": blocks,
				"diagnostics": diagnostics,
			})
		})
		.collect();

	let output = serde_json::json!({
		"documents": documents,
		"generators": registry.names(),
	});
	println!("{output}");
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.or_else(|_| path.strip_prefix("."))
		.unwrap_or(path)
		.display()
		.to_string()
}

/// Convert a `ParseDiagnostic` into a warning `miette::Report` with an error
/// code and help text.
fn diagnostic_to_report(diag: &ParseDiagnostic, rel_path: &str) -> miette::Report {
	let location = format!("{rel_path}:{}:{}", diag.line(), diag.column());
	let message = format!("[{location}] {}", diag.message());
	let (code, help) = match diag {
		ParseDiagnostic::UnclosedBlock { .. } => {
			(
				"knit::unclosed_block",
				"add `<!-- /docs -->` after the generated content to close this block",
			)
		}
		ParseDiagnostic::NestedBlock { .. } => {
			(
				"knit::nested_block",
				"blocks cannot be nested; close the outer block before opening another",
			)
		}
		ParseDiagnostic::UnopenedClosing { .. } => {
			(
				"knit::unopened_closing",
				"remove the stray closing marker or add a `<!-- docs NAME -->` opening marker",
			)
		}
		_ => ("knit::diagnostic", "the markers were left untouched"),
	};

	let diag_value = miette::MietteDiagnostic::new(message)
		.with_code(code)
		.with_help(help)
		.with_severity(miette::Severity::Warning);
	miette::Report::new(diag_value)
}
