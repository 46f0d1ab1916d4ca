use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Keep generated regions of markdown and quarto documents up to date.",
	long_about = "knit rewrites the regions of your documents that are delimited by \
	              `<!-- docs NAME key=value -->` and `<!-- /docs -->` comments. The region \
	              body is regenerated by the named generator (for example TREE or JUST) and \
	              everything outside the markers is left untouched.\n\nQuick start:\n  knit \
	              sync           Regenerate every block\n  knit sync --check   Fail when a \
	              block is out of date\n  knit clear          Empty every block\n  knit list  \
	              Show blocks and registered generators"
)]
pub struct KnitCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Regenerate every block in the given documents.
	///
	/// Directories are searched recursively for documents with the configured
	/// extensions (`md` and `qmd` by default). Documents are only written when
	/// their content changes.
	Sync {
		/// Documents or directories to process.
		#[arg(default_value = ".")]
		paths: Vec<PathBuf>,

		/// Report which documents would change without writing them. Exits
		/// with status 1 when any document is out of date.
		#[arg(long, default_value_t = false)]
		check: bool,

		/// Show a line diff for each document that changes.
		#[arg(long, default_value_t = false)]
		diff: bool,
	},
	/// Empty every block in the given documents, keeping the markers.
	Clear {
		/// Documents or directories to process.
		#[arg(default_value = ".")]
		paths: Vec<PathBuf>,

		/// Report which documents would change without writing them. Exits
		/// with status 1 when any document still has block content.
		#[arg(long, default_value_t = false)]
		check: bool,
	},
	/// List the blocks in the given documents and the registered generators.
	List {
		/// Documents or directories to inspect.
		#[arg(default_value = ".")]
		paths: Vec<PathBuf>,

		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
