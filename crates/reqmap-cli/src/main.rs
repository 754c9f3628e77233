#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reqmap")]
#[command(author, version, about = "Flat file maps of everything a package's entry files reach", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Project options shared by the package commands.
#[derive(clap::Args, Debug, Clone)]
struct ProjectArgs {
    /// Project root holding node_modules (default: nearest from cwd)
    #[arg(long, value_name = "PATH")]
    root: Option<PathBuf>,

    /// Config file (default: reqmap.json in the project root, if present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Size guard threshold, in UTF-16 code units of the serialized map
    #[arg(long, value_name = "UNITS")]
    size_limit: Option<u64>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Build the file map of an installed package
    Find {
        /// Package name (e.g. "react" or "@babel/runtime")
        package: String,

        #[command(flatten)]
        project: ProjectArgs,

        /// Print a summary instead of the file map
        #[arg(long)]
        report: bool,

        /// Write the file map to this path instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Build the file maps of several packages in parallel
    Batch {
        /// Package names
        #[arg(required = true)]
        packages: Vec<String>,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// List the specifiers a source file references
    Extract {
        /// Source file to scan
        file: PathBuf,
    },

    /// Resolve a specifier as written in a file
    Resolve {
        /// Specifier (e.g. "./util", "lodash/fp")
        specifier: String,

        /// File the specifier appears in
        #[arg(long, value_name = "FILE")]
        from: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    logging::init(cli.verbose, cli.json);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(cli.json),
        Some(Commands::Find {
            package,
            project,
            report,
            out,
        }) => {
            let project = commands::Project::load(&cwd, project.into())?;
            let out = out.map(|p| commands::absolutize(&cwd, &p));
            commands::find::run(&project, &package, report, out.as_deref(), cli.json)
        }
        Some(Commands::Batch { packages, project }) => {
            let project = commands::Project::load(&cwd, project.into())?;
            commands::batch::run(&project, &packages)
        }
        Some(Commands::Extract { file }) => {
            commands::extract::run(&commands::absolutize(&cwd, &file), cli.json)
        }
        Some(Commands::Resolve { specifier, from }) => {
            let from = commands::absolutize(&cwd, &from);
            let config = commands::Project::discover_config(&from)?;
            commands::resolve::run(&specifier, &from, &config, cli.json)
        }
    }
}

impl From<ProjectArgs> for commands::ProjectOverrides {
    fn from(args: ProjectArgs) -> Self {
        Self {
            root: args.root,
            config: args.config,
            size_limit: args.size_limit,
        }
    }
}
