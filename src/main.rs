use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn, LevelFilter};

use crate::config::ArrayJob;
use crate::error::Error;
use crate::mount::MountAlias;
use crate::recipe::Recipe;
use crate::write::{clear_file, write_commands};

/// Array job settings, read from JSON and overridden by CLI options
mod config;
mod error;
/// Translate workstation paths to the cluster's mount root
mod mount;
/// Read YAML recipe values
mod recipe;
/// Enumerate experiment, session, and channel directories
mod scan;
/// Render job array scripts and submit them with sbatch
mod slurm;
mod write;

/// Prepare SLURM job arrays for image processing runs on shared storage
#[derive(Parser, Debug)]
#[command(name = "hpcprep", author, version, about, long_about = None)]
struct Cli {
    /// Log more (-v info, -vv debug). RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every entry directly inside a rawdata directory
    Experiments { rawdata_dir: PathBuf },
    /// List ses* directories at any depth inside a rawdata directory
    Sessions { rawdata_dir: PathBuf },
    /// List the stitched channel images of one brain
    Channels { mouse_id: String, brain_dir: PathBuf },
    /// Print a recipe value as JSON
    Recipe {
        path: PathBuf,
        #[arg(long, default_value = recipe::VOXEL_SIZE)]
        key: String,
    },
    /// Rewrite paths so they're valid under the cluster's base root (reads stdin without PATHS)
    Translate {
        #[arg(long, env = "HPCPREP_BASE_ROOT")]
        base_root: PathBuf,
        #[command(flatten)]
        mount: MountArgs,
        paths: Vec<PathBuf>,
    },
    /// Write a commands file and the job array script that runs it
    Prepare(PrepareArgs),
    /// Create or empty a file
    Clear { file: PathBuf },
}

#[derive(Args, Debug)]
struct MountArgs {
    /// First segment of locally mounted shared volumes
    #[arg(long, env = "HPCPREP_MOUNT_MARKER", default_value = mount::DEFAULT_MARKER)]
    mount_marker: String,
}

impl MountArgs {
    fn alias(&self) -> MountAlias {
        MountAlias::new(&self.mount_marker)
    }
}

#[derive(Args, Debug)]
struct PrepareArgs {
    /// One command per line (default: stdin)
    #[arg(long)]
    commands_in: Option<PathBuf>,
    /// Commands file read by the array tasks
    #[arg(long)]
    commands_out: PathBuf,
    /// Where to write the job array script
    #[arg(long)]
    script_out: PathBuf,
    /// Path of the commands file as seen from the cluster
    #[arg(long)]
    remote_commands: Option<PathBuf>,
    /// Cluster base root, used to translate the commands file path
    #[arg(long, env = "HPCPREP_BASE_ROOT")]
    base_root: Option<PathBuf>,
    #[command(flatten)]
    mount: MountArgs,
    /// JSON array job settings
    #[arg(long, env = "HPCPREP_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    /// Time limit, e.g. 3-0:0
    #[arg(long)]
    time: Option<String>,
    /// Memory limit in GB
    #[arg(long)]
    mem: Option<u32>,
    #[arg(long)]
    max_concurrent: Option<u32>,
    #[arg(long)]
    partition: Option<String>,
    #[arg(long)]
    gres: Option<String>,
    /// Environment modules to load, replaces the configured list
    #[arg(long = "module")]
    modules: Vec<String>,
    /// Conda environments to activate, replaces the configured list
    #[arg(long = "conda")]
    conda_environments: Vec<String>,
    /// Keep existing commands instead of clearing the commands file first
    #[arg(long)]
    append: bool,
    /// Submit the script with sbatch after writing it
    #[arg(long)]
    submit: bool,
    #[arg(long, env = "HPCPREP_SBATCH", default_value = slurm::submit::SBATCH)]
    sbatch: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    info!("terve! starting up :)");

    match cli.command {
        Command::Experiments { rawdata_dir } => print_paths(&scan::experiment_directories(&rawdata_dir)?),
        Command::Sessions { rawdata_dir } => print_paths(&scan::session_directories(&rawdata_dir)?),
        Command::Channels { mouse_id, brain_dir } => print_paths(&scan::channel_paths(&mouse_id, &brain_dir)?),
        Command::Recipe { path, key } => {
            let recipe = Recipe::load(&path)?;
            let json = if key == recipe::VOXEL_SIZE {
                serde_json::to_string(&recipe.voxel_sizes()?)?
            } else {
                serde_json::to_string(recipe.value(&key)?)?
            };
            println!("{json}");
        }
        Command::Translate { base_root, mount: mount_args, paths } => {
            let paths = match paths.is_empty() {
                true => read_lines(io::stdin().lock())?.into_iter().map(PathBuf::from).collect(),
                false => paths,
            };
            print_paths(&mount::translate_all(&mount_args.alias(), &base_root, &paths));
        }
        Command::Prepare(args) => prepare(&args)?,
        Command::Clear { file } => clear_file(&file)?,
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn print_paths(paths: &[PathBuf]) {
    for path in paths {
        println!("{}", path.display());
    }
}

/// Non-blank lines, trimmed
fn read_lines(reader: impl BufRead) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line.context("Can't read input")?;
        let line = line.trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    Ok(lines)
}

fn prepare(args: &PrepareArgs) -> Result<()> {
    let job = array_job(args)?;

    let commands = match &args.commands_in {
        Some(path) => {
            let file = fs::File::open(path).with_context(|| format!("Can't open {}", path.display()))?;
            read_lines(io::BufReader::new(file))?
        }
        None => read_lines(io::stdin().lock())?,
    };
    if commands.is_empty() {
        warn!("No commands given");
        // keep the existing commands file intact
        if !args.append {
            return Err(Error::EmptyArray.into());
        }
    }

    if !args.append {
        clear_file(&args.commands_out)?;
    }
    write_commands(&args.commands_out, &commands)?;

    // sed -n "Np" counts every physical line, including any blank ones already in the file
    let n_jobs = fs::read_to_string(&args.commands_out)
        .with_context(|| format!("Can't read back {}", args.commands_out.display()))?
        .lines()
        .count();

    let remote = remote_commands_path(args)?;
    info!("Array tasks will read commands from {}", remote.display());

    let script = job.render(&remote, n_jobs)?;
    let job_path = script.write(&args.script_out)?;
    println!("{}", job_path.path.display());

    if args.submit {
        let job_id = job_path.submit(&args.sbatch)?;
        println!("{job_id}");
    }

    Ok(())
}

/// Settings file (or defaults) with command line overrides applied
fn array_job(args: &PrepareArgs) -> Result<ArrayJob> {
    let mut job = match &args.config {
        Some(path) => ArrayJob::load(path)?,
        None => ArrayJob::default(),
    };

    if let Some(name) = &args.name { job.name = name.clone() }
    if let Some(email) = &args.email { job.email = Some(email.clone()) }
    if let Some(time) = &args.time { job.time_limit = time.clone() }
    if let Some(mem) = args.mem { job.memory_limit = mem }
    if let Some(n) = args.max_concurrent { job.max_concurrent = n }
    if let Some(partition) = &args.partition { job.partition = partition.clone() }
    if let Some(gres) = &args.gres { job.gres = Some(gres.clone()) }
    if !args.modules.is_empty() { job.modules = args.modules.clone() }
    if !args.conda_environments.is_empty() { job.conda_environments = args.conda_environments.clone() }

    Ok(job)
}

fn remote_commands_path(args: &PrepareArgs) -> Result<PathBuf> {
    if let Some(remote) = &args.remote_commands {
        return Ok(remote.clone());
    }

    let local = absolute(&args.commands_out)?;
    Ok(match &args.base_root {
        Some(base_root) => args.mount.alias().translate(base_root, &local),
        None => local,
    })
}

fn absolute(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).with_context(|| format!("Can't resolve {}", path.display()))
}
