use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use fastclone::process::tool_available;
use fastclone::{CacheKey, CachePaths, CacheStore, CloneOutcome, FastClone, RepoRef};

#[derive(Parser)]
#[command(
    name = "fastclone",
    about = "Clone git repositories through a local tarball cache"
)]
struct Cli {
    /// Cache directory (default: <user cache dir>/fastclone)
    #[arg(long, global = true, env = "FASTCLONE_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Seconds before a cached archive is rebuilt
    #[arg(long, global = true, env = "FASTCLONE_MAX_AGE", default_value_t = 86400)]
    max_age: u64,

    /// Log every git and tar invocation
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone a repository, reusing the cached copy when fresh
    Clone {
        /// Repository URL
        url: String,

        /// Destination directory (created if missing)
        path: PathBuf,

        /// Branch or ref to check out instead of pulling the default branch
        #[arg(short, long)]
        branch: Option<String>,
    },

    /// List cached archives
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the cache key and files for a URL
    Key {
        /// Repository URL
        url: String,
    },

    /// Check dependencies
    Doctor,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let store = store_from(&cli);

    let result = match cli.command {
        Commands::Clone { url, path, branch } => cmd_clone(store, url, path, branch),
        Commands::List { json } => cmd_list(&store, json),
        Commands::Key { url } => cmd_key(&store, &url),
        Commands::Doctor => cmd_doctor(&store),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn store_from(cli: &Cli) -> CacheStore {
    let paths = match &cli.cache_dir {
        Some(dir) => CachePaths::new(dir),
        None => CachePaths::default(),
    };
    CacheStore::new(paths).with_max_age(Duration::from_secs(cli.max_age))
}

fn cmd_clone(
    store: CacheStore,
    url: String,
    path: PathBuf,
    branch: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut repo = RepoRef::new(url);
    if let Some(branch) = branch {
        repo = repo.with_branch(branch);
    }

    let outcome = FastClone::new(store).clone_into(&repo, &path)?;

    let source = match outcome {
        CloneOutcome::Hit => "cache",
        CloneOutcome::Populated => "fresh clone",
    };
    println!("Cloned {} into {} (from {})", repo, path.display(), source);

    Ok(())
}

fn cmd_list(store: &CacheStore, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let entries = store.entries()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No repositories cached in {}", store.root().display());
        return Ok(());
    }

    println!("{:<58} {:>12} {:>10} {:>6}", "KEY", "SIZE", "AGE", "FRESH");
    println!("{}", "-".repeat(90));

    for entry in entries {
        println!(
            "{:<58} {:>12} {:>10} {:>6}",
            entry.key.as_str(),
            entry.size_bytes,
            format_duration(entry.age_secs),
            if entry.fresh { "yes" } else { "no" }
        );
    }

    Ok(())
}

fn cmd_key(store: &CacheStore, url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let key = CacheKey::derive(url);
    println!("Key:     {}", key);
    println!("Archive: {}", store.paths().archive_path(&key).display());
    println!("Lock:    {}", store.paths().lock_path(&key).display());
    println!(
        "Fresh:   {}",
        if store.is_fresh(&key) { "yes" } else { "no" }
    );
    Ok(())
}

fn cmd_doctor(store: &CacheStore) -> Result<(), Box<dyn std::error::Error>> {
    println!("fastclone System Check\n");

    let git_ok = tool_available("git", "--version");
    println!(
        "[{}] git: {}",
        if git_ok { "OK" } else { "FAIL" },
        if git_ok { "available" } else { "not found" }
    );

    let tar_ok = tool_available("tar", "--version");
    println!(
        "[{}] tar: {}",
        if tar_ok { "OK" } else { "FAIL" },
        if tar_ok { "available" } else { "not found" }
    );

    let cache_ok = store.root().is_dir();
    println!(
        "[{}] Cache dir: {}",
        if cache_ok { "OK" } else { "INFO" },
        store.root().display()
    );

    if !git_ok || !tar_ok {
        std::process::exit(1);
    }

    Ok(())
}

fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}
