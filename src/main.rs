use clap::{Parser, Subcommand};
use learntrack::saving::{ProfileSnapshot, load_snapshot, save_snapshot};
use learntrack::{Catalog, Config, JsonFileStore, ProgressSession};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "learntrack")]
#[command(about = "Inspect and update course progress in a learntrack database")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "LEARNTRACK_CONFIG")]
    config: Option<PathBuf>,

    /// Progress database directory (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Curriculum catalog (overrides config)
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a learner's dashboard for a course
    Status { user: String, course: String },
    /// Mark a sub-module completed
    Complete {
        user: String,
        course: String,
        level: String,
        submodule: String,
    },
    /// Submit quiz answers for a level (option index per question, "-" to skip)
    Quiz {
        user: String,
        course: String,
        level: String,
        answers: Vec<String>,
    },
    /// Search level and sub-module titles of a course
    Search { course: String, query: String },
    /// Write every record of a learner to a .bin.gz snapshot
    Export { user: String, file: PathBuf },
    /// Merge a .bin.gz snapshot into the database
    Import { file: PathBuf },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("learntrack=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(catalog) = args.catalog {
        config.catalog_path = catalog;
    }

    let store = JsonFileStore::open(&config.data_dir)?;

    match args.command {
        Command::Status { user, course } => {
            let catalog = Catalog::load(&config.catalog_path)?;
            let mut session = ProgressSession::new(user, &catalog, &store);
            let dash = session.dashboard(&course)?;
            println!("{} ({}%)", dash.title, dash.percent);
            for level in &dash.levels {
                let marker = if level.completed {
                    "done"
                } else if level.accessible {
                    "open"
                } else {
                    "locked"
                };
                print!("  [{:>6}] {:<30} {:>3}%", marker, level.title, level.percent);
                match &level.current_submodule {
                    Some(next) => println!("  next: {}", next),
                    None => println!(),
                }
            }
        }
        Command::Complete {
            user,
            course,
            level,
            submodule,
        } => {
            let catalog = Catalog::load(&config.catalog_path)?;
            let mut session = ProgressSession::new(user, &catalog, &store);
            let outcome = session.complete_submodule(&course, &level, &submodule)?;
            println!("level {}% complete", outcome.level_percent);
            if outcome.level_completed {
                println!("level {} completed", level);
            }
            if let Some(next) = outcome.next_submodule {
                println!("next: {}", next);
            }
        }
        Command::Quiz {
            user,
            course,
            level,
            answers,
        } => {
            let catalog = Catalog::load(&config.catalog_path)?;
            let answers: Vec<Option<usize>> = answers.iter().map(|a| a.parse().ok()).collect();
            let mut session = ProgressSession::new(user, &catalog, &store);
            let outcome = session.submit_quiz(&course, &level, &answers)?;
            println!(
                "{}/{} correct ({}%) - {}",
                outcome.result.correct,
                outcome.result.total,
                outcome.result.percent,
                if outcome.result.passed { "passed" } else { "failed" }
            );
        }
        Command::Search { course, query } => {
            let catalog = Catalog::load(&config.catalog_path)?;
            for hit in catalog.course(&course)?.search(&query) {
                match hit.submodule {
                    Some(sub) => println!("{}/{}: {}", hit.level, sub, hit.title),
                    None => println!("{}: {}", hit.level, hit.title),
                }
            }
        }
        Command::Export { user, file } => {
            let snapshot = ProfileSnapshot::capture(&store, &user)?;
            save_snapshot(&snapshot, &file)?;
            println!("exported {} scopes to {}", snapshot.scopes.len(), file.display());
        }
        Command::Import { file } => {
            let snapshot = load_snapshot(&file)?;
            snapshot.restore(&store)?;
            println!("imported {} scopes for {}", snapshot.scopes.len(), snapshot.user);
        }
    }

    Ok(())
}
