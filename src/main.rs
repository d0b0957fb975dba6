use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use cms_etl::db::{SqliteSink, DEFAULT_DB_PATH};
use cms_etl::loader;
use cms_etl::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "cms-etl", about = "Transform CMS export JSON into structured records")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available project corpora under the source root
    List {
        /// Source root directory
        #[arg(short, long, default_value = "cms-source")]
        root: PathBuf,
    },
    /// Load, parse, and store one project corpus
    Run {
        /// Source root directory
        #[arg(short, long, default_value = "cms-source")]
        root: PathBuf,
        /// Project (corpus) name under the root
        #[arg(short, long)]
        project: String,
        /// Document kind to load (template allow-list)
        #[arg(short, long, default_value = "article")]
        kind: String,
        /// Max documents to process (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Worker threads for the parse phase (default: all cores)
        #[arg(short, long)]
        jobs: Option<usize>,
        /// SQLite database path
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: PathBuf,
    },
    /// Show stored record counts
    Stats {
        /// SQLite database path
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List { root } => {
            let projects = loader::list_projects(&root)?;
            if projects.is_empty() {
                println!("No project directories under {}", root.display());
            } else {
                for p in &projects {
                    println!("{}", p);
                }
                println!("\n{} corpora", projects.len());
            }
            Ok(())
        }
        Commands::Run { root, project, kind, limit, jobs, db } => {
            if let Some(jobs) = jobs {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(jobs)
                    .build_global()?;
            }
            let mut sink = SqliteSink::open(&db)?;
            let mut pipeline = Pipeline::new(&mut sink).with_progress();
            let counts = pipeline.run(&root, &project, &kind, limit)?;
            println!("Stored {}", counts.summary());
            Ok(())
        }
        Commands::Stats { db } => {
            let sink = SqliteSink::open(&db)?;
            let s = sink.stats()?;
            println!("Documents:    {}", s.documents);
            println!("Sections:     {}", s.sections);
            println!("Topic refs:   {}", s.topic_refs);
            println!("Attachments:  {}", s.attachments);
            println!("Terms:        {}", s.terms);
            println!("Last updates: {}", s.last_updates);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}
