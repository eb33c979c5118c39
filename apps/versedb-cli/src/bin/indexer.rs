use std::env;
use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};

use versedb_cli::{pipeline, snapshot, Engines};
use versedb_core::config::Config;
use versedb_core::Error;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings();

    let args: Vec<String> = env::args().skip(1).collect();
    let mut data_dir = None;
    let mut limit = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--limit" | "-l" => {
                if let Some(n) = args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) {
                    limit = Some(n);
                    i += 1;
                } else {
                    eprintln!("Error: --limit requires a number");
                    std::process::exit(1);
                }
            }
            _ if !args[i].starts_with('-') => data_dir = Some(PathBuf::from(&args[i])),
            _ => {}
        }
        i += 1;
    }
    let data_dir = data_dir.unwrap_or_else(|| {
        let dir: String = config
            .get("data.corpus_dir")
            .unwrap_or_else(|_| "./corpus".to_string());
        PathBuf::from(dir)
    });

    println!("VerseDB Indexer\n===============");
    println!("Data directory: {}", data_dir.display());

    let mut files = pipeline::scan_files(&data_dir);
    if let Some(n) = limit {
        println!("🔢 Limiting to {} files", n);
        files.truncate(n);
    }
    if files.is_empty() {
        eprintln!("No source files under {}", data_dir.display());
        std::process::exit(1);
    }

    let engines = Engines::build(&settings);
    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} {msg}",
    )?);

    let mut documents = 0usize;
    let mut chunks = 0usize;
    let mut overflow = 0usize;
    let mut skipped = 0usize;
    for file in &files {
        let label = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        bar.set_message(label);
        match engines.ingest_file(file, "/corpus").await {
            Ok(report) => {
                documents += 1;
                chunks += report.chunks;
                overflow += report.overflow_chunks;
            }
            Err(Error::Ingest(msg)) => {
                skipped += 1;
                bar.suspend(|| eprintln!("⚠️  Skipping {}: {}", file.display(), msg));
            }
            Err(e) => return Err(e.into()),
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    let stats = engines.rebuild_index().await?;
    let path = versedb_core::config::expand_path(
        config
            .get::<String>("data.snapshot_path")
            .unwrap_or_else(|_| "./data/corpus.json".to_string()),
    );
    snapshot::save(&path, &engines.snapshot().await?)?;

    println!("\n✅ Indexing completed successfully!");
    println!("📊 Processed {} documents into {} chunks", documents, chunks);
    if overflow > 0 {
        println!("⚠️  {} oversize chunks (single indivisible sentence)", overflow);
    }
    if skipped > 0 {
        println!("⚠️  {} files skipped", skipped);
    }
    println!(
        "📊 Index: {} themes, {} keywords, {} book aliases",
        stats.themes, stats.keywords, stats.books
    );
    println!("💾 Snapshot written to {}", path.display());
    println!("\n💡 To query, use: cargo run --bin versedb query '<query>'");
    Ok(())
}
