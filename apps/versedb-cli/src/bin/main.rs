use std::env;
use std::path::PathBuf;

use versedb_cli::{pipeline, snapshot, Engines};
use versedb_core::config::Config;
use versedb_core::traits::ChunkStore;
use versedb_core::types::{Provenance, SearchFilters};
use versedb_core::Error;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <ingest|query|stats> [args...]", prog);
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn snapshot_path(config: &Config) -> PathBuf {
    let path: String = config
        .get("data.snapshot_path")
        .unwrap_or_else(|_| "./data/corpus.json".to_string());
    versedb_core::config::expand_path(path)
}

fn provenance_label(provenance: &[Provenance]) -> String {
    provenance
        .iter()
        .map(|p| match p {
            Provenance::Vector => "vector",
            Provenance::MasterIndex => "index",
            Provenance::Theme => "theme",
        })
        .collect::<Vec<_>>()
        .join("+")
}

fn snippet(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out: String = flat.chars().take(160).collect();
    if flat.chars().count() > 160 {
        out.push_str("...");
    }
    out
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings();
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "ingest" => {
            let data_dir = args.first().map(PathBuf::from).unwrap_or_else(|| {
                let dir: String = config
                    .get("data.corpus_dir")
                    .unwrap_or_else(|_| "./corpus".to_string());
                PathBuf::from(dir)
            });
            println!("Ingesting from {}", data_dir.display());
            let files = pipeline::scan_files(&data_dir);
            if files.is_empty() {
                eprintln!("No source files under {}", data_dir.display());
                std::process::exit(1);
            }
            let engines = Engines::build(&settings);
            let mut documents = 0usize;
            let mut chunks = 0usize;
            for file in &files {
                match engines.ingest_file(file, "/corpus").await {
                    Ok(report) => {
                        documents += 1;
                        chunks += report.chunks;
                    }
                    Err(Error::Ingest(msg)) => {
                        eprintln!("⚠️  Skipping {}: {}", file.display(), msg);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            let stats = engines.rebuild_index().await?;
            let path = snapshot_path(&config);
            snapshot::save(&path, &engines.snapshot().await?)?;
            println!("✅ Ingest complete: {} documents, {} chunks", documents, chunks);
            println!(
                "📊 Index: {} themes, {} keywords, {} book aliases",
                stats.themes, stats.keywords, stats.books
            );
            println!("💾 Snapshot written to {}", path.display());
        }
        "query" => {
            let Some(query_text) = args.first().cloned() else {
                eprintln!("Usage: versedb query \"<query>\" [--limit N] [--doc NAME] [--theme NAME]");
                std::process::exit(1);
            };
            let mut limit = 10usize;
            let mut filters = SearchFilters::default();
            let mut i = 1;
            while i < args.len() {
                match args[i].as_str() {
                    "--limit" => {
                        i += 1;
                        limit = args.get(i).and_then(|v| v.parse().ok()).unwrap_or_else(|| {
                            eprintln!("Error: --limit requires a number");
                            std::process::exit(1)
                        });
                    }
                    "--doc" => {
                        i += 1;
                        match args.get(i) {
                            Some(name) => filters.documents.push(name.clone()),
                            None => {
                                eprintln!("Error: --doc requires a document name");
                                std::process::exit(1);
                            }
                        }
                    }
                    "--theme" => {
                        i += 1;
                        match args.get(i) {
                            Some(name) => filters.themes.push(name.clone()),
                            None => {
                                eprintln!("Error: --theme requires a theme name");
                                std::process::exit(1);
                            }
                        }
                    }
                    other => {
                        eprintln!("Unknown flag: {}", other);
                        std::process::exit(1);
                    }
                }
                i += 1;
            }
            let engines = Engines::build(&settings);
            engines.restore(snapshot::load(&snapshot_path(&config))?).await?;
            let outcome = engines.fusion.search(&query_text, limit, &filters).await?;
            if outcome.is_empty() {
                println!("No relevant information found.");
                if !outcome.suggested_themes.is_empty() {
                    println!("💡 Related themes: {}", outcome.suggested_themes.join(", "));
                }
                if !outcome.suggested_documents.is_empty() {
                    println!(
                        "💡 Related documents: {}",
                        outcome.suggested_documents.join(", ")
                    );
                }
            } else {
                for (rank, result) in outcome.results.iter().enumerate() {
                    println!(
                        "{:>2}. [{:.3}] {} ({})",
                        rank + 1,
                        result.score,
                        result.chunk.exact_reference,
                        provenance_label(&result.provenance)
                    );
                    println!("    {}", snippet(&result.chunk.content));
                }
            }
        }
        "stats" => {
            let engines = Engines::build(&settings);
            let stats = engines
                .restore(snapshot::load(&snapshot_path(&config))?)
                .await?;
            let documents = engines.chunks.documents().await?;
            let all_chunks = engines.chunks.all_chunks().await?;
            let total_tokens: usize = all_chunks.iter().map(|c| c.token_count).sum();
            println!("Documents: {}", documents.len());
            for doc in &documents {
                println!("  {} [{} chunks] {}", doc.name, doc.total_chunks, doc.title);
            }
            println!("Chunks: {} ({} estimated tokens)", all_chunks.len(), total_tokens);
            println!(
                "Index entries: {} ({} themes, {} keywords, {} book aliases)",
                stats.entries, stats.themes, stats.keywords, stats.books
            );
        }
        _ => {
            eprintln!("Unknown command: {}", cmd);
            eprintln!("Usage: versedb <ingest|query|stats> [args...]");
            std::process::exit(1);
        }
    }
    Ok(())
}
