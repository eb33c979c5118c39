//! JSON corpus snapshot so ingest and query can run as separate invocations.

use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use versedb_core::types::{Chunk, Document};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub documents: Vec<Document>,
    pub chunks: Vec<Chunk>,
}

/// Write the snapshot atomically: serialize to a sibling temp file, then
/// rename over the target, so a crash mid-write never leaves a torn file.
pub fn save(path: &Path, snapshot: &Snapshot) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("tmp");
    let file = fs::File::create(&tmp)?;
    serde_json::to_writer(BufWriter::new(file), snapshot)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load(path: &Path) -> anyhow::Result<Snapshot> {
    let file = fs::File::open(path)
        .map_err(|e| anyhow::anyhow!("cannot open snapshot '{}': {}", path.display(), e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn save_then_load_round_trips_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        let snapshot = Snapshot {
            documents: vec![Document {
                name: "gita".to_string(),
                title: "Bhagavad Gita".to_string(),
                category: "/scripture".to_string(),
                languages: vec!["en".to_string()],
                total_chunks: 0,
                metadata: HashMap::new(),
            }],
            chunks: Vec::new(),
        };
        save(&path, &snapshot).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.documents.len(), 1);
        assert_eq!(loaded.documents[0].name, "gita");
        assert!(!path.with_extension("tmp").exists());
    }
}
