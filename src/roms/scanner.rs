//! Reconcile the ROM catalog with the ROM directory.
//!
//! ```text
//! {roms_dir}/{console}/{game}.{ext}            flat layout
//! {roms_dir}/{console}/{game}/{disk}.{ext}     one directory per game
//! ```
//!
//! The per-game layout is only consulted for consoles with no ROM files
//! directly inside their directory.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::store::{RomStore, StoreError};

/// Lower-case extensions recognised as ROM images or archives.
pub const ROM_EXTENSIONS: &[&str] = &[
    // disc images
    "iso", "bin", "cue", "img", "chd", "mdf",
    // cartridges
    "sfc", "smc", "nes", "z64", "n64", "v64", "gb", "gbc", "gba", "nds", "md", "gen", "smd",
    "pce",
    // xbox
    "xbe", "xiso",
    // arcade, neo geo
    "zip",
    // amiga disks and archives
    "dsk", "adf", "adz", "ipf", "lha", "lzx",
];

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("ROMS_DIR not configured")]
    NotConfigured,

    #[error("ROMS_DIR path does not exist: {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read ROM directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("scan task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredRom {
    pub filename: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleDir {
    pub console: String,
    pub roms: Vec<DiscoveredRom>,
}

/// Response body of `POST /api/roms/scan`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub success: bool,
    pub consoles: Vec<String>,
    pub added: u64,
    pub already_present: u64,
    pub marked_unavailable: u64,
}

pub fn is_rom_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ROM_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Immediate children of `dir`, sorted by name.
fn children(dir: &Path) -> impl Iterator<Item = walkdir::Result<DirEntry>> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
}

fn entry_name(entry: &DirEntry) -> Option<String> {
    entry.file_name().to_str().map(str::to_string)
}

/// Walk `root` and list every console directory with the games found in it.
pub fn discover(root: &Path) -> Result<Vec<ConsoleDir>, walkdir::Error> {
    let mut consoles = Vec::new();

    for entry in children(root) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(console) = entry_name(&entry) else {
            tracing::warn!(path = %entry.path().display(), "Skipping non UTF-8 console directory");
            continue;
        };

        let mut roms = Vec::new();
        let mut game_dirs = Vec::new();
        for child in children(entry.path()) {
            let child = child?;
            let Some(name) = entry_name(&child) else {
                continue;
            };
            if child.file_type().is_file() && is_rom_file(child.path()) {
                let title = child
                    .path()
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(&name)
                    .to_string();
                roms.push(DiscoveredRom {
                    filename: name,
                    title,
                });
            } else if child.file_type().is_dir() {
                game_dirs.push((name, child.into_path()));
            }
        }

        if roms.is_empty() {
            for (name, path) in game_dirs {
                let mut has_rom = false;
                for file in children(&path) {
                    let file = file?;
                    if file.file_type().is_file() && is_rom_file(file.path()) {
                        has_rom = true;
                        break;
                    }
                }
                if has_rom {
                    roms.push(DiscoveredRom {
                        filename: name.clone(),
                        title: name,
                    });
                }
            }
        }

        consoles.push(ConsoleDir { console, roms });
    }

    Ok(consoles)
}

/// Scan `roms_dir` and bring `store` in line with it.
///
/// Rows are written console by console; a failure part way leaves earlier
/// consoles updated.
pub async fn scan(store: &dyn RomStore, roms_dir: Option<&Path>) -> Result<ScanSummary, ScanError> {
    let root = roms_dir.ok_or(ScanError::NotConfigured)?.to_path_buf();
    if !tokio::fs::try_exists(&root).await.unwrap_or(false) {
        return Err(ScanError::Missing(root));
    }

    let walk_root = root.clone();
    let consoles = tokio::task::spawn_blocking(move || discover(&walk_root)).await??;

    let mut summary = ScanSummary {
        success: true,
        ..Default::default()
    };

    for dir in consoles {
        let mut present = Vec::with_capacity(dir.roms.len());
        for rom in &dir.roms {
            if store
                .upsert_discovered(&dir.console, &rom.filename, &rom.title)
                .await?
            {
                summary.added += 1;
            } else {
                summary.already_present += 1;
            }
            present.push(rom.filename.clone());
        }
        summary.marked_unavailable += store.mark_missing(&dir.console, &present).await?;

        tracing::debug!(console = %dir.console, roms = dir.roms.len(), "Console scanned");
        summary.consoles.push(dir.console);
    }

    tracing::info!(
        root = %root.display(),
        consoles = summary.consoles.len(),
        added = summary.added,
        already_present = summary.already_present,
        marked_unavailable = summary.marked_unavailable,
        "ROM scan complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RomFilter;
    use crate::store::MemoryStore;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"rom").unwrap();
    }

    #[test]
    fn test_is_rom_file() {
        assert!(is_rom_file(Path::new("Super Mario World.SFC")));
        assert!(is_rom_file(Path::new("a/b.chd")));
        assert!(!is_rom_file(Path::new("readme.txt")));
        assert!(!is_rom_file(Path::new("noext")));
    }

    #[test]
    fn test_discover_layouts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("snes/Chrono Trigger.sfc"));
        touch(&root.join("snes/notes.txt"));
        touch(&root.join("snes/extras/ignored.sfc"));
        touch(&root.join("amiga/Lemmings/disk1.adf"));
        touch(&root.join("amiga/Docs/manual.pdf"));
        fs::create_dir_all(root.join("empty")).unwrap();
        touch(&root.join("stray.iso"));

        let consoles = discover(root).unwrap();
        let names: Vec<&str> = consoles.iter().map(|c| c.console.as_str()).collect();
        assert_eq!(names, vec!["amiga", "empty", "snes"]);

        assert_eq!(
            consoles[0].roms,
            vec![DiscoveredRom {
                filename: "Lemmings".into(),
                title: "Lemmings".into()
            }]
        );
        assert!(consoles[1].roms.is_empty());
        assert_eq!(
            consoles[2].roms,
            vec![DiscoveredRom {
                filename: "Chrono Trigger.sfc".into(),
                title: "Chrono Trigger".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_scan_reconciles_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("nes/Zelda.nes"));
        touch(&root.join("nes/Metroid.nes"));

        let store = MemoryStore::new();
        let first = scan(&store, Some(root)).await.unwrap();
        assert_eq!(first.added, 2);
        assert_eq!(first.already_present, 0);
        assert_eq!(first.consoles, vec!["nes".to_string()]);

        fs::remove_file(root.join("nes/Metroid.nes")).unwrap();
        let second = scan(&store, Some(root)).await.unwrap();
        assert_eq!(second.added, 0);
        assert_eq!(second.already_present, 1);
        assert_eq!(second.marked_unavailable, 1);

        let games = store.list_games(&RomFilter::default()).await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].title, "Zelda");
    }

    #[tokio::test]
    async fn test_scan_requires_directory() {
        let store = MemoryStore::new();
        assert!(matches!(scan(&store, None).await, Err(ScanError::NotConfigured)));
        assert!(matches!(
            scan(&store, Some(Path::new("/definitely/not/here"))).await,
            Err(ScanError::Missing(_))
        ));
    }

    #[test]
    fn test_summary_serialises_camel_case() {
        let json = serde_json::to_value(ScanSummary {
            success: true,
            consoles: vec!["nes".into()],
            added: 1,
            already_present: 2,
            marked_unavailable: 3,
        })
        .unwrap();
        assert_eq!(json["alreadyPresent"], 2);
        assert_eq!(json["markedUnavailable"], 3);
    }
}
