// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::Deck;

use super::{DocumentEngine, EngineError, WriteDurability};

/// Stores a [`Deck`] as pretty-printed JSON, whatever the file extension.
#[derive(Debug, Default, Clone)]
pub struct JsonDeckEngine {
    durability: WriteDurability,
}

impl JsonDeckEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }
}

impl DocumentEngine for JsonDeckEngine {
    type Document = Deck;

    fn load(&self, path: &Path) -> Result<Deck, EngineError> {
        let bytes = fs::read(path).map_err(|source| io_error(path, source))?;
        serde_json::from_slice(&bytes).map_err(|source| json_error(path, source))
    }

    fn save(&self, document: &Deck, path: &Path) -> Result<(), EngineError> {
        let mut contents =
            serde_json::to_vec_pretty(document).map_err(|source| json_error(path, source))?;
        contents.push(b'\n');
        write_atomic(path, &contents, self.durability)
    }

    fn create(&self) -> Deck {
        Deck::new()
    }
}

fn io_error(path: &Path, source: io::Error) -> EngineError {
    EngineError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn json_error(path: &Path, source: serde_json::Error) -> EngineError {
    EngineError::Json {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes `contents` to a sibling temp file and renames it over `path`, so readers never
/// observe a partially written document.
fn write_atomic(
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), EngineError> {
    match fs::symlink_metadata(path) {
        Ok(md) if md.file_type().is_symlink() => {
            return Err(EngineError::SymlinkRefused {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => return Err(io_error(path, source)),
    }

    let Some(file_name) = path.file_name() else {
        return Err(io_error(path, io::Error::other("path has no file name")));
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = parent.join(format!(
        ".decksmith.tmp.{}.{}.{}",
        file_name.to_string_lossy(),
        std::process::id(),
        nanos
    ));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|source| io_error(&tmp_path, source))?;

    let written = file.write_all(contents).and_then(|()| {
        if durability == WriteDurability::Durable {
            file.sync_all()
        } else {
            Ok(())
        }
    });
    drop(file);
    if let Err(source) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(io_error(&tmp_path, source));
    }

    if let Err(source) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(io_error(path, source));
    }

    if durability == WriteDurability::Durable {
        #[cfg(unix)]
        {
            let dir = fs::File::open(parent).map_err(|source| io_error(parent, source))?;
            dir.sync_all().map_err(|source| io_error(parent, source))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{DocumentEngine, EngineError, JsonDeckEngine, WriteDurability};
    use crate::model::{Deck, Shape, Slide};

    static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    struct TempDir {
        path: PathBuf,
    }

    impl TempDir {
        fn new(prefix: &str) -> Self {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos();
            let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
            let mut path = std::env::temp_dir();
            path.push(format!("decksmith-{prefix}-{}-{nanos}-{counter}", std::process::id()));
            std::fs::create_dir_all(&path).expect("create temp dir");
            Self { path }
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }

    fn sample_deck() -> Deck {
        let mut deck = Deck::new();
        let shape_id = deck.allocate_shape_id().expect("shape id");
        let mut slide = Slide::new();
        slide.shapes_mut().push(Shape::new(shape_id, "Hello"));
        deck.slides_mut().push(slide);
        deck
    }

    #[test]
    fn save_replaces_existing_file_without_leaving_temp_files() {
        let tmp = TempDir::new("engine-save");
        let path = tmp.path.join("deck.pptx");
        std::fs::write(&path, b"stale").expect("seed file");

        let engine = JsonDeckEngine::new().with_durability(WriteDurability::Durable);
        engine.save(&sample_deck(), &path).expect("save deck");

        let loaded = engine.load(&path).expect("load deck");
        assert_eq!(loaded, sample_deck());

        let leftovers = std::fs::read_dir(&tmp.path)
            .expect("read dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".decksmith.tmp."))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn load_reports_missing_and_malformed_files_with_path() {
        let tmp = TempDir::new("engine-load");
        let engine = JsonDeckEngine::new();

        let missing = tmp.path.join("missing.pptx");
        let err = engine.load(&missing).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
        assert_eq!(err.path(), missing.as_path());

        let malformed = tmp.path.join("broken.pptx");
        std::fs::write(&malformed, b"{not json").expect("seed file");
        let err = engine.load(&malformed).unwrap_err();
        assert!(matches!(err, EngineError::Json { .. }));
        assert!(err.to_string().contains("broken.pptx"));
    }

    #[cfg(unix)]
    #[test]
    fn save_refuses_symlink_targets() {
        let tmp = TempDir::new("engine-symlink");
        let target = tmp.path.join("real.pptx");
        std::fs::write(&target, b"{}").expect("seed file");
        let link = tmp.path.join("link.pptx");
        std::os::unix::fs::symlink(&target, &link).expect("create symlink");

        let err = JsonDeckEngine::new().save(&Deck::new(), &link).unwrap_err();
        assert!(matches!(err, EngineError::SymlinkRefused { .. }));
        assert_eq!(std::fs::read(&target).expect("read target"), b"{}");
    }
}
