//! `.kicad_pcb` adapter for [`FootprintFields`].
//!
//! Edits are kept in memory and written back as text patches, so every byte
//! outside the edited properties survives a save unchanged.

use crate::footprint::FootprintFields;
use atomicwrites::{AtomicFile, OverwriteBehavior};
use partdb_sexpr::board::{self, BoardFootprint};
use partdb_sexpr::{ParseError, PatchSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse { path: PathBuf, source: ParseError },

    #[error("{} is not a KiCad board: {message}", .path.display())]
    NotABoard { path: PathBuf, message: String },

    #[error("failed to write {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },
}

/// One footprint of an open board plus its pending field edits.
#[derive(Debug, Clone)]
pub struct BoardFootprintFields {
    info: BoardFootprint,
    edits: Vec<(String, String)>,
}

impl BoardFootprintFields {
    pub fn info(&self) -> &BoardFootprint {
        &self.info
    }

    pub fn is_dirty(&self) -> bool {
        !self.edits.is_empty()
    }
}

impl FootprintFields for BoardFootprintFields {
    fn reference(&self) -> String {
        self.info.reference.clone().unwrap_or_default()
    }

    fn field(&self, name: &str) -> Option<String> {
        if let Some((_, value)) = self.edits.iter().find(|(n, _)| n == name) {
            return Some(value.clone());
        }
        self.info.property(name).map(|p| p.value.clone())
    }

    fn set_field(&mut self, name: &str, value: &str) {
        match self.edits.iter_mut().find(|(n, _)| n == name) {
            Some((_, pending)) => *pending = value.to_string(),
            None => self.edits.push((name.to_string(), value.to_string())),
        }
    }

    fn is_dnp(&self) -> bool {
        self.info.is_dnp()
    }

    fn is_excluded_from_bom(&self) -> bool {
        self.info.is_excluded_from_bom()
    }
}

/// An open `.kicad_pcb` file.
#[derive(Debug)]
pub struct BoardDocument {
    path: PathBuf,
    source: String,
    footprints: Vec<BoardFootprintFields>,
}

impl BoardDocument {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BoardError> {
        let path = path.as_ref().to_path_buf();
        let source = std::fs::read_to_string(&path).map_err(|source| BoardError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_source(path, source)
    }

    /// Parse already-loaded board text; `path` is where [`save`](Self::save)
    /// will write.
    pub fn from_source(path: impl Into<PathBuf>, source: String) -> Result<Self, BoardError> {
        let path = path.into();
        let root = partdb_sexpr::parse(&source).map_err(|source| BoardError::Parse {
            path: path.clone(),
            source,
        })?;
        let footprints = board::extract_footprints(&root)
            .map_err(|message| BoardError::NotABoard {
                path: path.clone(),
                message,
            })?
            .into_iter()
            .map(|info| BoardFootprintFields {
                info,
                edits: Vec::new(),
            })
            .collect::<Vec<_>>();
        log::debug!(
            "Opened {} (version {:?}) with {} footprints",
            path.display(),
            board::board_version(&root),
            footprints.len()
        );
        Ok(Self {
            path,
            source,
            footprints,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn footprints(&self) -> &[BoardFootprintFields] {
        &self.footprints
    }

    pub fn footprints_mut(&mut self) -> &mut [BoardFootprintFields] {
        &mut self.footprints
    }

    pub fn is_dirty(&self) -> bool {
        self.footprints.iter().any(BoardFootprintFields::is_dirty)
    }

    /// Board text with every pending edit applied.
    pub fn render(&self) -> Result<String, BoardError> {
        let mut patches = PatchSet::new();
        for fp in &self.footprints {
            for (name, value) in &fp.edits {
                match fp.info.property(name) {
                    Some(existing) if existing.value == *value => {}
                    Some(existing) => patches.replace_string(existing.value_span, value),
                    None => {
                        let uuid = uuid::Uuid::new_v4().to_string();
                        let property = board::hidden_property(&fp.info, name, value, &uuid);
                        patches.insert(
                            fp.info.close_offset(),
                            board::property_insertion(&self.source, &fp.info, &property),
                        );
                    }
                }
            }
        }
        if patches.is_empty() {
            return Ok(self.source.clone());
        }
        log::debug!("Applying {} board patches", patches.len());
        patches.apply(&self.source).map_err(|e| BoardError::Write {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Write pending edits to disk atomically and reload from the new text.
    pub fn save(&mut self) -> Result<(), BoardError> {
        if !self.is_dirty() {
            log::debug!("No pending edits for {}", self.path.display());
            return Ok(());
        }
        let updated = self.render()?;
        AtomicFile::new(&self.path, OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(updated.as_bytes()))
            .map_err(|e| BoardError::Write {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        log::info!("Saved {}", self.path.display());
        *self = Self::from_source(self.path.clone(), updated)?;
        Ok(())
    }
}
