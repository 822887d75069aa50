//! Concept file editor
//!
//! Adds and removes concepts in a concept list while leaving comments, blank
//! lines and the existing order alone.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;

use super::file::{parse_concept_line, ConceptFile};

/// Consecutive out-of-order entries after which a file is treated as unsorted
const MAX_OUT_OF_ORDER: usize = 5;

/// Editor over a single concept list file
#[derive(Debug, Clone)]
pub struct ConceptFileEditor {
    path: PathBuf,
    file: ConceptFile,
}

impl ConceptFileEditor {
    /// Open a concept list. A missing file starts out empty.
    pub fn open(path: &Path) -> Result<Self> {
        let file = if path.exists() {
            ConceptFile::load(path)?
        } else {
            ConceptFile::parse("")
        };

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn from_file(path: PathBuf, file: ConceptFile) -> Self {
        Self { path, file }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self) -> &ConceptFile {
        &self.file
    }

    pub fn lines(&self) -> &[String] {
        self.file.lines()
    }

    pub fn concepts(&self) -> &[String] {
        self.file.concepts()
    }

    /// Insert a concept in alphabetical position.
    ///
    /// Returns false when the concept is already present.
    /// Input that would not read back as the same concept (a `#` comment
    /// marker or a line break) is rejected as well.
    pub fn add_concept(&mut self, concept: &str) -> bool {
        let concept = concept.trim();
        if concept.contains(['\n', '\r']) || parse_concept_line(concept) != Some(concept) {
            return false;
        }
        if self.file.contains(concept) {
            return false;
        }

        let key = concept.to_lowercase();
        let at = self.insert_position(&key);
        self.insert_line(at, concept, key);
        true
    }

    /// Delete every line holding a concept, whatever its case.
    ///
    /// Returns false when it is not present.
    pub fn remove_concept(&mut self, concept: &str) -> bool {
        let key = concept.trim().to_lowercase();
        if !self.file.index.contains_key(&key) {
            return false;
        }

        self.file.lines.retain(|line| {
            parse_concept_line(line).map(str::to_lowercase).as_deref() != Some(key.as_str())
        });
        self.file.rebuild();
        true
    }

    /// Bring the file in line with `target` and write it out.
    ///
    /// Only lines for removed or added concepts change.
    pub fn save<S: AsRef<str>>(&mut self, target: &[S]) -> Result<()> {
        let target_keys: HashSet<String> = target
            .iter()
            .map(|c| c.as_ref().trim().to_lowercase())
            .collect();

        let removed: Vec<String> = self
            .file
            .concepts
            .iter()
            .filter(|c| !target_keys.contains(&c.to_lowercase()))
            .cloned()
            .collect();
        let added: Vec<&str> = target
            .iter()
            .map(|c| c.as_ref().trim())
            .filter(|c| !c.is_empty() && !self.file.contains(c))
            .collect();

        for concept in &removed {
            self.remove_concept(concept);
        }
        let mut added_count = 0;
        for concept in &added {
            if self.add_concept(concept) {
                added_count += 1;
            }
        }

        self.write()?;
        info!(
            path = %self.path.display(),
            removed = removed.len(),
            added = added_count,
            "saved concept file"
        );
        Ok(())
    }

    /// Write the line buffer as is
    pub fn write(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, self.file.to_content())?;
        Ok(())
    }

    fn insert_position(&self, key: &str) -> usize {
        let mut previous: Option<String> = None;
        let mut out_of_order = 0;
        let mut last_concept_line = None;

        for (i, line) in self.file.lines.iter().enumerate() {
            let Some(existing) = parse_concept_line(line) else {
                continue;
            };
            let existing = existing.to_lowercase();

            if let Some(prev) = &previous {
                if existing < *prev {
                    out_of_order += 1;
                    if out_of_order >= MAX_OUT_OF_ORDER {
                        debug!(path = %self.path.display(), "concept file is unsorted, appending");
                        return self.after_last_non_blank();
                    }
                } else {
                    out_of_order = 0;
                }
            }

            if existing.as_str() > key {
                return i;
            }

            previous = Some(existing);
            last_concept_line = Some(i);
        }

        match last_concept_line {
            Some(i) => i + 1,
            None => self.after_last_non_blank(),
        }
    }

    fn after_last_non_blank(&self) -> usize {
        self.file
            .lines
            .iter()
            .rposition(|l| !l.trim().is_empty())
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    fn insert_line(&mut self, at: usize, concept: &str, key: String) {
        let concept_pos = self.file.index.values().filter(|idx| **idx < at).count();

        for idx in self.file.index.values_mut() {
            if *idx >= at {
                *idx += 1;
            }
        }
        self.file.lines.insert(at, concept.to_string());
        self.file.index.insert(key, at);
        self.file.concepts.insert(concept_pos, concept.to_string());
    }
}
