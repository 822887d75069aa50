//! Concept list files
//!
//! One concept per line. Everything after the first `#` is a comment and
//! blank lines are ignored.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Concept on a raw line, if any
pub fn parse_concept_line(line: &str) -> Option<&str> {
    let content = match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    };
    let content = content.trim();
    (!content.is_empty()).then_some(content)
}

/// All concepts in file content, in file order
pub fn parse_concepts(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(parse_concept_line)
        .map(str::to_string)
        .collect()
}

/// Raw lines of a concept list plus the concepts found on them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConceptFile {
    pub(crate) lines: Vec<String>,
    pub(crate) concepts: Vec<String>,
    /// Lowercased concept -> line index
    pub(crate) index: HashMap<String, usize>,
    pub(crate) trailing_newline: bool,
    /// Lines were terminated with `\r\n`
    pub(crate) crlf: bool,
}

impl ConceptFile {
    pub fn parse(content: &str) -> Self {
        let lines = content.lines().map(str::to_string).collect();
        let mut file = Self {
            lines,
            concepts: Vec::new(),
            index: HashMap::new(),
            trailing_newline: content.is_empty() || content.ends_with('\n'),
            crlf: content.contains("\r\n"),
        };
        file.rebuild();
        file
    }

    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut file = Self {
            lines: lines.iter().map(|l| l.as_ref().to_string()).collect(),
            concepts: Vec::new(),
            index: HashMap::new(),
            trailing_newline: true,
            crlf: false,
        };
        file.rebuild();
        file
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn concepts(&self) -> &[String] {
        &self.concepts
    }

    pub fn contains(&self, concept: &str) -> bool {
        self.index.contains_key(&concept.trim().to_lowercase())
    }

    /// Line index of a concept
    pub fn line_of(&self, concept: &str) -> Option<usize> {
        self.index.get(&concept.trim().to_lowercase()).copied()
    }

    /// File content with comments and blank lines kept
    pub fn to_content(&self) -> String {
        let eol = if self.crlf { "\r\n" } else { "\n" };
        let mut content = self.lines.join(eol);
        if self.trailing_newline && !self.lines.is_empty() {
            content.push_str(eol);
        }
        content
    }

    /// Recompute concepts and the index from the line buffer.
    ///
    /// A concept listed twice keeps its first line.
    pub(crate) fn rebuild(&mut self) {
        self.concepts.clear();
        self.index.clear();
        for (i, line) in self.lines.iter().enumerate() {
            if let Some(concept) = parse_concept_line(line) {
                let key = concept.to_lowercase();
                if !self.index.contains_key(&key) {
                    self.index.insert(key, i);
                    self.concepts.push(concept.to_string());
                }
            }
        }
    }
}
