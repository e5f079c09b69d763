//! Sentiment lexicon: a plain term → valence table
//!
//! The table is data, not code. The bundled default lives in
//! `data/lexicon.tsv`; deployments can point `scoring.lexicon_path` at their
//! own file in the same format.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_LEXICON: &str = include_str!("../../data/lexicon.tsv");

/// Largest accepted magnitude for a term's valence
pub const MAX_VALENCE: f64 = 4.0;

/// Errors that can occur while loading a lexicon
#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("Failed to read lexicon {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid lexicon entry at line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },

    #[error("Lexicon contains no entries")]
    Empty,
}

/// Term → valence table
#[derive(Debug, Clone, PartialEq)]
pub struct Lexicon {
    entries: HashMap<String, f64>,
}

impl Lexicon {
    /// Parse the `term<TAB>valence` text format
    ///
    /// Blank lines and lines starting with `#` are ignored. Terms are
    /// lowercased; when a term repeats, the last entry wins. Valences must
    /// lie in `[-MAX_VALENCE, MAX_VALENCE]`.
    pub fn parse(content: &str) -> Result<Self, LexiconError> {
        let mut entries = HashMap::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split('\t');
            let term = fields.next().map(str::trim).unwrap_or_default();
            let valence = fields.next().map(str::trim).ok_or_else(|| {
                LexiconError::InvalidLine {
                    line: idx + 1,
                    reason: "missing tab-separated valence".to_string(),
                }
            })?;

            if term.is_empty() || term.contains(char::is_whitespace) {
                return Err(LexiconError::InvalidLine {
                    line: idx + 1,
                    reason: format!("term {term:?} must be a single word"),
                });
            }

            let valence: f64 = valence.parse().map_err(|_| LexiconError::InvalidLine {
                line: idx + 1,
                reason: format!("valence {valence:?} is not a number"),
            })?;
            if !valence.is_finite() || valence.abs() > MAX_VALENCE {
                return Err(LexiconError::InvalidLine {
                    line: idx + 1,
                    reason: format!("valence {valence} outside [-{MAX_VALENCE}, {MAX_VALENCE}]"),
                });
            }

            entries.insert(term.to_lowercase(), valence);
        }

        if entries.is_empty() {
            return Err(LexiconError::Empty);
        }

        Ok(Self { entries })
    }

    /// Load a lexicon file
    pub fn load(path: &Path) -> Result<Self, LexiconError> {
        let content = std::fs::read_to_string(path).map_err(|source| LexiconError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Valence for a term (case-insensitive)
    pub fn valence(&self, term: &str) -> Option<f64> {
        if let Some(&v) = self.entries.get(term) {
            return Some(v);
        }
        self.entries.get(&term.to_lowercase()).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// SHA-256 over the sorted table, independent of file layout
    pub fn fingerprint(&self) -> String {
        let mut terms: Vec<_> = self.entries.iter().collect();
        terms.sort_by(|a, b| a.0.cmp(b.0));

        let mut hasher = Sha256::new();
        for (term, valence) in terms {
            hasher.update(term.as_bytes());
            hasher.update(b"\t");
            hasher.update(valence.to_bits().to_le_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::parse(DEFAULT_LEXICON).expect("bundled lexicon is valid")
    }
}
