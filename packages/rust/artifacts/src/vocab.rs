//! Vocabulary resource: word frequencies and optional embeddings.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use modelpack_shared::{ArtifactKind, ModelPackError, Result};

use crate::loader;

/// On-disk revision of the vocabulary format this crate reads.
pub const VOCAB_FORMAT_VERSION: u32 = 1;

/// One vocabulary word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    /// Corpus frequency.
    #[serde(default)]
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

#[derive(Deserialize)]
struct VocabularyFile {
    format_version: u32,
    #[serde(default)]
    words: Vec<WordEntry>,
}

#[derive(Serialize)]
struct VocabularyRecord<'a> {
    format_version: u32,
    words: &'a [WordEntry],
}

/// A loaded, read-only vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    words: Vec<WordEntry>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build an in-memory vocabulary. Fails on duplicate words or mixed vector dimensions.
    pub fn new(words: Vec<WordEntry>) -> std::result::Result<Self, String> {
        let mut index = HashMap::with_capacity(words.len());
        let mut dim = None;

        for (i, entry) in words.iter().enumerate() {
            if index.insert(entry.word.clone(), i).is_some() {
                return Err(format!("duplicate word {:?}", entry.word));
            }
            if let Some(v) = &entry.vector {
                match dim {
                    None => dim = Some(v.len()),
                    Some(d) if d != v.len() => {
                        return Err(format!(
                            "vector of {:?} has dimension {} (expected {d})",
                            entry.word,
                            v.len()
                        ));
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(Self { words, index })
    }

    /// Load a vocabulary from `path`.
    ///
    /// Fails with `ArtifactNotFound` if nothing exists at `path` and with
    /// `ArtifactCorrupt` if the contents are not a valid vocabulary.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let kind = ArtifactKind::Vocabulary;
        let bytes = loader::read_artifact(kind, path)?;
        let file: VocabularyFile = loader::decode_artifact(kind, path, &bytes)?;

        loader::check_format_version(kind, path, file.format_version, VOCAB_FORMAT_VERSION)?;
        let vocab = Self::new(file.words)
            .map_err(|msg| ModelPackError::artifact_corrupt(kind, path, msg))?;

        info!(words = vocab.len(), vector_dim = ?vocab.vector_dim(), "vocabulary loaded");
        Ok(vocab)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    /// Corpus frequency of `word`, if known.
    pub fn count(&self, word: &str) -> Option<u64> {
        self.entry(word).map(|e| e.count)
    }

    pub fn vector(&self, word: &str) -> Option<&[f32]> {
        self.entry(word)?.vector.as_deref()
    }

    /// Embedding dimension, or `None` if no word carries a vector.
    pub fn vector_dim(&self) -> Option<usize> {
        self.words
            .iter()
            .find_map(|w| w.vector.as_ref().map(Vec::len))
    }

    pub fn words(&self) -> &[WordEntry] {
        &self.words
    }

    fn entry(&self, word: &str) -> Option<&WordEntry> {
        self.index.get(word).map(|&i| &self.words[i])
    }
}

impl Serialize for Vocabulary {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        VocabularyRecord {
            format_version: VOCAB_FORMAT_VERSION,
            words: &self.words,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Vocabulary {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        use serde::de::Error;

        let file = VocabularyFile::deserialize(deserializer)?;
        if file.format_version != VOCAB_FORMAT_VERSION {
            return Err(D::Error::custom(format!(
                "unsupported format_version {} (expected {VOCAB_FORMAT_VERSION})",
                file.format_version
            )));
        }
        Self::new(file.words).map_err(D::Error::custom)
    }
}
