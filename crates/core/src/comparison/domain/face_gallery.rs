use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::comparison::domain::face_comparator::{format_similarity, FaceComparator};
use crate::embedding::domain::embedding::Embedding;
use crate::shared::constants::UNKNOWN_FACE;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("a face is already registered with name {0}")]
    AlreadyRegistered(String),
    #[error("gallery name must not be empty")]
    EmptyName,
    #[error("gallery embedding length {found} does not match existing entries ({expected})")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("failed to read gallery {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to write gallery {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("gallery file {path} is malformed: {source}")]
    Malformed {
        path: String,
        source: serde_json::Error,
    },
}

/// One enrolled reference face.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub user_id: String,
    pub name: String,
    pub embedding: Embedding,
    /// Where the reference image came from, for display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GalleryMatch<'a> {
    pub entry: &'a GalleryEntry,
    pub distance: f64,
}

/// Outcome of looking a face up in the gallery.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Identification {
    /// Matched entry name, or `"unknown"`.
    pub name: String,
    pub similarity: String,
    /// Distance to the nearest entry; absent when the gallery is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl Identification {
    pub fn is_known(&self) -> bool {
        self.name != UNKNOWN_FACE
    }
}

/// Named reference embeddings, kept in name order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceGallery {
    entries: BTreeMap<String, GalleryEntry>,
}

impl FaceGallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&GalleryEntry> {
        self.entries.get(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &GalleryEntry> {
        self.entries.values()
    }

    /// Adds a named face. Names are unique and all embeddings share one
    /// length.
    pub fn register(&mut self, entry: GalleryEntry) -> Result<(), GalleryError> {
        if entry.name.trim().is_empty() {
            return Err(GalleryError::EmptyName);
        }
        if self.entries.contains_key(&entry.name) {
            return Err(GalleryError::AlreadyRegistered(entry.name));
        }
        self.check_dimension(&entry.embedding)?;
        log::info!("Registered face {:?} (user {})", entry.name, entry.user_id);
        self.entries.insert(entry.name.clone(), entry);
        Ok(())
    }

    /// Embedding length shared by every entry; `None` when empty.
    pub fn dimension(&self) -> Option<usize> {
        self.entries.values().next().map(|e| e.embedding.len())
    }

    /// Fails when `embedding` cannot be compared against the entries.
    pub fn check_dimension(&self, embedding: &Embedding) -> Result<(), GalleryError> {
        match self.dimension() {
            Some(expected) if expected != embedding.len() => Err(GalleryError::DimensionMismatch {
                expected,
                found: embedding.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Checks that all entries share one embedding length. Galleries read
    /// from disk bypass `register`, so stores call this after loading.
    pub fn validate(&self) -> Result<(), GalleryError> {
        self.entries
            .values()
            .try_for_each(|e| self.check_dimension(&e.embedding))
    }

    /// Removes a face by name; returns whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entry closest to `query`. Ties go to the first name in order.
    pub fn nearest(&self, query: &Embedding) -> Result<Option<GalleryMatch<'_>>, GalleryError> {
        self.check_dimension(query)?;
        let mut best: Option<GalleryMatch<'_>> = None;
        for entry in self.entries.values() {
            let distance = entry.embedding.euclidean_distance(query);
            if best.as_ref().map_or(true, |b| distance < b.distance) {
                best = Some(GalleryMatch { entry, distance });
            }
        }
        Ok(best)
    }

    /// Names the face when its nearest entry is within the comparator's
    /// threshold.
    pub fn identify(
        &self,
        query: &Embedding,
        comparator: &FaceComparator,
    ) -> Result<Identification, GalleryError> {
        let identification = match self.nearest(query)? {
            Some(m) => Identification {
                name: if comparator.is_match(m.distance) {
                    m.entry.name.clone()
                } else {
                    UNKNOWN_FACE.to_string()
                },
                similarity: format_similarity(m.distance),
                distance: Some(m.distance),
            },
            None => Identification {
                name: UNKNOWN_FACE.to_string(),
                similarity: "0".to_string(),
                distance: None,
            },
        };
        Ok(identification)
    }
}
