//! The [`TemplateSource`] trait and the directory-backed store.
//!
//! A template source yields raw [`TemplateSpec`] records; [`load_library`]
//! compiles and indexes them into the immutable
//! [`TemplateLibrary`] exactly once at process start. All backends are
//! swappable behind the trait.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use quantgraph_core::library::TemplateLibrary;
use quantgraph_core::template::TemplateSpec;

use crate::error::StoreError;

/// A source of raw template records.
pub trait TemplateSource {
    /// Loads every template record the source holds.
    fn load(&self) -> Result<Vec<TemplateSpec>, StoreError>;
}

/// Loads, compiles, and indexes a source into a ready-to-use library.
pub fn load_library(source: &dyn TemplateSource) -> Result<TemplateLibrary, StoreError> {
    let specs = source.load()?;
    Ok(TemplateLibrary::from_specs(specs)?)
}

/// A template file holds either one record or an array of records.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<TemplateSpec>),
    One(Box<TemplateSpec>),
}

/// A directory of `*.json` template files.
///
/// Files are read in name order and their record arrays merged into one
/// list, so the resulting library does not depend on filesystem iteration
/// order.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirSource { dir: dir.into() }
    }
}

impl TemplateSource for DirSource {
    fn load(&self) -> Result<Vec<TemplateSpec>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut specs = Vec::new();
        for path in paths {
            specs.extend(read_template_file(&path)?);
        }
        Ok(specs)
    }
}

fn read_template_file(path: &Path) -> Result<Vec<TemplateSpec>, StoreError> {
    let text = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: OneOrMany = serde_json::from_str(&text).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(match parsed {
        OneOrMany::Many(specs) => specs,
        OneOrMany::One(spec) => vec![*spec],
    })
}
