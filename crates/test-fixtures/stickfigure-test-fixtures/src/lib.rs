//! Shared JSON fixtures for stickfigure tests. Paths come from `fixtures/manifest.json`
//! at the workspace root.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    documents: BTreeMap<String, DocumentEntry>,
    malformed: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct DocumentEntry {
    path: String,
    /// Keyframe count a successful import must produce.
    keyframes: usize,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a BTreeMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Importable animation documents in every accepted shape.
pub mod documents {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.documents.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.documents, "document", name)?;
        read_to_string(&entry.path)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.documents, "document", name)?;
        super::load_json(&entry.path)
    }

    pub fn expected_keyframes(name: &str) -> Result<usize> {
        Ok(lookup(&MANIFEST.documents, "document", name)?.keyframes)
    }
}

/// Documents every importer must reject.
pub mod malformed {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.malformed.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.malformed, "malformed document", name)?;
        read_to_string(rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_manifest_entry_is_readable() {
        for name in documents::keys() {
            let value: serde_json::Value = documents::load(&name).unwrap();
            assert!(value.is_object() || value.is_array(), "{name}");
        }
        for name in malformed::keys() {
            malformed::json(&name).unwrap();
        }
    }

    #[test]
    fn unknown_names_are_errors() {
        assert!(documents::json("nope").is_err());
        assert!(malformed::json("nope").is_err());
    }
}
