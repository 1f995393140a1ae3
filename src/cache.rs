//! Risk Table Cache Module
//! Memoizes pipeline output keyed by a SHA-256 fingerprint of the source
//! file contents and the pipeline settings.

use crate::config::{PipelineSettings, SourceSet};
use crate::pipeline::{PipelineError, SourceBytes};
use crate::stats::RiskTable;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Content hash of one pipeline input set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceFingerprint([u8; 32]);

impl SourceFingerprint {
    /// Hash both source contents and the settings that shape the output.
    pub fn compute(bytes: &SourceBytes, settings: &PipelineSettings) -> Self {
        Self::from_parts(&bytes.disaster, &bytes.population, settings)
    }

    pub fn from_parts(disaster: &[u8], population: &[u8], settings: &PipelineSettings) -> Self {
        let mut hasher = Sha256::new();
        // Length prefixes keep the two files from aliasing each other
        for part in [disaster, population] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        let settings = serde_json::to_vec(settings).unwrap_or_default();
        hasher.update(&settings);
        Self(hasher.finalize().into())
    }
}

impl fmt::Display for SourceFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Explicit store of finished tables. Shared tables are read-only.
#[derive(Default)]
pub struct RiskTableCache {
    entries: Mutex<HashMap<SourceFingerprint, Arc<RiskTable>>>,
}

impl RiskTableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for these inputs, building it on a miss.
    ///
    /// The sources are read once; `build` gets exactly the bytes that were hashed.
    pub fn get_or_build<F>(
        &self,
        sources: &SourceSet,
        settings: &PipelineSettings,
        build: F,
    ) -> Result<(SourceFingerprint, Arc<RiskTable>), PipelineError>
    where
        F: FnOnce(&SourceBytes, &PipelineSettings) -> Result<RiskTable, PipelineError>,
    {
        let bytes = SourceBytes::read(sources)?;
        let fingerprint = SourceFingerprint::compute(&bytes, settings);

        if let Some(table) = self.get(&fingerprint) {
            tracing::debug!(%fingerprint, "risk table cache hit");
            return Ok((fingerprint, table));
        }

        tracing::info!(%fingerprint, "risk table cache miss, running pipeline");
        let table = Arc::new(build(&bytes, settings)?);

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let table = entries.entry(fingerprint).or_insert(table).clone();
        Ok((fingerprint, table))
    }

    pub fn get(&self, fingerprint: &SourceFingerprint) -> Option<Arc<RiskTable>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(fingerprint)
            .cloned()
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&self, fingerprint: &SourceFingerprint) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(fingerprint)
            .is_some()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
