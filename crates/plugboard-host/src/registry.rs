use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use plugboard_core::{PluginId, PluginKind};

use crate::plugin::Plugin;

/// Record of one successfully loaded plugin.
#[derive(Debug, Clone, Serialize)]
pub struct PluginRecord {
    pub id: PluginId,
    pub kind: PluginKind,
    pub source_path: PathBuf,
    /// The `kind.id` identity key; at most one active instance per key.
    pub module_identity: String,
    pub loaded_at: DateTime<Utc>,
    /// Description carried over from the manifest stub, if present.
    pub description: Option<String>,
}

pub(crate) struct ActivePlugin {
    pub(crate) record: PluginRecord,
    pub(crate) instance: Box<dyn Plugin>,
}

/// In-memory table of currently active plugins.
///
/// Mutated only by the loader on a single control flow; external readers get
/// defensive snapshots and can never observe a half-initialized entry.
#[derive(Default)]
pub struct PluginRegistry {
    active: HashMap<PluginId, ActivePlugin>,
    identities: HashSet<String>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.active.contains_key(id)
    }

    pub fn has_identity(&self, identity: &str) -> bool {
        self.identities.contains(identity)
    }

    pub fn get(&self, id: &str) -> Option<&PluginRecord> {
        self.active.get(id).map(|a| &a.record)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut ActivePlugin> {
        self.active.get_mut(id)
    }

    pub(crate) fn insert(&mut self, record: PluginRecord, instance: Box<dyn Plugin>) {
        self.identities.insert(record.module_identity.clone());
        self.active
            .insert(record.id.clone(), ActivePlugin { record, instance });
    }

    /// Remove an entry and its identity key, returning the outgoing record.
    pub(crate) fn remove(&mut self, id: &str) -> Option<ActivePlugin> {
        let active = self.active.remove(id)?;
        self.identities.remove(&active.record.module_identity);
        Some(active)
    }

    /// Defensive copy of id → record.
    pub fn snapshot(&self) -> HashMap<PluginId, PluginRecord> {
        self.active
            .iter()
            .map(|(id, a)| (id.clone(), a.record.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
