//! Per-student memory board

use crate::payload::CompressedPayload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use studymem_core::Module;

/// One module's slot on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSlot {
    pub payload: CompressedPayload,
    pub last_compressed_at: Option<DateTime<Utc>>,
    pub sessions_since_compression: usize,
}

impl ModuleSlot {
    pub fn new(module: Module) -> Self {
        Self {
            payload: CompressedPayload::empty(module),
            last_compressed_at: None,
            sessions_since_compression: 0,
        }
    }
}

/// A chronic key remembered by more than one module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedIssue {
    pub key: String,
    pub modules: Vec<Module>,
    pub total_frequency: usize,
}

/// Cross-module view derived from the module payloads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallPatterns {
    #[serde(default)]
    pub shared_issues: Vec<SharedIssue>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl OverallPatterns {
    /// Collect every chronic key that shows up in at least two modules
    pub fn derive<'a>(
        payloads: impl IntoIterator<Item = &'a CompressedPayload>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut by_key: BTreeMap<&str, (BTreeSet<Module>, usize)> = BTreeMap::new();
        for payload in payloads {
            let module = payload.module();
            for (_, list) in payload.patterns.chronic_lists() {
                for pattern in list {
                    let entry = by_key.entry(pattern.key.as_str()).or_default();
                    entry.0.insert(module);
                    entry.1 += pattern.frequency;
                }
            }
        }

        let mut shared_issues: Vec<SharedIssue> = by_key
            .into_iter()
            .filter(|(_, (modules, _))| modules.len() >= 2)
            .map(|(key, (modules, total_frequency))| SharedIssue {
                key: key.to_string(),
                modules: modules.into_iter().collect(),
                total_frequency,
            })
            .collect();
        shared_issues.sort_by(|a, b| b.total_frequency.cmp(&a.total_frequency));

        Self {
            shared_issues,
            updated_at: Some(now),
        }
    }
}

/// Durable memory of one student: a slot per module plus cross-module patterns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryBoard {
    pub student_id: String,
    #[serde(deserialize_with = "deserialize_slots")]
    slots: BTreeMap<Module, ModuleSlot>,
    #[serde(default)]
    pub overall_patterns: OverallPatterns,
    pub created_at: DateTime<Utc>,
}

impl MemoryBoard {
    /// Fresh board with an empty slot for every module
    pub fn new(student_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            student_id: student_id.into(),
            slots: Module::ALL
                .iter()
                .map(|m| (*m, ModuleSlot::new(*m)))
                .collect(),
            overall_patterns: OverallPatterns::default(),
            created_at,
        }
    }

    pub fn slot(&self, module: Module) -> &ModuleSlot {
        // Every module has a slot from construction or deserialization
        &self.slots[&module]
    }

    fn slot_mut(&mut self, module: Module) -> &mut ModuleSlot {
        self.slots
            .entry(module)
            .or_insert_with(|| ModuleSlot::new(module))
    }

    pub fn slots(&self) -> impl Iterator<Item = (Module, &ModuleSlot)> {
        self.slots.iter().map(|(m, s)| (*m, s))
    }

    /// Put back a slot read from storage
    pub fn restore_slot(&mut self, module: Module, slot: ModuleSlot) {
        self.slots.insert(module, slot);
    }

    /// Compressed payload of a module; empty when never compressed
    pub fn payload(&self, module: Module) -> &CompressedPayload {
        &self.slot(module).payload
    }

    /// Replace a module's payload, reset its counter and re-derive the
    /// cross-module patterns
    pub fn apply_compression(&mut self, payload: CompressedPayload, at: DateTime<Utc>) {
        let slot = self.slot_mut(payload.module());
        slot.payload = payload;
        slot.last_compressed_at = Some(at);
        slot.sessions_since_compression = 0;
        self.overall_patterns =
            OverallPatterns::derive(self.slots.values().map(|s| &s.payload), at);
    }
}

fn deserialize_slots<'de, D>(deserializer: D) -> Result<BTreeMap<Module, ModuleSlot>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut slots = BTreeMap::<Module, ModuleSlot>::deserialize(deserializer)?;
    for module in Module::ALL {
        slots.entry(module).or_insert_with(|| ModuleSlot::new(module));
    }
    Ok(slots)
}
