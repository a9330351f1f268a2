use crate::config::{AudioFile, ExperimentConfig};
use crate::ids::{GroupId, Key};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Ratings collected for one condition, plus the file lists it was built
/// from so the server can audit what was actually played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub ratings: BTreeMap<Key, i64>,
    #[serde(rename = "conditionID")]
    pub condition_id: Value,
    #[serde(rename = "groupID")]
    pub group_id: GroupId,
    #[serde(rename = "referenceFiles")]
    pub reference_files: Vec<AudioFile>,
    #[serde(rename = "stimulusFiles")]
    pub stimulus_files: Vec<AudioFile>,
    #[serde(rename = "referenceKeys")]
    pub reference_keys: Vec<Key>,
    #[serde(rename = "stimulusKeys")]
    pub stimulus_keys: Vec<Key>,
}

impl RatingRecord {
    /// Returns `None` when `index` is not a configured condition.
    pub fn for_condition(
        config: &ExperimentConfig,
        index: usize,
        ratings: BTreeMap<Key, i64>,
    ) -> Option<Self> {
        let condition = config.condition(index)?;
        let group = config.condition_groups.get(&condition.group_id)?;

        Some(Self {
            ratings,
            condition_id: condition.condition_id.clone(),
            group_id: condition.group_id.clone(),
            reference_files: group.reference_files.clone(),
            stimulus_files: group.stimulus_files.clone(),
            reference_keys: condition.reference_keys.clone(),
            stimulus_keys: condition.stimulus_keys.clone(),
        })
    }
}

/// Records indexed by condition. Writes only ever land on the last slot or
/// one past it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CompletedConditions(Vec<RatingRecord>);

impl CompletedConditions {
    /// Stores `record` at `index`, overwriting a previous save of the same
    /// condition. Returns false if `index` would leave a gap.
    pub fn store(&mut self, index: usize, record: RatingRecord) -> bool {
        if index < self.0.len() {
            self.0[index] = record;
            true
        } else if index == self.0.len() {
            self.0.push(record);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RatingRecord> {
        self.0.get(index)
    }

    pub fn records(&self) -> &[RatingRecord] {
        &self.0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }
}
