use crate::ids::{AudioId, GroupId, Key};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Instruction text that means "keep the page's default instructions".
pub const NO_INSTRUCTIONS: &str = "None";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Configuration has no conditions")]
    NoConditions,

    #[error("Condition {condition} references unknown group {group}")]
    UnknownGroup { condition: usize, group: GroupId },

    #[error("Condition {condition} references key {key} missing from group {group}")]
    UnknownKey {
        condition: usize,
        group: GroupId,
        key: Key,
    },

    #[error("testTimeoutSec {0} is not a usable duration")]
    InvalidTimeout(f64),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// `[id, path]` pair from a condition group's file list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFile(pub Key, pub String);

impl AudioFile {
    pub fn key(&self) -> &Key {
        &self.0
    }

    pub fn path(&self) -> &str {
        &self.1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    #[serde(rename = "referenceFiles", default)]
    pub reference_files: Vec<AudioFile>,
    #[serde(rename = "stimulusFiles", default)]
    pub stimulus_files: Vec<AudioFile>,
}

impl ConditionGroup {
    pub fn contains_key(&self, key: &Key) -> bool {
        self.reference_files
            .iter()
            .chain(&self.stimulus_files)
            .any(|f| f.key() == key)
    }
}

/// One rated trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "groupID")]
    pub group_id: GroupId,
    /// Opaque to the client, echoed back in the rating record.
    #[serde(rename = "conditionID", default)]
    pub condition_id: Value,
    #[serde(rename = "stimulusKeys")]
    pub stimulus_keys: Vec<Key>,
    #[serde(rename = "referenceKeys", default)]
    pub reference_keys: Vec<Key>,
    #[serde(rename = "evaluation_instructions_html", default)]
    pub instructions_html: Option<String>,
}

impl Condition {
    /// Instruction text to inject, if any.
    pub fn instructions(&self) -> Option<&str> {
        self.instructions_html
            .as_deref()
            .filter(|html| *html != NO_INSTRUCTIONS)
    }
}

fn default_rating_value() -> i64 {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentConfig {
    pub conditions: Vec<Condition>,
    pub condition_groups: BTreeMap<GroupId, ConditionGroup>,
    #[serde(default)]
    pub reference_example_dict: BTreeMap<String, String>,
    #[serde(default)]
    pub quality_example_dict: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub require_listening_to_all_training_sounds: bool,
    #[serde(default)]
    pub test_timeout_sec: f64,
    #[serde(default = "default_rating_value")]
    pub default_rating_value: i64,
    #[serde(default)]
    pub loop_audio: bool,
    #[serde(default)]
    pub randomize_stimulus_order: bool,

    /// Document as received, echoed back on submission.
    #[serde(skip)]
    raw: Option<Value>,
}

impl ExperimentConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let mut config: Self = serde_json::from_value(value.clone())?;
        config.raw = Some(value);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.conditions.is_empty() {
            return Err(ConfigError::NoConditions);
        }

        if Duration::try_from_secs_f64(self.test_timeout_sec.max(0.0)).is_err() {
            return Err(ConfigError::InvalidTimeout(self.test_timeout_sec));
        }

        for (index, condition) in self.conditions.iter().enumerate() {
            let group = self.condition_groups.get(&condition.group_id).ok_or_else(|| {
                ConfigError::UnknownGroup {
                    condition: index,
                    group: condition.group_id.clone(),
                }
            })?;

            for key in condition.stimulus_keys.iter().chain(&condition.reference_keys) {
                if !group.contains_key(key) {
                    return Err(ConfigError::UnknownKey {
                        condition: index,
                        group: condition.group_id.clone(),
                        key: key.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn condition(&self, index: usize) -> Option<&Condition> {
        self.conditions.get(index)
    }

    pub fn group_of(&self, index: usize) -> Option<&ConditionGroup> {
        self.condition(index)
            .and_then(|c| self.condition_groups.get(&c.group_id))
    }

    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }

    /// Negative values mean no minimum. Out of range values are refused by
    /// [`ExperimentConfig::validate`] and read as zero here.
    pub fn test_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.test_timeout_sec.max(0.0)).unwrap_or_default()
    }

    /// Every training sound in presentation order, with its path.
    pub fn training_audio(&self) -> Vec<(AudioId, &str)> {
        let mut audio = Vec::new();
        for (key, path) in &self.reference_example_dict {
            audio.push((AudioId::training_reference(key), path.as_str()));
        }
        for (key, paths) in &self.quality_example_dict {
            for (i, path) in paths.iter().enumerate() {
                audio.push((AudioId::training_quality(key, i), path.as_str()));
            }
        }
        audio
    }

    /// Every reference and stimulus file of every group.
    pub fn condition_audio(&self) -> Vec<(AudioId, &str)> {
        self.condition_groups
            .iter()
            .flat_map(|(group_id, group)| {
                group
                    .reference_files
                    .iter()
                    .chain(&group.stimulus_files)
                    .map(move |f| (AudioId::condition(group_id, f.key()), f.path()))
            })
            .collect()
    }

    /// Serialized form sent back with the results.
    pub fn to_echo_json(&self) -> Result<String> {
        let json = match &self.raw {
            Some(raw) => serde_json::to_string(raw)?,
            None => serde_json::to_string(self)?,
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "conditions": [
            {"groupID": 0, "conditionID": 7, "stimulusKeys": ["A", "B"],
             "referenceKeys": ["R"], "evaluation_instructions_html": "None"},
            {"groupID": "1", "conditionID": "c2", "stimulusKeys": ["X"],
             "evaluation_instructions_html": "<b>Listen</b>"}
        ],
        "conditionGroups": {
            "0": {"referenceFiles": [["R", "/a/r.wav"]],
                  "stimulusFiles": [["A", "/a/a.wav"], ["B", "/a/b.wav"]]},
            "1": {"referenceFiles": [], "stimulusFiles": [["X", "/b/x.wav"]]}
        },
        "referenceExampleDict": {"ref": "/t/ref.wav"},
        "qualityExampleDict": {"low": ["/t/l0.wav", "/t/l1.wav"]},
        "requireListeningToAllTrainingSounds": true,
        "testTimeoutSec": 2.5,
        "defaultRatingValue": 40,
        "extraField": {"kept": true}
    }"#;

    #[test]
    fn test_parse_full_config() {
        let config = ExperimentConfig::from_json(CONFIG).unwrap();
        assert_eq!(config.condition_count(), 2);
        assert_eq!(config.conditions[0].group_id, GroupId::new("0"));
        assert_eq!(config.conditions[1].group_id, GroupId::new("1"));
        assert!(config.require_listening_to_all_training_sounds);
        assert_eq!(config.default_rating_value, 40);
        assert_eq!(config.test_timeout(), Duration::from_millis(2500));
        assert!(!config.loop_audio);
    }

    #[test]
    fn test_instructions_placeholder_is_ignored() {
        let config = ExperimentConfig::from_json(CONFIG).unwrap();
        assert_eq!(config.conditions[0].instructions(), None);
        assert_eq!(config.conditions[1].instructions(), Some("<b>Listen</b>"));
    }

    #[test]
    fn test_audio_inventory() {
        let config = ExperimentConfig::from_json(CONFIG).unwrap();
        let training: Vec<String> = config
            .training_audio()
            .into_iter()
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(training, vec!["Trainingref", "Traininglow0", "Traininglow1"]);

        let condition: Vec<String> = config
            .condition_audio()
            .into_iter()
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(condition, vec!["G0_R", "G0_A", "G0_B", "G1_X"]);
    }

    #[test]
    fn test_echo_preserves_unknown_fields() {
        let config = ExperimentConfig::from_json(CONFIG).unwrap();
        let echo: Value = serde_json::from_str(&config.to_echo_json().unwrap()).unwrap();
        assert_eq!(echo["extraField"]["kept"], Value::Bool(true));
        assert_eq!(echo["conditions"][0]["groupID"], Value::from(0));
    }

    #[test]
    fn test_unknown_group_rejected() {
        let json = r#"{"conditions": [{"groupID": 9, "stimulusKeys": []}], "conditionGroups": {}}"#;
        assert!(matches!(
            ExperimentConfig::from_json(json),
            Err(ConfigError::UnknownGroup { condition: 0, .. })
        ));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let json = r#"{
            "conditions": [{"groupID": 0, "stimulusKeys": ["Q"]}],
            "conditionGroups": {"0": {"stimulusFiles": [["A", "a.wav"]]}}
        }"#;
        assert!(matches!(
            ExperimentConfig::from_json(json),
            Err(ConfigError::UnknownKey { .. })
        ));
    }

    #[test]
    fn test_empty_conditions_rejected() {
        let json = r#"{"conditions": [], "conditionGroups": {}}"#;
        assert!(matches!(
            ExperimentConfig::from_json(json),
            Err(ConfigError::NoConditions)
        ));
    }

    #[test]
    fn test_oversized_timeout_rejected() {
        let json = r#"{
            "conditions": [{"groupID": 0, "stimulusKeys": ["A"]}],
            "conditionGroups": {"0": {"stimulusFiles": [["A", "a.wav"]]}},
            "testTimeoutSec": 1e20
        }"#;
        assert!(matches!(
            ExperimentConfig::from_json(json),
            Err(ConfigError::InvalidTimeout(t)) if t == 1e20
        ));

        let mut config = ExperimentConfig::from_json(&json.replace("1e20", "-3")).unwrap();
        assert_eq!(config.test_timeout(), Duration::ZERO);
        config.test_timeout_sec = 1e20;
        assert_eq!(config.test_timeout(), Duration::ZERO);
    }
}
