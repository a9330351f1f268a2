use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Defines a string identifier that also accepts integers on the wire.
///
/// Experiment configs are hand-written and routinely mix `"groupID": 3`
/// with `"groupID": "3"`; both normalize to the same value.
macro_rules! flexible_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_any(FlexibleIdVisitor).map(Self)
            }
        }
    };
}

struct FlexibleIdVisitor;

impl<'de> Visitor<'de> for FlexibleIdVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or integer identifier")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }
}

flexible_id!(
    /// Identifier of a condition group
    GroupId
);

flexible_id!(
    /// Stimulus, reference or file key within a condition group
    Key
);

/// Fully qualified identifier of an audio element inside an audio group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioId(String);

impl AudioId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// `G<group>_<key>`: reference or stimulus audio of a condition group.
    pub fn condition(group: &GroupId, key: &Key) -> Self {
        Self(format!("G{}_{}", group, key))
    }

    /// `Training<key>`: a reference example.
    pub fn training_reference(key: &str) -> Self {
        Self(format!("Training{key}"))
    }

    /// `Training<key><n>`: the n-th quality example under `key`.
    pub fn training_quality(key: &str, index: usize) -> Self {
        Self(format!("Training{key}{index}"))
    }

    /// Element id as seen by the host page: `<group>_audio<id>`.
    pub fn dom_id(&self, group: &str) -> String {
        format!("{group}_audio{}", self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AudioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One position of a per-trial stimulus map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StimulusEntry {
    pub group_id: GroupId,
    pub key: Key,
    pub audio_id: AudioId,
}

impl StimulusEntry {
    pub fn new(group_id: GroupId, key: Key) -> Self {
        let audio_id = AudioId::condition(&group_id, &key);
        Self {
            group_id,
            key,
            audio_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let ids: Vec<GroupId> = serde_json::from_str(r#"[3, "3", "abc"]"#).unwrap();
        assert_eq!(ids[0], ids[1]);
        assert_eq!(ids[2].as_str(), "abc");
    }

    #[test]
    fn test_condition_audio_id_layout() {
        let entry = StimulusEntry::new(GroupId::new("12"), Key::new("C3"));
        assert_eq!(entry.audio_id.as_str(), "G12_C3");
        assert_eq!(entry.audio_id.dom_id("audioGroup"), "audioGroup_audioG12_C3");
    }

    #[test]
    fn test_training_ids() {
        assert_eq!(AudioId::training_reference("R").as_str(), "TrainingR");
        assert_eq!(AudioId::training_quality("low", 2).as_str(), "Traininglow2");
    }
}
