use std::fmt;

use serde::{Deserialize, Serialize};

/// A tagged unit of raw input entering the pipeline. Created once at the
/// ingress boundary and passed by value; never mutated downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorEvent {
    pub sensor: String,
    pub input_type: String,
    pub input_data: String,
}

/// The Thalamus stage's routed classification of a sensor event.
///
/// `region` and `schema` are carried as free text: stage validation is
/// key-presence-only, so any phrasing the generator produced is forwarded
/// as-is. `message` holds the serialized original [`SensorEvent`] and is
/// attached by the pipeline after validation, never by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceptionRecord {
    pub region: String,
    pub schema: String,
    pub perception: String,
    pub message: String,
}

/// Terminal artifact of the pipeline: the ACC's pass/fail, confidence, and
/// affect judgment about a perception record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub pass_doubt: bool,
    pub threshold_score: f64,
    pub feelings: String,
    pub significance: f64,
}

impl Verdict {
    /// Clamps both scores into [0, 1]. Generators occasionally emit values
    /// just outside the declared range; the range is an invariant here.
    pub fn clamped(mut self) -> Self {
        self.threshold_score = self.threshold_score.clamp(0.0, 1.0);
        self.significance = self.significance.clamp(0.0, 1.0);
        self
    }
}

/// Closed set of processing regions known to the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrainRegion {
    Amygdala,
    PrefrontalCortex,
    SensoryCortex,
    VisualCortex,
    Hippocampus,
}

impl BrainRegion {
    pub const ALL: [BrainRegion; 5] = [
        BrainRegion::Amygdala,
        BrainRegion::PrefrontalCortex,
        BrainRegion::SensoryCortex,
        BrainRegion::VisualCortex,
        BrainRegion::Hippocampus,
    ];

    /// Parses the snake_case wire name. Returns `None` for anything outside
    /// the closed set; callers that tolerate unknown regions (the fallback
    /// classifier) branch on that.
    pub fn parse(text: &str) -> Option<BrainRegion> {
        match text.trim() {
            "amygdala" => Some(BrainRegion::Amygdala),
            "prefrontal_cortex" => Some(BrainRegion::PrefrontalCortex),
            "sensory_cortex" => Some(BrainRegion::SensoryCortex),
            "visual_cortex" => Some(BrainRegion::VisualCortex),
            "hippocampus" => Some(BrainRegion::Hippocampus),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BrainRegion::Amygdala => "amygdala",
            BrainRegion::PrefrontalCortex => "prefrontal_cortex",
            BrainRegion::SensoryCortex => "sensory_cortex",
            BrainRegion::VisualCortex => "visual_cortex",
            BrainRegion::Hippocampus => "hippocampus",
        }
    }

    /// Static, non-overlapping schema names registered for this region.
    /// Configuration, not learned state.
    pub fn schemas(&self) -> &'static [&'static str] {
        match self {
            BrainRegion::Amygdala => {
                &["fear_analysis", "reward_processing", "facial_emotion_recognition"]
            }
            BrainRegion::PrefrontalCortex => &["problem_solving", "planning", "self_awareness"],
            BrainRegion::SensoryCortex => {
                &["haptic_recognition", "audio_processing", "olfactory_analysis"]
            }
            BrainRegion::VisualCortex => {
                &["object_recognition", "motion_analysis", "spatial_awareness"]
            }
            BrainRegion::Hippocampus => {
                &["short_term_memory", "long_term_memory", "pattern_recognition"]
            }
        }
    }
}

impl fmt::Display for BrainRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::BrainRegion;

    #[test]
    fn region_names_round_trip() {
        for region in BrainRegion::ALL {
            assert_eq!(BrainRegion::parse(region.as_str()), Some(region));
        }
    }

    #[test]
    fn unknown_region_does_not_parse() {
        assert_eq!(BrainRegion::parse("cerebellum"), None);
        assert_eq!(BrainRegion::parse(""), None);
    }

    #[test]
    fn schema_sets_do_not_overlap() {
        let mut seen = std::collections::BTreeSet::new();
        for region in BrainRegion::ALL {
            for schema in region.schemas() {
                assert!(seen.insert(*schema), "schema {schema} registered twice");
            }
        }
    }
}
