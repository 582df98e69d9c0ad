use crate::types::{BrainRegion, PerceptionRecord, Verdict};

const MATH_TOKENS: [&str; 7] = ["+", "-", "*", "/", "=", "solve", "calculate"];
const LOGICAL_SCHEMAS: [&str; 3] = ["problem_solving", "planning", "self_awareness"];

const FEELING_ANALYTICAL: &str = "Focused and analytical, working through the problem";
const FEELING_ALERT: &str = "Alert and evaluating the situation";
const FEELING_VISUAL: &str = "Visually engaged with the scene";
const FEELING_DEFAULT: &str = "Processing with appropriate resources";

/// Deterministic, rule-based stand-in for the ACC stage.
///
/// Total over any well-formed [`PerceptionRecord`], including region values
/// outside the known enum: never fails, never calls a generator. Invoked
/// when the ACC retry loop exhausts its attempts or the generator path
/// errors, so the pipeline always terminates with a structurally valid
/// verdict.
pub fn fallback_verdict(record: &PerceptionRecord) -> Verdict {
    let region = BrainRegion::parse(&record.region);
    let is_valid_region = region.is_some();

    let input_data = recover_input_data(&record.message);
    let lowered = input_data.to_lowercase();
    let is_math = MATH_TOKENS.iter().any(|token| lowered.contains(token));
    let is_logical = region == Some(BrainRegion::PrefrontalCortex)
        && LOGICAL_SCHEMAS.contains(&record.schema.trim());

    let pass_doubt = is_valid_region && (if is_math { is_logical } else { true });
    let threshold_score = if pass_doubt { 0.8 } else { 0.3 };

    let feelings = if is_math && is_logical {
        FEELING_ANALYTICAL
    } else if region == Some(BrainRegion::Amygdala) {
        FEELING_ALERT
    } else if region == Some(BrainRegion::VisualCortex) {
        FEELING_VISUAL
    } else {
        FEELING_DEFAULT
    };

    let significance = if is_math || lowered.contains("important") {
        0.6
    } else {
        0.4
    };

    Verdict {
        pass_doubt,
        threshold_score,
        feelings: feelings.to_string(),
        significance,
    }
}

/// The message field carries the serialized original sensor event. Partial
/// records keep working as long as `input_data` is present; when the message
/// does not parse at all, the raw text stands in so the rule set still
/// applies.
fn recover_input_data(message: &str) -> String {
    serde_json::from_str::<serde_json::Value>(message)
        .ok()
        .and_then(|value| {
            value
                .get("input_data")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| message.to_string())
}

#[cfg(test)]
mod tests {
    use super::fallback_verdict;
    use crate::types::PerceptionRecord;

    fn record(region: &str, schema: &str, input_data: &str) -> PerceptionRecord {
        PerceptionRecord {
            region: region.to_string(),
            schema: schema.to_string(),
            perception: "test perception".to_string(),
            message: format!(
                r#"{{"sensor":"chat","input_type":"text","input_data":"{}"}}"#,
                input_data
            ),
        }
    }

    #[test]
    fn math_routed_to_prefrontal_cortex_passes() {
        let verdict = fallback_verdict(&record("prefrontal_cortex", "problem_solving", "solve 5 - 3"));
        assert!(verdict.pass_doubt);
        assert_eq!(verdict.threshold_score, 0.8);
        assert!(verdict.feelings.contains("Focused and analytical"));
        assert_eq!(verdict.significance, 0.6);
    }

    #[test]
    fn math_routed_elsewhere_fails_doubt() {
        let verdict = fallback_verdict(&record("amygdala", "fear_analysis", "calculate 10 / 2"));
        assert!(!verdict.pass_doubt);
        assert_eq!(verdict.threshold_score, 0.3);
        // Math without the logical route never reaches the analytical feeling.
        assert!(verdict.feelings.contains("Alert"));
        assert_eq!(verdict.significance, 0.6);
    }

    #[test]
    fn non_math_input_passes_on_any_valid_region() {
        let verdict = fallback_verdict(&record("hippocampus", "long_term_memory", "my childhood"));
        assert!(verdict.pass_doubt);
        assert_eq!(verdict.significance, 0.4);
        assert_eq!(verdict.feelings, "Processing with appropriate resources");
    }

    #[test]
    fn unknown_region_fails_doubt_but_never_panics() {
        let verdict = fallback_verdict(&record("cerebellum", "balance", "standing upright"));
        assert!(!verdict.pass_doubt);
        assert_eq!(verdict.threshold_score, 0.3);
    }

    #[test]
    fn visual_cortex_gets_the_visual_feeling() {
        let verdict = fallback_verdict(&record("visual_cortex", "motion_analysis", "a dog running"));
        assert!(verdict.pass_doubt);
        assert!(verdict.feelings.contains("Visually engaged"));
    }

    #[test]
    fn important_inputs_raise_significance() {
        let verdict = fallback_verdict(&record("amygdala", "fear_analysis", "this is IMPORTANT"));
        assert_eq!(verdict.significance, 0.6);
    }

    #[test]
    fn partial_message_with_input_data_still_classifies() {
        let record = PerceptionRecord {
            region: "prefrontal_cortex".to_string(),
            schema: "problem_solving".to_string(),
            perception: "p".to_string(),
            message: r#"{"input_data":"solve 5 - 3"}"#.to_string(),
        };
        let verdict = fallback_verdict(&record);
        assert!(verdict.pass_doubt);
        assert_eq!(verdict.threshold_score, 0.8);
        assert!(verdict.feelings.contains("Focused and analytical"));
        assert_eq!(verdict.significance, 0.6);
    }

    #[test]
    fn unparseable_message_falls_back_to_raw_text() {
        let record = PerceptionRecord {
            region: "prefrontal_cortex".to_string(),
            schema: "planning".to_string(),
            perception: "p".to_string(),
            message: "solve for x".to_string(),
        };
        let verdict = fallback_verdict(&record);
        // "solve" is found in the raw message, schema is logical.
        assert!(verdict.pass_doubt);
        assert_eq!(verdict.significance, 0.6);
    }

    #[test]
    fn same_record_always_yields_same_verdict() {
        let record = record("prefrontal_cortex", "self_awareness", "who am I, really?");
        let first = fallback_verdict(&record);
        for _ in 0..10 {
            assert_eq!(fallback_verdict(&record), first);
        }
    }
}
