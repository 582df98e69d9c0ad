use std::collections::BTreeSet;

use serde_json::Value;

use crate::pipeline::stage::Stage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub ok: bool,
    pub missing_keys: BTreeSet<String>,
}

/// Checks a parsed object against the stage's required-key set.
///
/// Presence only: values are not checked against the region enum or any
/// schema table. Any phrasing the generator chose is accepted as long as the
/// contract shape holds. A non-object reports every required key missing.
pub fn validate(stage: Stage, parsed: &Value) -> ValidationReport {
    let missing_keys: BTreeSet<String> = match parsed.as_object() {
        Some(object) => stage
            .required_keys()
            .iter()
            .filter(|key| !object.contains_key(**key))
            .map(|key| key.to_string())
            .collect(),
        None => stage
            .required_keys()
            .iter()
            .map(|key| key.to_string())
            .collect(),
    };

    ValidationReport {
        ok: missing_keys.is_empty(),
        missing_keys,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::validate;
    use crate::pipeline::stage::Stage;

    #[test]
    fn complete_thalamus_object_validates() {
        let parsed = json!({
            "region": "visual_cortex",
            "schema": "object_recognition",
            "perception": "An object moved in front of the camera"
        });
        let report = validate(Stage::Thalamus, &parsed);
        assert!(report.ok);
        assert!(report.missing_keys.is_empty());
    }

    #[test]
    fn missing_keys_are_reported_by_name() {
        let parsed = json!({"region": "amygdala"});
        let report = validate(Stage::Thalamus, &parsed);
        assert!(!report.ok);
        assert_eq!(
            report.missing_keys.iter().cloned().collect::<Vec<_>>(),
            vec!["perception".to_string(), "schema".to_string()]
        );
    }

    #[test]
    fn unknown_region_value_still_validates() {
        // Key presence only. Domain enforcement would be a behavior change.
        let parsed = json!({
            "region": "cerebellum",
            "schema": "whatever",
            "perception": 42
        });
        assert!(validate(Stage::Thalamus, &parsed).ok);
    }

    #[test]
    fn acc_contract_requires_all_four_keys() {
        let parsed = json!({
            "pass_doubt": true,
            "threshold_score": 0.9,
            "feelings": "calm",
        });
        let report = validate(Stage::Acc, &parsed);
        assert!(!report.ok);
        assert!(report.missing_keys.contains("significance"));
        assert_eq!(report.missing_keys.len(), 1);
    }

    #[test]
    fn extra_keys_are_tolerated() {
        let parsed = json!({
            "pass_doubt": false,
            "threshold_score": 0.2,
            "feelings": "doubtful",
            "significance": 0.1,
            "commentary": "should not matter"
        });
        assert!(validate(Stage::Acc, &parsed).ok);
    }

    #[test]
    fn non_object_reports_every_required_key() {
        let report = validate(Stage::Acc, &json!("just a string"));
        assert!(!report.ok);
        assert_eq!(report.missing_keys.len(), Stage::Acc.required_keys().len());
    }
}
