use crate::config::StageRoutesConfig;

/// The two generator-backed steps of the pipeline. Dispatch on this enum
/// replaces any string comparison as control flow: each stage knows its
/// contract keys and its model route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Thalamus,
    Acc,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Thalamus => "thalamus",
            Stage::Acc => "acc",
        }
    }

    /// Keys the generator must include for this stage's output to validate.
    /// Presence only; value domains are deliberately not enforced.
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            Stage::Thalamus => &["region", "schema", "perception"],
            Stage::Acc => &["pass_doubt", "threshold_score", "feelings", "significance"],
        }
    }

    pub fn resolve_route(&self, routes: &StageRoutesConfig) -> String {
        let stage_route = match self {
            Stage::Thalamus => routes.thalamus.clone(),
            Stage::Acc => routes.acc.clone(),
        };
        stage_route
            .or_else(|| routes.default.clone())
            .unwrap_or_else(|| format!("hf/{}", self.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::Stage;
    use crate::config::StageRoutesConfig;

    #[test]
    fn default_routes_follow_stage_names() {
        let routes = StageRoutesConfig {
            thalamus: None,
            acc: None,
            default: None,
        };
        assert_eq!(Stage::Thalamus.resolve_route(&routes), "hf/thalamus");
        assert_eq!(Stage::Acc.resolve_route(&routes), "hf/acc");
    }

    #[test]
    fn stage_route_wins_over_default() {
        let routes = StageRoutesConfig {
            thalamus: Some("local/thalamus-ft".to_string()),
            acc: None,
            default: Some("local/general".to_string()),
        };
        assert_eq!(Stage::Thalamus.resolve_route(&routes), "local/thalamus-ft");
        assert_eq!(Stage::Acc.resolve_route(&routes), "local/general");
    }
}
