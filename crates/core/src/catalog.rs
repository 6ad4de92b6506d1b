//! Scenario Catalog
//!
//! Registry of trainee role → ordered scenarios. Lookups for a role with no
//! registered content fall back to the default role, so a session can always
//! be started. Integrity (unique ids, non-empty default role) is checked once
//! at construction and reported as a configuration error.

use crate::{
    error::TrainingError,
    profile::Scenario,
    random::RandomSource,
    scenarios::builtin_scenarios,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashSet},
    path::Path,
};
use tracing::{debug, info};

pub const DEFAULT_ROLE: &str = "AE";

/// On-disk shape of a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDefinition {
    #[serde(default = "default_role")]
    pub default_role: String,
    pub roles: BTreeMap<String, Vec<Scenario>>,
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

#[derive(Debug, Clone)]
pub struct ScenarioCatalog {
    default_role: String,
    roles: BTreeMap<String, Vec<Scenario>>,
}

impl ScenarioCatalog {
    /// Builds a catalog, failing fast on duplicate scenario ids or an empty
    /// default role.
    pub fn new(
        default_role: impl Into<String>,
        roles: impl IntoIterator<Item = (String, Vec<Scenario>)>,
    ) -> Result<Self, TrainingError> {
        let default_role = default_role.into();
        let mut seen = HashSet::new();
        let mut map: BTreeMap<String, Vec<Scenario>> = BTreeMap::new();

        for (role, scenarios) in roles {
            for scenario in &scenarios {
                if !seen.insert(scenario.id.clone()) {
                    return Err(TrainingError::Configuration(format!(
                        "duplicate scenario id '{}' (role '{}')",
                        scenario.id, role
                    )));
                }
            }
            map.entry(role).or_default().extend(scenarios);
        }

        if map.get(&default_role).is_none_or(|s| s.is_empty()) {
            return Err(TrainingError::Configuration(format!(
                "default role '{}' has no scenarios",
                default_role
            )));
        }

        Ok(Self {
            default_role,
            roles: map,
        })
    }

    /// The scenarios shipped with the service.
    pub fn builtin(default_role: &str) -> Result<Self, TrainingError> {
        Self::new(default_role, builtin_scenarios())
    }

    pub fn from_definition(definition: CatalogDefinition) -> Result<Self, TrainingError> {
        Self::new(definition.default_role, definition.roles)
    }

    /// Loads a [`CatalogDefinition`] from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, TrainingError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TrainingError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let definition: CatalogDefinition = serde_json::from_str(&raw).map_err(|e| {
            TrainingError::Configuration(format!("cannot parse {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_definition(definition)?;
        info!(path = %path.display(), scenarios = catalog.len(), "Loaded scenario catalog");
        Ok(catalog)
    }

    pub fn default_role(&self) -> &str {
        &self.default_role
    }

    /// Scenarios for `role`, or the default role's list if none are registered.
    pub fn scenarios_for(&self, role: &str) -> &[Scenario] {
        match self.roles.get(role) {
            Some(scenarios) if !scenarios.is_empty() => scenarios,
            _ => {
                debug!(role, fallback = %self.default_role, "Falling back to default role");
                self.roles
                    .get(&self.default_role)
                    .map(Vec::as_slice)
                    .unwrap_or(&[])
            }
        }
    }

    /// Scenarios registered under exactly `role`, without fallback.
    pub fn registered_scenarios(&self, role: &str) -> &[Scenario] {
        self.roles.get(role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pick_scenario(
        &self,
        role: &str,
        rng: &mut dyn RandomSource,
    ) -> Result<&Scenario, TrainingError> {
        let scenarios = self.scenarios_for(role);
        if scenarios.is_empty() {
            return Err(TrainingError::InvalidRole(role.to_string()));
        }
        Ok(&scenarios[rng.next_index(scenarios.len())])
    }

    /// Finds `scenario_id` within the resolved list for `role`.
    pub fn find_for_role(&self, role: &str, scenario_id: &str) -> Result<&Scenario, TrainingError> {
        self.scenarios_for(role)
            .iter()
            .find(|s| s.id == scenario_id)
            .ok_or_else(|| TrainingError::UnknownScenario {
                scenario_id: scenario_id.to_string(),
                role: role.to_string(),
            })
    }

    /// Finds a scenario by id across all roles.
    pub fn get(&self, scenario_id: &str) -> Option<&Scenario> {
        self.roles.values().flatten().find(|s| s.id == scenario_id)
    }

    /// Adds an uploaded scenario. A clashing id is a per-request validation
    /// failure rather than a configuration error.
    pub fn register(&mut self, role: &str, scenario: Scenario) -> Result<(), TrainingError> {
        if self.get(&scenario.id).is_some() {
            return Err(TrainingError::InvalidUpload(format!(
                "scenario id '{}' already exists",
                scenario.id
            )));
        }
        self.roles.entry(role.to_string()).or_default().push(scenario);
        Ok(())
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.roles.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{CustomerProfile, Difficulty};
    use crate::random::seeded;

    fn scenario(id: &str) -> Scenario {
        Scenario {
            id: id.to_string(),
            title: format!("Scenario {}", id),
            difficulty: Difficulty::Beginner,
            customer_profile: CustomerProfile {
                name: "Pat".into(),
                company: "Acme".into(),
                role_title: "Buyer".into(),
                budget: "$10K".into(),
                pain_points: vec![],
                personality: "busy".into(),
            },
            opening_message: format!("Opening for {}", id),
            objectives: vec![],
        }
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = ScenarioCatalog::builtin(DEFAULT_ROLE).unwrap();
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog.default_role(), "AE");
        assert_eq!(
            catalog.roles().collect::<Vec<_>>(),
            vec!["AE", "AM", "BDR", "CSM", "SDR"]
        );
    }

    #[test]
    fn test_unknown_role_falls_back_to_default() {
        let catalog = ScenarioCatalog::builtin(DEFAULT_ROLE).unwrap();
        let fallback = catalog.scenarios_for("VP_SALES");
        assert_eq!(fallback, catalog.scenarios_for("AE"));
        assert!(!fallback.is_empty());
        assert!(catalog.registered_scenarios("VP_SALES").is_empty());
    }

    #[test]
    fn test_empty_role_list_falls_back() {
        let catalog = ScenarioCatalog::new(
            "AE",
            vec![
                ("AE".to_string(), vec![scenario("a")]),
                ("SDR".to_string(), vec![]),
            ],
        )
        .unwrap();
        assert_eq!(catalog.scenarios_for("SDR")[0].id, "a");
    }

    #[test]
    fn test_duplicate_id_is_configuration_error() {
        let err = ScenarioCatalog::new(
            "AE",
            vec![
                ("AE".to_string(), vec![scenario("dup")]),
                ("SDR".to_string(), vec![scenario("dup")]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, TrainingError::Configuration(msg) if msg.contains("dup")));
    }

    #[test]
    fn test_empty_default_role_is_configuration_error() {
        let err =
            ScenarioCatalog::new("CSM", vec![("AE".to_string(), vec![scenario("a")])]).unwrap_err();
        assert!(matches!(err, TrainingError::Configuration(_)));
    }

    #[test]
    fn test_pick_is_deterministic_for_seed() {
        let catalog = ScenarioCatalog::new(
            "AE",
            vec![(
                "AE".to_string(),
                vec![scenario("a"), scenario("b"), scenario("c")],
            )],
        )
        .unwrap();
        let first = catalog.pick_scenario("AE", &mut seeded(7)).unwrap().id.clone();
        let second = catalog.pick_scenario("AE", &mut seeded(7)).unwrap().id.clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_find_for_role_respects_resolved_list() {
        let catalog = ScenarioCatalog::builtin(DEFAULT_ROLE).unwrap();
        assert!(catalog.find_for_role("SDR", "sdr_cold_outreach").is_ok());
        let err = catalog
            .find_for_role("SDR", "ae_enterprise_renewal")
            .unwrap_err();
        assert!(matches!(err, TrainingError::UnknownScenario { .. }));
        // Fallback roles resolve against the default list.
        assert!(catalog.find_for_role("NOPE", "ae_new_enterprise").is_ok());
    }

    #[test]
    fn test_register_rejects_existing_id() {
        let mut catalog = ScenarioCatalog::builtin(DEFAULT_ROLE).unwrap();
        catalog.register("SE", scenario("custom_1")).unwrap();
        assert_eq!(catalog.registered_scenarios("SE").len(), 1);
        let err = catalog.register("AE", scenario("custom_1")).unwrap_err();
        assert!(matches!(err, TrainingError::InvalidUpload(_)));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let definition = CatalogDefinition {
            default_role: "SDR".into(),
            roles: BTreeMap::from([("SDR".to_string(), vec![scenario("x")])]),
        };
        std::fs::write(&path, serde_json::to_string(&definition).unwrap()).unwrap();

        let catalog = ScenarioCatalog::from_json_file(&path).unwrap();
        assert_eq!(catalog.default_role(), "SDR");
        assert_eq!(catalog.scenarios_for("AE")[0].id, "x");

        let missing = ScenarioCatalog::from_json_file(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(TrainingError::Configuration(_))));
    }
}
