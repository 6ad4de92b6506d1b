//! Owner-uploaded training content: extra scenarios and company reference
//! data. Upload payloads carry a JSON Schema so clients can validate before
//! posting.

use crate::{
    error::TrainingError,
    profile::{CustomerProfile, Difficulty, Scenario},
};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Product {
    pub name: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub pricing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CaseStudy {
    pub company: String,
    pub results: String,
    pub industry: String,
}

/// Reference data about the seller's own company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyData {
    pub products: Vec<Product>,
    pub competitors: Vec<String>,
    pub case_studies: Vec<CaseStudy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl Default for CompanyData {
    fn default() -> Self {
        Self {
            products: vec![Product {
                name: "CxSE Platform".to_string(),
                features: vec![
                    "AI Training".to_string(),
                    "Analytics".to_string(),
                    "Integration".to_string(),
                ],
                pricing: vec![
                    "Basic $99/mo".to_string(),
                    "Pro $299/mo".to_string(),
                    "Enterprise $999/mo".to_string(),
                ],
            }],
            competitors: vec!["Competitor A".to_string(), "Competitor B".to_string()],
            case_studies: vec![CaseStudy {
                company: "TechCorp".to_string(),
                results: "30% increase in conversion rates".to_string(),
                industry: "SaaS".to_string(),
            }],
            last_updated: None,
            updated_by: None,
        }
    }
}

/// Partial company data. Present fields replace the stored ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CompanyDataUpload {
    pub products: Option<Vec<Product>>,
    pub competitors: Option<Vec<String>>,
    pub case_studies: Option<Vec<CaseStudy>>,
}

impl CompanyData {
    pub fn merge(&mut self, upload: CompanyDataUpload, updated_by: &str) {
        if let Some(products) = upload.products {
            self.products = products;
        }
        if let Some(competitors) = upload.competitors {
            self.competitors = competitors;
        }
        if let Some(case_studies) = upload.case_studies {
            self.case_studies = case_studies;
        }
        self.last_updated = Some(Utc::now());
        self.updated_by = Some(updated_by.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioUpload {
    /// Trainee role the scenario is registered under; the default role if absent.
    pub role: Option<String>,
    /// Generated as `custom_<uuid>` if absent.
    pub id: Option<String>,
    pub title: String,
    pub difficulty: Difficulty,
    pub customer_profile: CustomerProfile,
    pub opening_message: String,
    #[serde(default)]
    pub objectives: Vec<String>,
}

impl ScenarioUpload {
    /// Validates the upload and resolves it into `(role, Scenario)`.
    pub fn into_scenario(self, default_role: &str) -> Result<(String, Scenario), TrainingError> {
        let required = [
            ("title", &self.title),
            ("opening_message", &self.opening_message),
            ("customer_profile.name", &self.customer_profile.name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(TrainingError::InvalidUpload(format!(
                    "'{}' must not be empty",
                    field
                )));
            }
        }
        let role = match self.role {
            Some(role) if !role.trim().is_empty() => role,
            _ => default_role.to_string(),
        };
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => format!("custom_{}", Uuid::new_v4().simple()),
        };
        Ok((
            role,
            Scenario {
                id,
                title: self.title,
                difficulty: self.difficulty,
                customer_profile: self.customer_profile,
                opening_message: self.opening_message,
                objectives: self.objectives,
            },
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "data_type", content = "data", rename_all = "snake_case")]
pub enum ContentUpload {
    Scenarios(Vec<ScenarioUpload>),
    CompanyData(CompanyDataUpload),
}

impl ContentUpload {
    pub fn data_type(&self) -> &'static str {
        match self {
            ContentUpload::Scenarios(_) => "scenarios",
            ContentUpload::CompanyData(_) => "company_data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub data_type: String,
    /// Ids of registered scenarios; empty for company data.
    pub scenario_ids: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// JSON Schema of [`ContentUpload`].
pub fn upload_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(ContentUpload)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(role: Option<&str>, id: Option<&str>, title: &str) -> ScenarioUpload {
        ScenarioUpload {
            role: role.map(str::to_string),
            id: id.map(str::to_string),
            title: title.to_string(),
            difficulty: Difficulty::Beginner,
            customer_profile: CustomerProfile {
                name: "Jordan".into(),
                company: "Initech".into(),
                role_title: "IT Manager".into(),
                budget: "$40K".into(),
                pain_points: vec!["legacy tooling".into()],
                personality: "skeptical".into(),
            },
            opening_message: "We already have a tool for this.".into(),
            objectives: vec![],
        }
    }

    #[test]
    fn test_defaults_role_and_generates_id() {
        let (role, scenario) = upload(None, None, "Legacy Swap").into_scenario("AE").unwrap();
        assert_eq!(role, "AE");
        assert!(scenario.id.starts_with("custom_"));

        let (role, scenario) = upload(Some("SDR"), Some("sdr_legacy"), "Legacy Swap")
            .into_scenario("AE")
            .unwrap();
        assert_eq!(role, "SDR");
        assert_eq!(scenario.id, "sdr_legacy");
    }

    #[test]
    fn test_blank_title_rejected() {
        let err = upload(None, None, "  ").into_scenario("AE").unwrap_err();
        assert!(matches!(err, TrainingError::InvalidUpload(msg) if msg.contains("title")));
    }

    #[test]
    fn test_company_merge_replaces_present_fields_only() {
        let mut data = CompanyData::default();
        data.merge(
            CompanyDataUpload {
                competitors: Some(vec!["Globex".into()]),
                ..Default::default()
            },
            "owner-1",
        );
        assert_eq!(data.competitors, vec!["Globex".to_string()]);
        assert_eq!(data.products[0].name, "CxSE Platform");
        assert_eq!(data.updated_by.as_deref(), Some("owner-1"));
        assert!(data.last_updated.is_some());
    }

    #[test]
    fn test_upload_payload_shape() {
        let json = r#"{"data_type":"company_data","data":{"competitors":["Hooli"]}}"#;
        let payload: ContentUpload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.data_type(), "company_data");

        let bad = r#"{"data_type":"videos","data":[]}"#;
        assert!(serde_json::from_str::<ContentUpload>(bad).is_err());
    }

    #[test]
    fn test_schema_mentions_variants() {
        let schema = upload_schema().to_string();
        assert!(schema.contains("scenarios"));
        assert!(schema.contains("company_data"));
    }
}
