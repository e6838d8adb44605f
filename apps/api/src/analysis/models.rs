use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

/// Stored in `StructuredResume::contact` when the model found no contact details.
pub const CONTACT_NOT_PROVIDED: &str = "Not provided";

/// A record decoded from model output. `validate` runs after deserialization
/// and covers constraints serde cannot express.
pub trait ModelOutput: DeserializeOwned {
    /// Human-readable record name used in error messages.
    const NAME: &'static str;

    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Resume fields extracted from free text.
///
/// Every field is optional on the wire: absent or `null` arrays become empty,
/// an absent, `null` or blank contact becomes `CONTACT_NOT_PROVIDED`. A field
/// of the wrong type is still a schema violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredResume {
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    /// One entry per role, e.g. "Software Engineer at Acme (2020-2023): built billing APIs".
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub education: Vec<String>,
    /// Reserved for future use; not part of the text sent for matching.
    #[serde(default = "default_contact", deserialize_with = "contact_or_sentinel")]
    pub contact: String,
}

impl Default for StructuredResume {
    fn default() -> Self {
        Self {
            skills: Vec::new(),
            experience: Vec::new(),
            education: Vec::new(),
            contact: default_contact(),
        }
    }
}

impl ModelOutput for StructuredResume {
    const NAME: &'static str = "Structured resume";
}

/// Resume-vs-job comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchAnalysis {
    /// 0–100, never clamped: anything else is rejected by `validate`.
    pub match_percentage: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    /// Usually 2–5 items; not enforced.
    pub suggestions: Vec<String>,
}

impl ModelOutput for MatchAnalysis {
    const NAME: &'static str = "Match analysis";

    fn validate(&self) -> Result<(), String> {
        let pct = self.match_percentage;
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return Err(format!(
                "matchPercentage must be a number between 0 and 100, got {pct}"
            ));
        }
        Ok(())
    }
}

fn default_contact() -> String {
    CONTACT_NOT_PROVIDED.to_string()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn contact_or_sentinel<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(default_contact))
}
