//! Analysis backend response types
//!
//! Every field is optional and decoded leniently: a value of the wrong JSON
//! type is treated as absent instead of failing the whole response, so the
//! renderer can always fall back to a placeholder.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of a tabular section, with the backend's key order preserved
pub type Record = Map<String, Value>;

/// Table name -> column descriptors (or whatever the backend sent for that table)
pub type SchemaContext = Map<String, Value>;

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(value_text)
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s],
        _ => Vec::new(),
    })
}

/// Rows of a tabular section. Elements that are not objects are dropped one by
/// one; a value that is not a list at all is absent.
fn record_list<'de, D>(deserializer: D) -> Result<Option<Vec<Record>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(record) => Some(record),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

/// Display text of a JSON value: strings verbatim, null empty, the rest as JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub database: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub database_used: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub original_query: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub summary: Option<Summary>,
    #[serde(default, deserialize_with = "lenient")]
    pub optimization: Option<Optimization>,
    #[serde(default, deserialize_with = "lenient")]
    pub cost_analysis: Option<CostAnalysis>,
    #[serde(default, deserialize_with = "lenient")]
    pub schema_improvements: Option<SchemaImprovements>,
    #[serde(default, deserialize_with = "lenient")]
    pub data_quality: Option<DataQuality>,
    #[serde(default, deserialize_with = "lenient")]
    pub technical_details: Option<TechnicalDetails>,
    /// Accepted when `technical_details.schema_context` is absent
    #[serde(default, deserialize_with = "lenient")]
    pub schema_context: Option<SchemaContext>,
}

impl AnalysisResponse {
    pub fn database_name(&self) -> Option<&str> {
        self.database
            .as_deref()
            .or(self.database_used.as_deref())
            .filter(|s| !s.is_empty())
    }

    pub fn schema_context(&self) -> Option<&SchemaContext> {
        self.technical_details
            .as_ref()
            .and_then(|t| t.schema_context.as_ref())
            .or(self.schema_context.as_ref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default, deserialize_with = "lenient")]
    pub performance_impact: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub optimization_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Optimization {
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub optimized_query: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub why_faster: Option<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub recommendations: Vec<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub warnings: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub estimated_impact: Option<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub engine_advice: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostAnalysis {
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub estimated_cost: Option<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub cost_saving_tips: Vec<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub warnings: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaImprovements {
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub recommended_indexes: Vec<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub schema_changes: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataQuality {
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub issues: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub confidence: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub reasoning: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechnicalDetails {
    #[serde(default, deserialize_with = "record_list")]
    pub explain_plan: Option<Vec<Record>>,
    #[serde(default, deserialize_with = "lenient")]
    pub sample_rows: Option<SampleRows>,
    #[serde(default, deserialize_with = "lenient")]
    pub schema_context: Option<SchemaContext>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleRows {
    #[serde(default, deserialize_with = "record_list")]
    pub rows: Option<Vec<Record>>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub error: Option<String>,
}

/// Response of `/analyze-schema`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaOverview {
    #[serde(default, deserialize_with = "lenient")]
    pub database: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub tables: Option<SchemaContext>,
}
