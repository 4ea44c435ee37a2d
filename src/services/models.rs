//! Documents stored by the collaborators.

use super::ServiceError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields a new user must supply.
pub const REQUIRED_USER_FIELDS: [&str; 8] = [
    "name",
    "budgetMin",
    "budgetMax",
    "make",
    "zipCode",
    "yearMin",
    "yearMax",
    "comfortLevel",
];

/// Car-buying preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub budget_min: i64,
    pub budget_max: i64,
    pub make: String,
    #[serde(default)]
    pub model: Option<String>,
    pub zip_code: String,
    pub year_min: i32,
    pub year_max: i32,
    pub comfort_level: String,
}

impl UserProfile {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.budget_min > self.budget_max {
            return Err(ServiceError::Validation(
                "budgetMin cannot be greater than budgetMax".into(),
            ));
        }
        if self.year_min > self.year_max {
            return Err(ServiceError::Validation(
                "yearMin cannot be greater than yearMax".into(),
            ));
        }
        Ok(())
    }
}

/// Payload for creating a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub user_id: Option<String>,
    pub name: String,
    #[serde(flatten)]
    pub profile: UserProfile,
}

/// One entry of a user's search history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEntry {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub filters: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub profile: UserProfile,
    pub search_history: Vec<SearchEntry>,
    pub created_at: u64,
    pub updated_at: u64,
}

/// A single suggested vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecommendation {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl VehicleRecommendation {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if !(1990..=2026).contains(&self.year) {
            return Err(ServiceError::Validation(format!("Invalid year: {}", self.year)));
        }
        if self.price < 0.0 {
            return Err(ServiceError::Validation("Price cannot be negative".into()));
        }
        Ok(())
    }
}

/// Payload for storing a set of recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecommendation {
    #[serde(default)]
    pub recommendation_id: Option<String>,
    pub user_id: String,
    pub recommendations: Vec<VehicleRecommendation>,
    #[serde(default)]
    pub search_criteria: Value,
}

impl NewRecommendation {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.recommendations.is_empty() {
            return Err(ServiceError::Validation(
                "Recommendations list cannot be empty".into(),
            ));
        }
        self.recommendations
            .iter()
            .try_for_each(VehicleRecommendation::validate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub recommendations: Vec<VehicleRecommendation>,
    pub search_criteria: Value,
    pub created_at: u64,
}

/// One turn of a conversation about a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}
