//! Business collaborators consumed by the embedded application.
//!
//! The adapter knows nothing about these; they are the seams the router in
//! [`crate::app`] calls into. [`MemoryStore`] backs both stores in process.

mod memory;
mod models;

pub use memory::MemoryStore;
pub use models::{
    ChatMessage, NewRecommendation, NewUser, Recommendation, SearchEntry, User, UserProfile,
    VehicleRecommendation, REQUIRED_USER_FIELDS,
};

use serde_json::{Map, Value};
use thiserror::Error;

/// Failures reported by collaborators.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// User profile persistence.
pub trait UserStore: Send + Sync {
    fn create_user(&self, user: NewUser) -> Result<User, ServiceError>;

    fn get_user(&self, user_id: &str) -> Result<Option<User>, ServiceError>;

    /// Merge `updates` (camelCase profile fields) into the stored profile.
    /// `false` when the user does not exist.
    fn update_user(&self, user_id: &str, updates: &Map<String, Value>)
        -> Result<bool, ServiceError>;

    fn delete_user(&self, user_id: &str) -> Result<bool, ServiceError>;

    /// Append a search to the user's history. `false` when the user does
    /// not exist.
    fn add_search(&self, user_id: &str, filters: Value) -> Result<bool, ServiceError>;

    /// The most recent `limit` searches, oldest first.
    fn list_searches(&self, user_id: &str, limit: usize) -> Result<Vec<SearchEntry>, ServiceError>;
}

/// Recommendation persistence.
pub trait RecommendationStore: Send + Sync {
    fn create_recommendation(
        &self,
        recommendation: NewRecommendation,
    ) -> Result<Recommendation, ServiceError>;

    /// Newest first.
    fn list_recommendations_by_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Recommendation>, ServiceError>;

    fn get_recommendation(&self, recommendation_id: &str)
        -> Result<Option<Recommendation>, ServiceError>;
}

/// Language-model backed analyses. Inputs and outputs are free-form JSON
/// vehicle descriptions and reports.
pub trait AnalysisGateway: Send + Sync {
    fn analyze_vehicle(&self, vehicle: &Value) -> Result<Value, ServiceError>;

    fn build_checklist(&self, vehicle: &Value) -> Result<Value, ServiceError>;

    fn estimate_insurance(&self, vehicle: &Value) -> Result<Value, ServiceError>;

    fn chat(&self, vehicle: &Value, history: &[ChatMessage]) -> Result<ChatMessage, ServiceError>;
}
