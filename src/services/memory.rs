//! In-process document store.

use super::{
    NewRecommendation, NewUser, Recommendation, RecommendationStore, SearchEntry, ServiceError,
    User, UserProfile, UserStore,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};
use uuid::Uuid;

/// Users and recommendations held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    recommendations: RwLock<Vec<Recommendation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn users(&self) -> Result<RwLockReadGuard<'_, HashMap<String, User>>, ServiceError> {
        self.users.read().map_err(|_| poisoned())
    }

    fn users_mut(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, User>>, ServiceError> {
        self.users.write().map_err(|_| poisoned())
    }
}

impl UserStore for MemoryStore {
    fn create_user(&self, new_user: NewUser) -> Result<User, ServiceError> {
        new_user.profile.validate()?;

        let mut users = self.users_mut()?;
        let id = new_user
            .user_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        if users.contains_key(&id) {
            return Err(ServiceError::Validation(format!(
                "User with ID {id} already exists"
            )));
        }

        let now = now_millis();
        let user = User {
            id: id.clone(),
            name: new_user.name,
            profile: new_user.profile,
            search_history: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        users.insert(id, user.clone());
        info!(user_id = %user.id, "created user");
        Ok(user)
    }

    fn get_user(&self, user_id: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.users()?.get(user_id).cloned())
    }

    fn update_user(&self, user_id: &str, updates: &Map<String, Value>) -> Result<bool, ServiceError> {
        let mut users = self.users_mut()?;
        let Some(user) = users.get_mut(user_id) else {
            return Ok(false);
        };

        let mut merged = serde_json::to_value(&user.profile)
            .map_err(|err| ServiceError::Backend(err.to_string()))?;
        if let Value::Object(fields) = &mut merged {
            for (key, value) in updates {
                fields.insert(key.clone(), value.clone());
            }
        }
        let profile: UserProfile = serde_json::from_value(merged)
            .map_err(|err| ServiceError::Validation(format!("Invalid profile update: {err}")))?;
        profile.validate()?;

        user.profile = profile;
        user.updated_at = now_millis();
        debug!(user_id, "updated user profile");
        Ok(true)
    }

    fn delete_user(&self, user_id: &str) -> Result<bool, ServiceError> {
        Ok(self.users_mut()?.remove(user_id).is_some())
    }

    fn add_search(&self, user_id: &str, filters: Value) -> Result<bool, ServiceError> {
        let mut users = self.users_mut()?;
        let Some(user) = users.get_mut(user_id) else {
            return Ok(false);
        };
        let timestamp = now_millis();
        user.search_history.push(SearchEntry { timestamp, filters });
        user.updated_at = timestamp;
        Ok(true)
    }

    fn list_searches(&self, user_id: &str, limit: usize) -> Result<Vec<SearchEntry>, ServiceError> {
        let users = self.users()?;
        let Some(user) = users.get(user_id) else {
            return Ok(Vec::new());
        };
        let skip = user.search_history.len().saturating_sub(limit);
        Ok(user.search_history[skip..].to_vec())
    }
}

impl RecommendationStore for MemoryStore {
    fn create_recommendation(
        &self,
        new_rec: NewRecommendation,
    ) -> Result<Recommendation, ServiceError> {
        new_rec
            .validate()
            .map_err(|err| ServiceError::Validation(format!("Validation error: {err}")))?;

        let mut recommendations = self.recommendations.write().map_err(|_| poisoned())?;
        let id = new_rec
            .recommendation_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        if recommendations.iter().any(|rec| rec.id == id) {
            return Err(ServiceError::Validation(format!(
                "Recommendation with ID {id} already exists"
            )));
        }

        let rec = Recommendation {
            id,
            user_id: new_rec.user_id,
            recommendations: new_rec.recommendations,
            search_criteria: new_rec.search_criteria,
            created_at: now_millis(),
        };
        recommendations.push(rec.clone());
        info!(recommendation_id = %rec.id, user_id = %rec.user_id, "stored recommendations");
        Ok(rec)
    }

    fn list_recommendations_by_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Recommendation>, ServiceError> {
        let recommendations = self.recommendations.read().map_err(|_| poisoned())?;
        // Stored in insertion order, so newest first is a reverse scan.
        Ok(recommendations
            .iter()
            .rev()
            .filter(|rec| rec.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    fn get_recommendation(
        &self,
        recommendation_id: &str,
    ) -> Result<Option<Recommendation>, ServiceError> {
        let recommendations = self.recommendations.read().map_err(|_| poisoned())?;
        Ok(recommendations
            .iter()
            .find(|rec| rec.id == recommendation_id)
            .cloned())
    }
}

fn poisoned() -> ServiceError {
    ServiceError::Backend("store lock poisoned".into())
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
