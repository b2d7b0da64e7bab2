use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use crate::core::{select_next, SelectionCriteria};
use crate::models::{
    Decision, DecisionStatus, Dog, NewDog, Preference, PreferenceUpdate, StatusFilter, User,
};
use crate::services::store::{AdoptionStore, StoreError};

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    dogs: BTreeMap<i64, Dog>,
    decisions: HashMap<(i64, i64), Decision>,
    preferences: HashMap<i64, Preference>,
    next_user_id: i64,
    next_dog_id: i64,
    next_decision_id: i64,
    next_preference_id: i64,
}

impl MemoryState {
    fn allocate(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn decision_of(&self, user_id: i64, dog_id: i64) -> Option<DecisionStatus> {
        self.decisions.get(&(user_id, dog_id)).map(|d| d.status)
    }

    fn ensure_user(&self, user_id: i64) -> Result<(), StoreError> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(StoreError::UnknownUser(user_id))
        }
    }

    fn preference_entry(&mut self, user_id: i64) -> Result<&mut Preference, StoreError> {
        self.ensure_user(user_id)?;

        let Self {
            preferences,
            next_preference_id,
            ..
        } = self;

        Ok(preferences.entry(user_id).or_insert_with(|| {
            let id = Self::allocate(next_preference_id);
            Preference::empty(id, user_id)
        }))
    }
}

/// In-process adoption store
///
/// Every operation runs under a single lock, which gives the same
/// one-row-per-(user, dog) and one-preference-per-user guarantees the
/// PostgreSQL constraints provide. State is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdoptionStore for MemoryStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.username == username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' is already taken",
                username
            )));
        }

        let id = MemoryState::allocate(&mut state.next_user_id);
        let user = User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: chrono::Utc::now(),
        };
        state.users.insert(id, user.clone());

        tracing::info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn count_users(&self) -> Result<i64, StoreError> {
        Ok(self.state.read().await.users.len() as i64)
    }

    async fn create_dog(&self, dog: NewDog) -> Result<Dog, StoreError> {
        let mut state = self.state.write().await;
        let id = MemoryState::allocate(&mut state.next_dog_id);
        let dog = dog.into_dog(id);
        state.dogs.insert(id, dog.clone());

        tracing::debug!("Created dog {} ({})", dog.name, id);
        Ok(dog)
    }

    async fn get_dog(&self, dog_id: i64) -> Result<Option<Dog>, StoreError> {
        Ok(self.state.read().await.dogs.get(&dog_id).cloned())
    }

    async fn list_dogs(&self) -> Result<Vec<Dog>, StoreError> {
        Ok(self.state.read().await.dogs.values().cloned().collect())
    }

    async fn delete_dog(&self, dog_id: i64) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        if state.dogs.remove(&dog_id).is_none() {
            return Ok(false);
        }

        state.decisions.retain(|(_, dog), _| *dog != dog_id);
        Ok(true)
    }

    async fn count_dogs(&self) -> Result<i64, StoreError> {
        Ok(self.state.read().await.dogs.len() as i64)
    }

    async fn record_decision(
        &self,
        user_id: i64,
        dog_id: i64,
        status: DecisionStatus,
    ) -> Result<Decision, StoreError> {
        let mut state = self.state.write().await;

        if !state.dogs.contains_key(&dog_id) {
            return Err(StoreError::NotFound(format!("dog {}", dog_id)));
        }
        state.ensure_user(user_id)?;

        let now = chrono::Utc::now();
        let MemoryState {
            decisions,
            next_decision_id,
            ..
        } = &mut *state;

        let decision = decisions
            .entry((user_id, dog_id))
            .and_modify(|existing| {
                if existing.status != status {
                    existing.status = status;
                    existing.updated_at = now;
                }
            })
            .or_insert_with(|| Decision {
                id: MemoryState::allocate(next_decision_id),
                user_id,
                dog_id,
                status,
                updated_at: now,
            })
            .clone();

        tracing::debug!(
            "Recorded decision: {} -> {} ({})",
            user_id,
            dog_id,
            status.as_str()
        );

        Ok(decision)
    }

    async fn clear_decision(&self, user_id: i64, dog_id: i64) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;

        if !state.dogs.contains_key(&dog_id) {
            return Err(StoreError::NotFound(format!("dog {}", dog_id)));
        }

        Ok(state.decisions.remove(&(user_id, dog_id)).is_some())
    }

    async fn status_of(&self, user_id: i64, dog_id: i64) -> Result<Option<DecisionStatus>, StoreError> {
        Ok(self.state.read().await.decision_of(user_id, dog_id))
    }

    async fn list_dogs_with_status(
        &self,
        user_id: i64,
        status: StatusFilter,
    ) -> Result<Vec<Dog>, StoreError> {
        let state = self.state.read().await;
        let wanted = status.decision();

        Ok(state
            .dogs
            .values()
            .filter(|dog| state.decision_of(user_id, dog.id) == wanted)
            .cloned()
            .collect())
    }

    async fn get_or_create_preference(&self, user_id: i64) -> Result<Preference, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.preference_entry(user_id)?.clone())
    }

    async fn update_preference(
        &self,
        user_id: i64,
        update: &PreferenceUpdate,
    ) -> Result<Preference, StoreError> {
        let mut state = self.state.write().await;
        let preference = state.preference_entry(user_id)?;
        preference.apply(update);

        tracing::debug!("Updated preferences for user {}", user_id);
        Ok(preference.clone())
    }

    async fn next_dog(
        &self,
        user_id: i64,
        cursor: i64,
        criteria: &SelectionCriteria,
    ) -> Result<Option<Dog>, StoreError> {
        let state = self.state.read().await;

        // BTreeMap range keeps the scan to ids above the cursor
        let candidates = state
            .dogs
            .range(cursor.saturating_add(1)..)
            .map(|(_, dog)| dog);

        Ok(select_next(candidates, cursor, criteria, |dog_id| {
            state.decision_of(user_id, dog_id)
        })
        .cloned())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Size};

    fn new_dog(name: &str) -> NewDog {
        NewDog {
            name: name.to_string(),
            image_reference: format!("{}.jpg", name),
            breed: "Labrador".to_string(),
            age_months: 24,
            gender: Gender::Female,
            size: Size::Large,
            requires_behavioral_assessment: false,
            medical_needs: String::new(),
        }
    }

    #[tokio::test]
    async fn test_record_decision_upserts() {
        let store = MemoryStore::new();
        store.create_user("test", "hash").await.unwrap();
        let dog = store.create_dog(new_dog("Muffin")).await.unwrap();

        let first = store.record_decision(1, dog.id, DecisionStatus::Liked).await.unwrap();
        let again = store.record_decision(1, dog.id, DecisionStatus::Liked).await.unwrap();
        assert_eq!(first, again);

        let changed = store.record_decision(1, dog.id, DecisionStatus::Disliked).await.unwrap();
        assert_eq!(changed.id, first.id);
        assert_eq!(store.status_of(1, dog.id).await.unwrap(), Some(DecisionStatus::Disliked));
    }

    #[tokio::test]
    async fn test_record_decision_unknown_dog() {
        let store = MemoryStore::new();
        let result = store.record_decision(1, 42, DecisionStatus::Liked).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_dog_cascades_decisions() {
        let store = MemoryStore::new();
        store.create_user("test", "hash").await.unwrap();
        let dog = store.create_dog(new_dog("Hank")).await.unwrap();
        store.record_decision(1, dog.id, DecisionStatus::Liked).await.unwrap();

        assert!(store.delete_dog(dog.id).await.unwrap());
        assert!(!store.delete_dog(dog.id).await.unwrap());
        assert_eq!(store.status_of(1, dog.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_user_is_rejected() {
        let store = MemoryStore::new();
        let dog = store.create_dog(new_dog("Pepper")).await.unwrap();

        let decision = store.record_decision(42, dog.id, DecisionStatus::Liked).await;
        assert!(matches!(decision, Err(StoreError::UnknownUser(42))));

        let preference = store.get_or_create_preference(42).await;
        assert!(matches!(preference, Err(StoreError::UnknownUser(42))));

        let update = store.update_preference(42, &PreferenceUpdate::default()).await;
        assert!(matches!(update, Err(StoreError::UnknownUser(42))));
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        store.create_user("test", "hash").await.unwrap();

        let result = store.create_user("test", "other").await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_next_dog_with_negative_cursor() {
        let store = MemoryStore::new();
        let dog = store.create_dog(new_dog("Francesca")).await.unwrap();
        let criteria = SelectionCriteria::explicit(StatusFilter::Undecided);

        let next = store.next_dog(1, i64::MIN, &criteria).await.unwrap();
        assert_eq!(next.map(|d| d.id), Some(dog.id));
    }
}
