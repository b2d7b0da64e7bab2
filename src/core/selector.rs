use crate::core::filters::{matches_preference, PreferenceFilter};
use crate::models::{DecisionStatus, Dog, Preference, StatusFilter};
use crate::services::{AdoptionStore, StoreError};

/// What the next-dog lookup is allowed to return
///
/// # Filter policy
/// - `liked` / `disliked`: dogs carrying exactly that decision
/// - explicit `undecided`: dogs with no decision at all
/// - no status: undecided dogs that also satisfy the stored preferences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCriteria {
    pub status: StatusFilter,
    pub preference: Option<PreferenceFilter>,
}

impl SelectionCriteria {
    /// Criteria for an explicitly requested status
    pub fn explicit(status: StatusFilter) -> Self {
        Self {
            status,
            preference: None,
        }
    }

    /// Criteria used when the caller gave no status
    pub fn preferred(preference: &Preference) -> Self {
        Self {
            status: StatusFilter::Undecided,
            preference: Some(PreferenceFilter::from(preference)),
        }
    }

    /// Whether `dog`, with the user's current `decision` on it, qualifies
    #[inline]
    pub fn accepts(&self, dog: &Dog, decision: Option<DecisionStatus>) -> bool {
        if decision != self.status.decision() {
            return false;
        }

        match &self.preference {
            Some(filter) => matches_preference(dog, filter),
            None => true,
        }
    }
}

/// Pick the smallest-id dog above `cursor` accepted by `criteria`
///
/// `decision_of` resolves the user's current decision for a dog id.
pub fn select_next<'a, I, F>(
    dogs: I,
    cursor: i64,
    criteria: &SelectionCriteria,
    decision_of: F,
) -> Option<&'a Dog>
where
    I: IntoIterator<Item = &'a Dog>,
    F: Fn(i64) -> Option<DecisionStatus>,
{
    dogs.into_iter()
        .filter(|dog| dog.id > cursor)
        .filter(|dog| criteria.accepts(dog, decision_of(dog.id)))
        .min_by_key(|dog| dog.id)
}

/// Resolve the next dog for a user
///
/// A missing `requested` status falls back to the user's preferences,
/// creating the default preference record if needed.
pub async fn next_dog(
    store: &dyn AdoptionStore,
    user_id: i64,
    cursor: i64,
    requested: Option<StatusFilter>,
) -> Result<Option<Dog>, StoreError> {
    let criteria = match requested {
        Some(status) => SelectionCriteria::explicit(status),
        None => {
            let preference = store.get_or_create_preference(user_id).await?;
            SelectionCriteria::preferred(&preference)
        }
    };

    tracing::debug!(
        "Selecting next {} dog for user {} after {} (preference filter: {})",
        criteria.status,
        user_id,
        cursor,
        criteria.preference.is_some()
    );

    store.next_dog(user_id, cursor, &criteria).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgeBucket, Gender, Size};
    use std::collections::HashMap;

    fn create_dog(id: i64, gender: Gender, size: Size, age_months: i32) -> Dog {
        Dog {
            id,
            name: format!("Dog {}", id),
            image_reference: format!("{}.jpg", id),
            breed: "Mixed".to_string(),
            age_months,
            gender,
            size,
            requires_behavioral_assessment: false,
            medical_needs: String::new(),
        }
    }

    fn create_catalog() -> Vec<Dog> {
        vec![
            create_dog(1, Gender::Female, Size::Large, 24),
            create_dog(2, Gender::Male, Size::Large, 24),
            create_dog(3, Gender::Female, Size::Small, 3),
            create_dog(7, Gender::Female, Size::Large, 100),
        ]
    }

    #[test]
    fn test_select_next_liked() {
        let dogs = create_catalog();
        let decisions: HashMap<i64, DecisionStatus> =
            [(3, DecisionStatus::Liked), (7, DecisionStatus::Liked)].into_iter().collect();
        let criteria = SelectionCriteria::explicit(StatusFilter::Liked);

        let first = select_next(&dogs, 0, &criteria, |id| decisions.get(&id).copied());
        assert_eq!(first.map(|d| d.id), Some(3));

        let second = select_next(&dogs, 3, &criteria, |id| decisions.get(&id).copied());
        assert_eq!(second.map(|d| d.id), Some(7));

        let exhausted = select_next(&dogs, 7, &criteria, |id| decisions.get(&id).copied());
        assert!(exhausted.is_none());
    }

    #[test]
    fn test_select_next_undecided_skips_decided() {
        let dogs = create_catalog();
        let decisions: HashMap<i64, DecisionStatus> =
            [(1, DecisionStatus::Disliked)].into_iter().collect();
        let criteria = SelectionCriteria::explicit(StatusFilter::Undecided);

        let next = select_next(&dogs, -1, &criteria, |id| decisions.get(&id).copied());
        assert_eq!(next.map(|d| d.id), Some(2));
    }

    #[test]
    fn test_select_next_with_preferences() {
        let dogs = create_catalog();
        let mut preference = Preference::empty(1, 1);
        preference.genders.insert(Gender::Female);
        preference.sizes.insert(Size::Large);
        preference.age_buckets.insert(AgeBucket::Adult);
        let criteria = SelectionCriteria::preferred(&preference);

        let first = select_next(&dogs, 0, &criteria, |_| None);
        assert_eq!(first.map(|d| d.id), Some(1));

        // Dog 2 is male, dog 3 is small, dog 7 is a senior
        let second = select_next(&dogs, 1, &criteria, |_| None);
        assert!(second.is_none());
    }

    #[test]
    fn test_preferred_excludes_decided_dogs() {
        let dogs = create_catalog();
        let criteria = SelectionCriteria::preferred(&Preference::empty(1, 1));

        let next = select_next(&dogs, 0, &criteria, |id| {
            (id == 1).then_some(DecisionStatus::Liked)
        });
        assert_eq!(next.map(|d| d.id), Some(2));
    }
}
