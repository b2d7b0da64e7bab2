use std::collections::BTreeSet;
use std::ops::Range;
use crate::models::{AgeBucket, Dog, Gender, Preference, Size};

/// Attribute restrictions derived from a user's stored preferences
///
/// An empty set places no restriction on that attribute. The assessment
/// flag always has to match exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceFilter {
    pub genders: BTreeSet<Gender>,
    pub sizes: BTreeSet<Size>,
    pub age_ranges: Vec<Range<i32>>,
    pub requires_behavioral_assessment: bool,
}

impl From<&Preference> for PreferenceFilter {
    fn from(preference: &Preference) -> Self {
        Self {
            genders: preference.genders.clone(),
            sizes: preference.sizes.clone(),
            age_ranges: merge_age_ranges(&preference.age_buckets),
            requires_behavioral_assessment: preference.requires_behavioral_assessment,
        }
    }
}

/// Collapse the selected buckets into the fewest month ranges
///
/// Adjacent buckets share a boundary, so `{puppy, young}` becomes `[0, 13)`.
pub fn merge_age_ranges(buckets: &BTreeSet<AgeBucket>) -> Vec<Range<i32>> {
    let mut merged: Vec<Range<i32>> = Vec::with_capacity(buckets.len());

    // BTreeSet iterates in bucket order, which is also month order
    for range in buckets.iter().map(|bucket| bucket.months()) {
        match merged.last_mut() {
            Some(last) if last.end == range.start => last.end = range.end,
            _ => merged.push(range),
        }
    }

    merged
}

/// Check whether a dog satisfies the preference restrictions
#[inline]
pub fn matches_preference(dog: &Dog, filter: &PreferenceFilter) -> bool {
    if !filter.genders.is_empty() && !filter.genders.contains(&dog.gender) {
        return false;
    }

    if !filter.sizes.is_empty() && !filter.sizes.contains(&dog.size) {
        return false;
    }

    if !filter.age_ranges.is_empty()
        && !filter
            .age_ranges
            .iter()
            .any(|range| range.contains(&dog.age_months))
    {
        return false;
    }

    dog.requires_behavioral_assessment == filter.requires_behavioral_assessment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_dog(gender: Gender, size: Size, age_months: i32) -> Dog {
        Dog {
            id: 1,
            name: "Muffin".to_string(),
            image_reference: "3.jpg".to_string(),
            breed: "Boxer".to_string(),
            age_months,
            gender,
            size,
            requires_behavioral_assessment: false,
            medical_needs: String::new(),
        }
    }

    fn create_test_filter() -> PreferenceFilter {
        let mut preference = Preference::empty(1, 1);
        preference.genders.insert(Gender::Female);
        preference.sizes.insert(Size::Large);
        preference.age_buckets.insert(AgeBucket::Adult);
        PreferenceFilter::from(&preference)
    }

    #[test]
    fn test_preference_match() {
        let dog = create_test_dog(Gender::Female, Size::Large, 24);
        assert!(matches_preference(&dog, &create_test_filter()));
    }

    #[test]
    fn test_preference_fail_gender() {
        let dog = create_test_dog(Gender::Male, Size::Large, 24);
        assert!(!matches_preference(&dog, &create_test_filter()));
    }

    #[test]
    fn test_preference_fail_age() {
        let dog = create_test_dog(Gender::Female, Size::Large, 6);
        assert!(!matches_preference(&dog, &create_test_filter()));
    }

    #[test]
    fn test_preference_fail_assessment() {
        let mut dog = create_test_dog(Gender::Female, Size::Large, 24);
        dog.requires_behavioral_assessment = true;
        assert!(!matches_preference(&dog, &create_test_filter()));
    }

    #[test]
    fn test_empty_preference_is_unrestricted() {
        let filter = PreferenceFilter::from(&Preference::empty(1, 1));
        let dog = create_test_dog(Gender::Unknown, Size::ExtraLarge, 500);
        assert!(matches_preference(&dog, &filter));
    }

    #[test]
    fn test_merge_adjacent_buckets() {
        let buckets: BTreeSet<AgeBucket> =
            [AgeBucket::Puppy, AgeBucket::Young, AgeBucket::Senior].into_iter().collect();

        assert_eq!(merge_age_ranges(&buckets), vec![0..13, 85..361]);
    }
}
