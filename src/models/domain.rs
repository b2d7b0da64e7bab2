use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Dog gender as recorded in the catalog
///
/// Legacy single-letter codes (`m`, `f`, `u`) are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "dog_gender", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[serde(alias = "m")]
    Male,
    #[serde(alias = "f")]
    Female,
    #[serde(alias = "u")]
    Unknown,
}

/// Dog size as recorded in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "dog_size", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Size {
    #[serde(alias = "s")]
    Small,
    #[serde(alias = "m")]
    Medium,
    #[serde(alias = "l")]
    Large,
    #[serde(alias = "xl")]
    ExtraLarge,
    #[serde(alias = "u")]
    Unknown,
}

/// Coarse age ranges a user can ask for in their preferences
///
/// Ranges are half-open and expressed in months:
/// puppy `[0, 7)`, young `[7, 13)`, adult `[13, 85)`, senior `[85, 361)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "age_bucket", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AgeBucket {
    #[serde(alias = "b")]
    Puppy,
    #[serde(alias = "y")]
    Young,
    #[serde(alias = "a")]
    Adult,
    #[serde(alias = "s")]
    Senior,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 4] = [
        AgeBucket::Puppy,
        AgeBucket::Young,
        AgeBucket::Adult,
        AgeBucket::Senior,
    ];

    /// Month range covered by this bucket
    pub fn months(self) -> Range<i32> {
        match self {
            AgeBucket::Puppy => 0..7,
            AgeBucket::Young => 7..13,
            AgeBucket::Adult => 13..85,
            AgeBucket::Senior => 85..361,
        }
    }

    /// Map an age in months to its bucket, if any
    pub fn for_age(age_months: i32) -> Option<AgeBucket> {
        Self::ALL
            .into_iter()
            .find(|bucket| bucket.months().contains(&age_months))
    }
}

/// A stored swipe decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "decision_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    Liked,
    Disliked,
}

impl DecisionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionStatus::Liked => "liked",
            DecisionStatus::Disliked => "disliked",
        }
    }
}

/// Status requested by a client when browsing or swiping
///
/// `Undecided` means "no decision recorded", it is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Liked,
    Disliked,
    Undecided,
}

impl StatusFilter {
    /// The persisted decision this filter selects, `None` for undecided
    pub fn decision(self) -> Option<DecisionStatus> {
        match self {
            StatusFilter::Liked => Some(DecisionStatus::Liked),
            StatusFilter::Disliked => Some(DecisionStatus::Disliked),
            StatusFilter::Undecided => None,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::Liked => f.write_str("liked"),
            StatusFilter::Disliked => f.write_str("disliked"),
            StatusFilter::Undecided => f.write_str("undecided"),
        }
    }
}

/// Error returned when a status token is not liked, disliked or undecided
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Status '{0}' was incorrect. Must be liked, disliked, or undecided.")]
pub struct ParseStatusError(pub String);

impl FromStr for StatusFilter {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "liked" => Ok(StatusFilter::Liked),
            "disliked" => Ok(StatusFilter::Disliked),
            "undecided" => Ok(StatusFilter::Undecided),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

/// A dog available for adoption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dog {
    pub id: i64,
    pub name: String,
    pub image_reference: String,
    pub breed: String,
    pub age_months: i32,
    pub gender: Gender,
    pub size: Size,
    pub requires_behavioral_assessment: bool,
    pub medical_needs: String,
}

/// Catalog entry before an id has been assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDog {
    pub name: String,
    pub image_reference: String,
    #[serde(default)]
    pub breed: String,
    pub age_months: i32,
    pub gender: Gender,
    pub size: Size,
    #[serde(default)]
    pub requires_behavioral_assessment: bool,
    #[serde(default)]
    pub medical_needs: String,
}

impl NewDog {
    pub fn into_dog(self, id: i64) -> Dog {
        Dog {
            id,
            name: self.name,
            image_reference: self.image_reference,
            breed: self.breed,
            age_months: self.age_months,
            gender: self.gender,
            size: self.size,
            requires_behavioral_assessment: self.requires_behavioral_assessment,
            medical_needs: self.medical_needs,
        }
    }
}

/// One user's decision about one dog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: i64,
    pub user_id: i64,
    pub dog_id: i64,
    pub status: DecisionStatus,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Adoption preferences for a single user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    pub id: i64,
    #[serde(skip_serializing, default)]
    pub user_id: i64,
    pub genders: BTreeSet<Gender>,
    pub age_buckets: BTreeSet<AgeBucket>,
    pub sizes: BTreeSet<Size>,
    pub requires_behavioral_assessment: bool,
}

impl Preference {
    /// Default record created on first access: nothing selected, no assessment required
    pub fn empty(id: i64, user_id: i64) -> Self {
        Self {
            id,
            user_id,
            genders: BTreeSet::new(),
            age_buckets: BTreeSet::new(),
            sizes: BTreeSet::new(),
            requires_behavioral_assessment: false,
        }
    }

    /// Overwrite the fields present in `update`, keep the rest
    pub fn apply(&mut self, update: &PreferenceUpdate) {
        if let Some(genders) = &update.genders {
            self.genders = genders.clone();
        }
        if let Some(age_buckets) = &update.age_buckets {
            self.age_buckets = age_buckets.clone();
        }
        if let Some(sizes) = &update.sizes {
            self.sizes = sizes.clone();
        }
        if let Some(required) = update.requires_behavioral_assessment {
            self.requires_behavioral_assessment = required;
        }
    }
}

/// Partial preference update; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceUpdate {
    pub genders: Option<BTreeSet<Gender>>,
    pub age_buckets: Option<BTreeSet<AgeBucket>>,
    pub sizes: Option<BTreeSet<Size>>,
    pub requires_behavioral_assessment: Option<bool>,
}

/// Registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_bucket_boundaries() {
        assert_eq!(AgeBucket::for_age(0), Some(AgeBucket::Puppy));
        assert_eq!(AgeBucket::for_age(6), Some(AgeBucket::Puppy));
        assert_eq!(AgeBucket::for_age(7), Some(AgeBucket::Young));
        assert_eq!(AgeBucket::for_age(12), Some(AgeBucket::Young));
        assert_eq!(AgeBucket::for_age(13), Some(AgeBucket::Adult));
        assert_eq!(AgeBucket::for_age(84), Some(AgeBucket::Adult));
        assert_eq!(AgeBucket::for_age(85), Some(AgeBucket::Senior));
        assert_eq!(AgeBucket::for_age(360), Some(AgeBucket::Senior));
        assert_eq!(AgeBucket::for_age(361), None);
        assert_eq!(AgeBucket::for_age(-1), None);
    }

    #[test]
    fn test_status_filter_parse_is_case_insensitive() {
        assert_eq!("Liked".parse::<StatusFilter>(), Ok(StatusFilter::Liked));
        assert_eq!("DISLIKED".parse::<StatusFilter>(), Ok(StatusFilter::Disliked));
        assert_eq!("undecided".parse::<StatusFilter>(), Ok(StatusFilter::Undecided));
        assert!("bad".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_status_filter_display_parses_back() {
        for status in [StatusFilter::Liked, StatusFilter::Disliked, StatusFilter::Undecided] {
            assert_eq!(status.to_string().parse::<StatusFilter>(), Ok(status));
        }
    }

    #[test]
    fn test_legacy_codes_deserialize() {
        let gender: Gender = serde_json::from_str("\"f\"").unwrap();
        let size: Size = serde_json::from_str("\"xl\"").unwrap();
        let bucket: AgeBucket = serde_json::from_str("\"b\"").unwrap();
        assert_eq!(gender, Gender::Female);
        assert_eq!(size, Size::ExtraLarge);
        assert_eq!(bucket, AgeBucket::Puppy);
    }

    #[test]
    fn test_preference_apply_keeps_unspecified_fields() {
        let mut pref = Preference::empty(1, 1);
        pref.genders.insert(Gender::Female);

        pref.apply(&PreferenceUpdate {
            sizes: Some([Size::Large].into_iter().collect()),
            ..Default::default()
        });

        assert!(pref.genders.contains(&Gender::Female));
        assert!(pref.sizes.contains(&Size::Large));
        assert!(!pref.requires_behavioral_assessment);
    }
}
