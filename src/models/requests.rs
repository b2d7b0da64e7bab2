use serde::de::{value::StrDeserializer, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use validator::Validate;
use crate::models::domain::{AgeBucket, Gender, NewDog, PreferenceUpdate, Size};

/// Request to register a new account
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Request to exchange credentials for a token
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Request to add a dog to the catalog
///
/// `image_filename` and `age` are accepted as aliases of
/// `image_reference` and `age_months`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDogRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    #[serde(alias = "image_filename")]
    pub image_reference: String,
    #[validate(length(max = 200))]
    #[serde(default)]
    pub breed: String,
    #[validate(range(min = 0))]
    #[serde(alias = "age")]
    pub age_months: i32,
    pub gender: Gender,
    pub size: Size,
    #[serde(default)]
    pub requires_behavioral_assessment: bool,
    #[serde(default)]
    pub medical_needs: String,
}

impl CreateDogRequest {
    pub fn into_new_dog(self) -> NewDog {
        NewDog {
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

/// Partial update of the caller's preferences
///
/// Set-valued fields take either a JSON array (`["female", "male"]`) or the
/// legacy comma-separated form (`"f,m"`). Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePreferencesRequest {
    #[serde(default, alias = "gender", deserialize_with = "flexible_set")]
    pub genders: Option<BTreeSet<Gender>>,
    #[serde(default, alias = "age", deserialize_with = "flexible_set")]
    pub age_buckets: Option<BTreeSet<AgeBucket>>,
    #[serde(default, alias = "size", deserialize_with = "flexible_set")]
    pub sizes: Option<BTreeSet<Size>>,
    #[serde(default)]
    pub requires_behavioral_assessment: Option<bool>,
}

impl UpdatePreferencesRequest {
    pub fn into_update(self) -> PreferenceUpdate {
        PreferenceUpdate {
            genders: self.genders,
            age_buckets: self.age_buckets,
            sizes: self.sizes,
            requires_behavioral_assessment: self.requires_behavioral_assessment,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSet<T> {
    List(Vec<T>),
    Joined(String),
}

fn flexible_set<'de, D, T>(deserializer: D) -> Result<Option<BTreeSet<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Ord,
{
    match Option::<RawSet<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawSet::List(items)) => Ok(Some(items.into_iter().collect())),
        Some(RawSet::Joined(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| {
                let de: StrDeserializer<'_, D::Error> = token.into_deserializer();
                T::deserialize(de)
            })
            .collect::<Result<BTreeSet<T>, _>>()
            .map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_accept_json_arrays() {
        let req: UpdatePreferencesRequest = serde_json::from_str(
            r#"{"genders": ["female"], "sizes": ["large", "extra_large"]}"#,
        )
        .unwrap();

        assert_eq!(req.genders, Some([Gender::Female].into_iter().collect()));
        assert_eq!(req.sizes.as_ref().map(|s| s.len()), Some(2));
        assert!(req.age_buckets.is_none());
    }

    #[test]
    fn test_preferences_accept_legacy_comma_strings() {
        let req: UpdatePreferencesRequest =
            serde_json::from_str(r#"{"gender": "m,f", "age": "b,y", "size": "xl"}"#).unwrap();

        assert_eq!(req.genders.unwrap().len(), 2);
        assert_eq!(
            req.age_buckets,
            Some([AgeBucket::Puppy, AgeBucket::Young].into_iter().collect())
        );
        assert_eq!(req.sizes, Some([Size::ExtraLarge].into_iter().collect()));
    }

    #[test]
    fn test_preferences_reject_unknown_tokens() {
        let result = serde_json::from_str::<UpdatePreferencesRequest>(r#"{"genders": "m,q"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_create_dog_validation() {
        let req: CreateDogRequest = serde_json::from_str(
            r#"{"name": "", "image_filename": "1.jpg", "age": -3, "gender": "m", "size": "s"}"#,
        )
        .unwrap();

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("age_months"));
    }
}
