use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::collections::BTreeSet;
use std::time::Duration;
use crate::core::{PreferenceFilter, SelectionCriteria};
use crate::models::{
    AgeBucket, Decision, DecisionStatus, Dog, Gender, NewDog, Preference, PreferenceUpdate, Size,
    StatusFilter, User,
};
use crate::services::store::{AdoptionStore, StoreError};

const DOG_COLUMNS: &str = "d.id, d.name, d.image_reference, d.breed, d.age_months, d.gender, \
     d.size, d.requires_behavioral_assessment, d.medical_needs";

const PREFERENCE_COLUMNS: &str =
    "id, user_id, genders, age_buckets, sizes, requires_behavioral_assessment";

// Foreign key names from the initial migration
const DECISION_USER_FK: &str = "decisions_user_id_fkey";
const DECISION_DOG_FK: &str = "decisions_dog_id_fkey";
const PREFERENCE_USER_FK: &str = "preferences_user_id_fkey";

/// Row a failed write was pointing at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MissingReference {
    User,
    Dog,
}

fn missing_reference(constraint: Option<&str>) -> Option<MissingReference> {
    match constraint? {
        DECISION_USER_FK | PREFERENCE_USER_FK => Some(MissingReference::User),
        DECISION_DOG_FK => Some(MissingReference::Dog),
        _ => None,
    }
}

/// Map a foreign-key violation to the record that was missing
fn reference_error(err: sqlx::Error, user_id: i64, dog_id: Option<i64>) -> StoreError {
    let missing = match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            missing_reference(db.constraint())
        }
        _ => None,
    };

    match (missing, dog_id) {
        (Some(MissingReference::User), _) => StoreError::UnknownUser(user_id),
        (Some(MissingReference::Dog), Some(dog_id)) => {
            StoreError::NotFound(format!("dog {}", dog_id))
        }
        _ => StoreError::SqlxError(err),
    }
}

/// PostgreSQL-backed adoption store
///
/// Uniqueness of decisions per (user, dog) and of preferences per user is
/// enforced by table constraints; upserts go through `ON CONFLICT`.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    async fn dog_exists(&self, dog_id: i64) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM dogs WHERE id = $1)")
            .bind(dog_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

fn dog_from_row(row: &PgRow) -> Result<Dog, sqlx::Error> {
    Ok(Dog {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        image_reference: row.try_get("image_reference")?,
        breed: row.try_get("breed")?,
        age_months: row.try_get("age_months")?,
        gender: row.try_get("gender")?,
        size: row.try_get("size")?,
        requires_behavioral_assessment: row.try_get("requires_behavioral_assessment")?,
        medical_needs: row.try_get("medical_needs")?,
    })
}

fn preference_from_row(row: &PgRow) -> Result<Preference, sqlx::Error> {
    let genders: Vec<Gender> = row.try_get("genders")?;
    let age_buckets: Vec<AgeBucket> = row.try_get("age_buckets")?;
    let sizes: Vec<Size> = row.try_get("sizes")?;

    Ok(Preference {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        genders: genders.into_iter().collect(),
        age_buckets: age_buckets.into_iter().collect(),
        sizes: sizes.into_iter().collect(),
        requires_behavioral_assessment: row.try_get("requires_behavioral_assessment")?,
    })
}

fn decision_from_row(row: &PgRow) -> Result<Decision, sqlx::Error> {
    Ok(Decision {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        dog_id: row.try_get("dog_id")?,
        status: row.try_get("status")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

fn to_vec<T: Copy>(set: &BTreeSet<T>) -> Vec<T> {
    set.iter().copied().collect()
}

/// Select dogs joined to this user's decisions; the caller appends `WHERE` terms
fn dogs_for_user(user_id: i64) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {} FROM dogs d LEFT JOIN decisions ud ON ud.dog_id = d.id AND ud.user_id = ",
        DOG_COLUMNS
    ));
    qb.push_bind(user_id);
    qb.push(" WHERE TRUE");
    qb
}

fn push_status_clause(qb: &mut QueryBuilder<'static, Postgres>, status: StatusFilter) {
    match status.decision() {
        Some(decision) => {
            qb.push(" AND ud.status = ").push_bind(decision);
        }
        None => {
            qb.push(" AND ud.id IS NULL");
        }
    }
}

fn push_preference_clause(qb: &mut QueryBuilder<'static, Postgres>, filter: &PreferenceFilter) {
    if !filter.genders.is_empty() {
        qb.push(" AND d.gender = ANY(")
            .push_bind(to_vec(&filter.genders))
            .push(")");
    }

    if !filter.sizes.is_empty() {
        qb.push(" AND d.size = ANY(")
            .push_bind(to_vec(&filter.sizes))
            .push(")");
    }

    if !filter.age_ranges.is_empty() {
        qb.push(" AND (");
        let mut ranges = qb.separated(" OR ");
        for range in &filter.age_ranges {
            ranges
                .push("(d.age_months >= ")
                .push_bind_unseparated(range.start)
                .push_unseparated(" AND d.age_months < ")
                .push_bind_unseparated(range.end)
                .push_unseparated(")");
        }
        qb.push(")");
    }

    qb.push(" AND d.requires_behavioral_assessment = ")
        .push_bind(filter.requires_behavioral_assessment);
}

#[async_trait]
impl AdoptionStore for PostgresStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let query = r#"
            INSERT INTO users (username, password_hash, created_at)
            VALUES ($1, $2, NOW())
            RETURNING id, username, password_hash, created_at
        "#;

        let row = sqlx::query(query)
            .bind(username)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    StoreError::Conflict(format!("username '{}' is already taken", username))
                }
                other => StoreError::SqlxError(other),
            })?;

        let user = user_from_row(&row)?;
        tracing::info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let query = r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE username = $1
        "#;

        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn count_users(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create_dog(&self, dog: NewDog) -> Result<Dog, StoreError> {
        let query = r#"
            INSERT INTO dogs (name, image_reference, breed, age_months, gender, size,
                              requires_behavioral_assessment, medical_needs)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
        "#;

        let id: i64 = sqlx::query_scalar(query)
            .bind(&dog.name)
            .bind(&dog.image_reference)
            .bind(&dog.breed)
            .bind(dog.age_months)
            .bind(dog.gender)
            .bind(dog.size)
            .bind(dog.requires_behavioral_assessment)
            .bind(&dog.medical_needs)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!("Created dog {} ({})", dog.name, id);
        Ok(dog.into_dog(id))
    }

    async fn get_dog(&self, dog_id: i64) -> Result<Option<Dog>, StoreError> {
        let query = format!("SELECT {} FROM dogs d WHERE d.id = $1", DOG_COLUMNS);

        let row = sqlx::query(&query)
            .bind(dog_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(dog_from_row).transpose()?)
    }

    async fn list_dogs(&self) -> Result<Vec<Dog>, StoreError> {
        let query = format!("SELECT {} FROM dogs d ORDER BY d.id", DOG_COLUMNS);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let dogs: Result<Vec<Dog>, _> = rows.iter().map(dog_from_row).collect();
        Ok(dogs?)
    }

    async fn delete_dog(&self, dog_id: i64) -> Result<bool, StoreError> {
        // decisions.dog_id cascades
        let result = sqlx::query("DELETE FROM dogs WHERE id = $1")
            .bind(dog_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_dogs(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dogs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Uses INSERT ... ON CONFLICT so concurrent first swipes cannot create
    /// two rows. `updated_at` only moves when the status actually changes.
    async fn record_decision(
        &self,
        user_id: i64,
        dog_id: i64,
        status: DecisionStatus,
    ) -> Result<Decision, StoreError> {
        let query = r#"
            INSERT INTO decisions (user_id, dog_id, status, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, dog_id)
            DO UPDATE SET
                status = EXCLUDED.status,
                updated_at = CASE
                    WHEN decisions.status = EXCLUDED.status THEN decisions.updated_at
                    ELSE EXCLUDED.updated_at
                END
            RETURNING id, user_id, dog_id, status, updated_at
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .bind(dog_id)
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| reference_error(e, user_id, Some(dog_id)))?;

        tracing::debug!(
            "Recorded decision: {} -> {} ({})",
            user_id,
            dog_id,
            status.as_str()
        );

        Ok(decision_from_row(&row)?)
    }

    async fn clear_decision(&self, user_id: i64, dog_id: i64) -> Result<bool, StoreError> {
        if !self.dog_exists(dog_id).await? {
            return Err(StoreError::NotFound(format!("dog {}", dog_id)));
        }

        let result = sqlx::query("DELETE FROM decisions WHERE user_id = $1 AND dog_id = $2")
            .bind(user_id)
            .bind(dog_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn status_of(&self, user_id: i64, dog_id: i64) -> Result<Option<DecisionStatus>, StoreError> {
        let status: Option<DecisionStatus> = sqlx::query_scalar(
            "SELECT status FROM decisions WHERE user_id = $1 AND dog_id = $2",
        )
        .bind(user_id)
        .bind(dog_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(status)
    }

    async fn list_dogs_with_status(
        &self,
        user_id: i64,
        status: StatusFilter,
    ) -> Result<Vec<Dog>, StoreError> {
        let mut qb = dogs_for_user(user_id);
        push_status_clause(&mut qb, status);
        qb.push(" ORDER BY d.id");

        let rows = qb.build().fetch_all(&self.pool).await?;

        let dogs: Result<Vec<Dog>, _> = rows.iter().map(dog_from_row).collect();
        Ok(dogs?)
    }

    /// Creation is `ON CONFLICT DO NOTHING` so concurrent first reads agree
    async fn get_or_create_preference(&self, user_id: i64) -> Result<Preference, StoreError> {
        sqlx::query("INSERT INTO preferences (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| reference_error(e, user_id, None))?;

        let query = format!("SELECT {} FROM preferences WHERE user_id = $1", PREFERENCE_COLUMNS);
        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(preference_from_row(&row)?)
    }

    async fn update_preference(
        &self,
        user_id: i64,
        update: &PreferenceUpdate,
    ) -> Result<Preference, StoreError> {
        let query = format!(
            r#"
            INSERT INTO preferences (user_id, genders, age_buckets, sizes, requires_behavioral_assessment)
            VALUES (
                $1,
                COALESCE($2::dog_gender[], '{{}}'),
                COALESCE($3::age_bucket[], '{{}}'),
                COALESCE($4::dog_size[], '{{}}'),
                COALESCE($5::boolean, FALSE)
            )
            ON CONFLICT (user_id)
            DO UPDATE SET
                genders = COALESCE($2::dog_gender[], preferences.genders),
                age_buckets = COALESCE($3::age_bucket[], preferences.age_buckets),
                sizes = COALESCE($4::dog_size[], preferences.sizes),
                requires_behavioral_assessment =
                    COALESCE($5::boolean, preferences.requires_behavioral_assessment)
            RETURNING {}
            "#,
            PREFERENCE_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(update.genders.as_ref().map(to_vec))
            .bind(update.age_buckets.as_ref().map(to_vec))
            .bind(update.sizes.as_ref().map(to_vec))
            .bind(update.requires_behavioral_assessment)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| reference_error(e, user_id, None))?;

        tracing::debug!("Updated preferences for user {}", user_id);
        Ok(preference_from_row(&row)?)
    }

    async fn next_dog(
        &self,
        user_id: i64,
        cursor: i64,
        criteria: &SelectionCriteria,
    ) -> Result<Option<Dog>, StoreError> {
        let mut qb = dogs_for_user(user_id);
        qb.push(" AND d.id > ").push_bind(cursor);
        push_status_clause(&mut qb, criteria.status);
        if let Some(filter) = &criteria.preference {
            push_preference_clause(&mut qb, filter);
        }
        qb.push(" ORDER BY d.id LIMIT 1");

        let row = qb.build().fetch_optional(&self.pool).await?;

        Ok(row.as_ref().map(dog_from_row).transpose()?)
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
