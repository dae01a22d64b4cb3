use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::config::NetworkStoreConfig;
use crate::db::create_pg_pool;
use crate::models::{fold_case, Jobseeker, JobseekerFilter, JobseekerPatch, NewJobseeker};
use crate::storage::{like_pattern, JobseekerStore, StorageError};

/// Networked store on a PostgreSQL server.
///
/// A server that goes away mid-session fails the affected requests; the pool
/// reconnects on its own once the server is back.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(
        network: &NetworkStoreConfig,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let pool = create_pg_pool(network, max_connections, connect_timeout).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl JobseekerStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn create(&self, new: &NewJobseeker) -> Result<Jobseeker, StorageError> {
        let row = sqlx::query_as::<_, Jobseeker>(
            r#"
            INSERT INTO jobseekers
                (full_name, contact_number, email, gender, age, skill, experience,
                 location, resume_file_name, resume_file_path, status, created_at,
                 full_name_key, email_key, location_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(&new.full_name)
        .bind(&new.contact_number)
        .bind(&new.email)
        .bind(new.gender.as_str())
        .bind(new.age)
        .bind(&new.skill)
        .bind(&new.experience)
        .bind(&new.location)
        .bind(&new.resume_file_name)
        .bind(&new.resume_file_path)
        .bind(&new.status)
        .bind(new.created_at)
        .bind(fold_case(&new.full_name))
        .bind(fold_case(&new.email))
        .bind(fold_case(&new.location))
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get(&self, id: i64) -> Result<Option<Jobseeker>, StorageError> {
        let row = sqlx::query_as::<_, Jobseeker>("SELECT * FROM jobseekers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list(&self, filter: &JobseekerFilter) -> Result<Vec<Jobseeker>, StorageError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM jobseekers WHERE TRUE");

        if let Some(term) = filter.search() {
            let pattern = like_pattern(term);
            qb.push(" AND (full_name_key LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR email_key LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        if let Some(skill) = filter.skill() {
            qb.push(" AND skill = ").push_bind(skill.to_string());
        }
        if let Some(experience) = filter.experience() {
            qb.push(" AND experience = ").push_bind(experience.to_string());
        }
        if let Some(location) = filter.location() {
            qb.push(" AND location_key LIKE ")
                .push_bind(like_pattern(location))
                .push(" ESCAPE '\\'");
        }
        qb.push(" ORDER BY created_at DESC, id DESC");

        let rows = qb
            .build_query_as::<Jobseeker>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn update(
        &self,
        id: i64,
        patch: &JobseekerPatch,
    ) -> Result<Option<Jobseeker>, StorageError> {
        let row = sqlx::query_as::<_, Jobseeker>(
            r#"
            UPDATE jobseekers SET
                full_name      = COALESCE($1, full_name),
                contact_number = COALESCE($2, contact_number),
                email          = COALESCE($3, email),
                gender         = COALESCE($4, gender),
                age            = COALESCE($5, age),
                skill          = COALESCE($6, skill),
                experience     = COALESCE($7, experience),
                location       = COALESCE($8, location),
                status         = COALESCE($9, status),
                full_name_key  = COALESCE($10, full_name_key),
                email_key      = COALESCE($11, email_key),
                location_key   = COALESCE($12, location_key)
            WHERE id = $13
            RETURNING *
            "#,
        )
        .bind(&patch.full_name)
        .bind(&patch.contact_number)
        .bind(&patch.email)
        .bind(&patch.gender)
        .bind(patch.age)
        .bind(&patch.skill)
        .bind(&patch.experience)
        .bind(&patch.location)
        .bind(&patch.status)
        .bind(patch.full_name.as_deref().map(fold_case))
        .bind(patch.email.as_deref().map(fold_case))
        .bind(patch.location.as_deref().map(fold_case))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM jobseekers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_duplicate(
        &self,
        email: &str,
        contact_number: &str,
    ) -> Result<Option<Jobseeker>, StorageError> {
        let row = sqlx::query_as::<_, Jobseeker>(
            r#"
            SELECT * FROM jobseekers
            WHERE email_key = $1 OR contact_number = $2
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(fold_case(email))
        .bind(contact_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
