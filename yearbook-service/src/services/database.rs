//! PostgreSQL implementation of [`YearbookStore`] via sqlx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use sqlx::postgres::PgPool;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::store::{ProfileFilter, ProfileRecord, YearbookStore};
use crate::models::{
    ApprovalEvent, ApprovalStatus, Department, Notification, Photo, Role, Session, User,
    UserProfile,
};

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database wrapper from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_record(&self, profile: UserProfile) -> Result<Option<ProfileRecord>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(profile.user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;

        let Some(user) = user else {
            return Ok(None);
        };

        let department = match profile.department_id {
            Some(department_id) => sqlx::query_as::<_, Department>(
                "SELECT * FROM departments WHERE department_id = $1",
            )
            .bind(department_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?,
            None => None,
        };

        Ok(Some(ProfileRecord {
            profile,
            user,
            department,
        }))
    }

    async fn load_records(
        &self,
        profiles: Vec<UserProfile>,
    ) -> Result<Vec<ProfileRecord>, AppError> {
        let mut records = Vec::with_capacity(profiles.len());
        for profile in profiles {
            if let Some(record) = self.load_record(profile).await? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

/// Append the moderation-listing WHERE clauses shared by the page and
/// count queries.
fn push_profile_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProfileFilter) {
    if let Some(department_id) = filter.department_id {
        qb.push(" AND p.department_id = ");
        qb.push_bind(department_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND p.approval_status = ");
        qb.push_bind(status);
    }
    if let Some(year) = filter.graduation_year {
        qb.push(" AND p.batch = ");
        qb.push_bind(year);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (u.full_name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR u.email ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
}

#[async_trait]
impl YearbookStore for Database {
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }

    // ==================== Users ====================

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, full_name, email, password_hash, role, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.user_id)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Email already in use"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!(e)),
        })?;
        Ok(())
    }

    async fn update_user_role(&self, user_id: Uuid, role: Role) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET role = $1 WHERE user_id = $2")
            .bind(role)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn list_users(&self, search: Option<&str>) -> Result<Vec<User>, AppError> {
        let users = match search {
            Some(search) => {
                let pattern = format!("%{}%", search);
                sqlx::query_as::<_, User>(
                    r#"
                    SELECT * FROM users
                    WHERE full_name ILIKE $1 OR email ILIKE $1
                    ORDER BY full_name ASC
                    "#,
                )
                .bind(pattern)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY full_name ASC")
                    .fetch_all(&self.pool)
                    .await
            }
        };

        users.map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    // ==================== Sessions ====================

    async fn insert_session(&self, session: &Session) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, user_id, token_hash_text, expiry_utc, created_utc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session.session_id)
        .bind(session.user_id)
        .bind(&session.token_hash_text)
        .bind(session.expiry_utc)
        .bind(session.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn rotate_session(
        &self,
        current_hash: &str,
        new_hash: &str,
        new_expiry: DateTime<Utc>,
    ) -> Result<Option<Session>, AppError> {
        // Single conditional UPDATE keyed on the current fingerprint: under
        // concurrent refreshes of the same token the row matches exactly
        // once, so the loser sees no session instead of a false success.
        sqlx::query_as::<_, Session>(
            r#"
            UPDATE sessions
            SET token_hash_text = $1, expiry_utc = $2
            WHERE token_hash_text = $3 AND expiry_utc > NOW()
            RETURNING *
            "#,
        )
        .bind(new_hash)
        .bind(new_expiry)
        .bind(current_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn delete_sessions_by_token_hash(&self, token_hash: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash_text = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(result.rows_affected())
    }

    // ==================== Departments ====================

    async fn insert_department(&self, department: &Department) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO departments (department_id, name, email, head_user_id, created_utc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(department.department_id)
        .bind(&department.name)
        .bind(&department.email)
        .bind(department.head_user_id)
        .bind(department.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn list_departments(&self) -> Result<Vec<Department>, AppError> {
        sqlx::query_as::<_, Department>("SELECT * FROM departments ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn find_department_by_id(
        &self,
        department_id: Uuid,
    ) -> Result<Option<Department>, AppError> {
        sqlx::query_as::<_, Department>("SELECT * FROM departments WHERE department_id = $1")
            .bind(department_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    // ==================== Profiles ====================

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile, AppError> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles
                (profile_id, user_id, department_id, batch, profile_quote, description,
                 profile_picture, approval_status, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (user_id) DO UPDATE SET
                department_id = EXCLUDED.department_id,
                batch = EXCLUDED.batch,
                profile_quote = EXCLUDED.profile_quote,
                description = EXCLUDED.description,
                profile_picture = EXCLUDED.profile_picture,
                approval_status = EXCLUDED.approval_status,
                updated_utc = NOW()
            RETURNING *
            "#,
        )
        .bind(profile.profile_id)
        .bind(profile.user_id)
        .bind(profile.department_id)
        .bind(profile.batch)
        .bind(&profile.profile_quote)
        .bind(&profile.description)
        .bind(&profile.profile_picture)
        .bind(profile.approval_status)
        .bind(profile.created_utc)
        .bind(profile.updated_utc)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn find_profile_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ProfileRecord>, AppError> {
        let profile =
            sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;

        match profile {
            Some(profile) => self.load_record(profile).await,
            None => Ok(None),
        }
    }

    async fn find_profile_by_id(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<ProfileRecord>, AppError> {
        let profile =
            sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE profile_id = $1")
                .bind(profile_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;

        match profile {
            Some(profile) => self.load_record(profile).await,
            None => Ok(None),
        }
    }

    async fn list_profiles(
        &self,
        filter: &ProfileFilter,
    ) -> Result<(Vec<ProfileRecord>, i64), AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM user_profiles p JOIN users u ON u.user_id = p.user_id WHERE TRUE",
        );
        push_profile_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT p.* FROM user_profiles p JOIN users u ON u.user_id = p.user_id WHERE TRUE",
        );
        push_profile_filters(&mut qb, filter);
        qb.push(" ORDER BY ");
        qb.push(filter.sort_by.column());
        qb.push(if filter.descending { " DESC" } else { " ASC" });
        qb.push(" LIMIT ");
        qb.push_bind(filter.limit as i64);
        qb.push(" OFFSET ");
        qb.push_bind((filter.page.saturating_sub(1) as i64) * filter.limit as i64);

        let profiles: Vec<UserProfile> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;

        let records = self.load_records(profiles).await?;
        Ok((records, total))
    }

    async fn list_approved_profiles(&self) -> Result<Vec<ProfileRecord>, AppError> {
        let profiles = sqlx::query_as::<_, UserProfile>(
            "SELECT * FROM user_profiles WHERE approval_status = $1",
        )
        .bind(ApprovalStatus::Approved)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;

        self.load_records(profiles).await
    }

    async fn set_profile_status(
        &self,
        profile_id: Uuid,
        status: ApprovalStatus,
    ) -> Result<Option<UserProfile>, AppError> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE user_profiles
            SET approval_status = $1, updated_utc = NOW()
            WHERE profile_id = $2
            RETURNING *
            "#,
        )
        .bind(status)
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn pending_profiles_in_department(
        &self,
        department_id: Uuid,
    ) -> Result<Vec<UserProfile>, AppError> {
        sqlx::query_as::<_, UserProfile>(
            "SELECT * FROM user_profiles WHERE department_id = $1 AND approval_status = $2",
        )
        .bind(department_id)
        .bind(ApprovalStatus::Pending)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    // ==================== Photos / audit ====================

    async fn insert_photo(&self, photo: &Photo) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO photos (photo_id, user_id, url, created_utc)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(photo.photo_id)
        .bind(photo.user_id)
        .bind(&photo.url)
        .bind(photo.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn photos_for_user(&self, user_id: Uuid) -> Result<Vec<Photo>, AppError> {
        sqlx::query_as::<_, Photo>(
            "SELECT * FROM photos WHERE user_id = $1 ORDER BY created_utc DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn insert_approval(&self, event: &ApprovalEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO approval_history
                (approval_id, entity_type, entity_id, action, approved_by, comments, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.approval_id)
        .bind(&event.entity_type)
        .bind(event.entity_id)
        .bind(event.action)
        .bind(event.approved_by)
        .bind(&event.comments)
        .bind(event.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (notification_id, recipient_id, message, created_utc)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(notification.notification_id)
        .bind(notification.recipient_id)
        .bind(&notification.message)
        .bind(notification.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }
}
