//! Storage abstraction for the relational backend.
//!
//! Everything the service persists goes through [`YearbookStore`], which is
//! constructed once at startup and injected through `AppState`. The
//! production implementation is [`super::Database`] (PostgreSQL via sqlx);
//! [`MemoryStore`] backs the integration tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    ApprovalEvent, ApprovalStatus, Department, Notification, Photo, Role, Session, User,
    UserProfile,
};

/// Sort key for the moderation listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSort {
    CreatedUtc,
    UpdatedUtc,
    Batch,
}

impl ProfileSort {
    /// Map the client-facing `sortBy` value; unknown values fall back to
    /// creation time.
    pub fn from_query(value: &str) -> Self {
        match value {
            "batch" | "graduationYear" => ProfileSort::Batch,
            "updatedAt" => ProfileSort::UpdatedUtc,
            _ => ProfileSort::CreatedUtc,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            ProfileSort::CreatedUtc => "p.created_utc",
            ProfileSort::UpdatedUtc => "p.updated_utc",
            ProfileSort::Batch => "p.batch",
        }
    }
}

/// Filter, sort, and page parameters for the moderation listing.
#[derive(Debug, Clone)]
pub struct ProfileFilter {
    pub department_id: Option<Uuid>,
    pub status: Option<ApprovalStatus>,
    pub graduation_year: Option<i32>,
    pub search: Option<String>,
    pub sort_by: ProfileSort,
    pub descending: bool,
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
}

impl Default for ProfileFilter {
    fn default() -> Self {
        Self {
            department_id: None,
            status: None,
            graduation_year: None,
            search: None,
            sort_by: ProfileSort::CreatedUtc,
            descending: true,
            page: 1,
            limit: 10,
        }
    }
}

/// A profile joined with its owner and (when assigned) department.
#[derive(Debug, Clone)]
pub struct ProfileRecord {
    pub profile: UserProfile,
    pub user: User,
    pub department: Option<Department>,
}

#[async_trait]
pub trait YearbookStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    // ==================== Users ====================

    /// Exact-match email lookup (email uniqueness is case-sensitive per
    /// the storage collation).
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError>;
    /// Fails with `Conflict` when the email is already registered.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;
    async fn update_user_role(&self, user_id: Uuid, role: Role) -> Result<(), AppError>;
    /// All users, optionally filtered by a case-insensitive substring over
    /// name or email, sorted by name.
    async fn list_users(&self, search: Option<&str>) -> Result<Vec<User>, AppError>;

    // ==================== Sessions ====================

    async fn insert_session(&self, session: &Session) -> Result<(), AppError>;
    /// Atomic rotation: replace the stored fingerprint and push the expiry
    /// forward, conditional on the current fingerprint still matching an
    /// unexpired session. Returns `None` when nothing matched; under
    /// concurrent refreshes of the same token exactly one caller wins.
    async fn rotate_session(
        &self,
        current_hash: &str,
        new_hash: &str,
        new_expiry: DateTime<Utc>,
    ) -> Result<Option<Session>, AppError>;
    /// Delete every session matching the fingerprint; returns the count so
    /// logout stays idempotent (zero matches is fine).
    async fn delete_sessions_by_token_hash(&self, token_hash: &str) -> Result<u64, AppError>;

    // ==================== Departments ====================

    async fn insert_department(&self, department: &Department) -> Result<(), AppError>;
    async fn list_departments(&self) -> Result<Vec<Department>, AppError>;
    async fn find_department_by_id(
        &self,
        department_id: Uuid,
    ) -> Result<Option<Department>, AppError>;

    // ==================== Profiles ====================

    /// Insert or replace the user's profile; resubmission resets the
    /// approval status to `Pending`.
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile, AppError>;
    async fn find_profile_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ProfileRecord>, AppError>;
    async fn find_profile_by_id(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<ProfileRecord>, AppError>;
    /// Moderation listing; returns the page plus the total match count.
    async fn list_profiles(
        &self,
        filter: &ProfileFilter,
    ) -> Result<(Vec<ProfileRecord>, i64), AppError>;
    /// Approved profiles only, for the public overview.
    async fn list_approved_profiles(&self) -> Result<Vec<ProfileRecord>, AppError>;
    async fn set_profile_status(
        &self,
        profile_id: Uuid,
        status: ApprovalStatus,
    ) -> Result<Option<UserProfile>, AppError>;
    async fn pending_profiles_in_department(
        &self,
        department_id: Uuid,
    ) -> Result<Vec<UserProfile>, AppError>;

    // ==================== Photos / audit ====================

    async fn insert_photo(&self, photo: &Photo) -> Result<(), AppError>;
    async fn photos_for_user(&self, user_id: Uuid) -> Result<Vec<Photo>, AppError>;
    async fn insert_approval(&self, event: &ApprovalEvent) -> Result<(), AppError>;
    async fn insert_notification(&self, notification: &Notification) -> Result<(), AppError>;
}

/// In-memory store used by the integration tests. Mutations take the one
/// lock, so the rotation CAS has the same winner-takes-it semantics as the
/// conditional UPDATE in PostgreSQL.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    sessions: Vec<Session>,
    departments: Vec<Department>,
    profiles: Vec<UserProfile>,
    photos: Vec<Photo>,
    approvals: Vec<ApprovalEvent>,
    notifications: Vec<Notification>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: number of approval-history rows recorded so far.
    pub fn approval_count(&self) -> usize {
        self.inner.lock().unwrap().approvals.len()
    }

    /// Test hook: notifications recorded for a recipient.
    pub fn notifications_for(&self, recipient_id: Uuid) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .map(|n| n.message.clone())
            .collect()
    }

    fn record(inner: &Inner, profile: &UserProfile) -> Option<ProfileRecord> {
        let user = inner
            .users
            .iter()
            .find(|u| u.user_id == profile.user_id)?
            .clone();
        let department = profile.department_id.and_then(|id| {
            inner
                .departments
                .iter()
                .find(|d| d.department_id == id)
                .cloned()
        });
        Some(ProfileRecord {
            profile: profile.clone(),
            user,
            department,
        })
    }
}

#[async_trait]
impl YearbookStore for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(anyhow::anyhow!("Email already in use")));
        }
        inner.users.push(user.clone());
        Ok(())
    }

    async fn update_user_role(&self, user_id: Uuid, role: Role) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.iter_mut().find(|u| u.user_id == user_id) {
            user.role = role;
        }
        Ok(())
    }

    async fn list_users(&self, search: Option<&str>) -> Result<Vec<User>, AppError> {
        let inner = self.inner.lock().unwrap();
        let needle = search.map(|s| s.to_lowercase());
        let mut users: Vec<User> = inner
            .users
            .iter()
            .filter(|u| match &needle {
                Some(needle) => {
                    u.full_name.to_lowercase().contains(needle)
                        || u.email.to_lowercase().contains(needle)
                }
                None => true,
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(users)
    }

    async fn insert_session(&self, session: &Session) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        inner.sessions.push(session.clone());
        Ok(())
    }

    async fn rotate_session(
        &self,
        current_hash: &str,
        new_hash: &str,
        new_expiry: DateTime<Utc>,
    ) -> Result<Option<Session>, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let Some(session) = inner
            .sessions
            .iter_mut()
            .find(|s| s.token_hash_text == current_hash && s.expiry_utc > now)
        else {
            return Ok(None);
        };

        session.token_hash_text = new_hash.to_string();
        session.expiry_utc = new_expiry;
        Ok(Some(session.clone()))
    }

    async fn delete_sessions_by_token_hash(&self, token_hash: &str) -> Result<u64, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.sessions.len();
        inner.sessions.retain(|s| s.token_hash_text != token_hash);
        Ok((before - inner.sessions.len()) as u64)
    }

    async fn insert_department(&self, department: &Department) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        inner.departments.push(department.clone());
        Ok(())
    }

    async fn list_departments(&self) -> Result<Vec<Department>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut departments = inner.departments.clone();
        departments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(departments)
    }

    async fn find_department_by_id(
        &self,
        department_id: Uuid,
    ) -> Result<Option<Department>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .departments
            .iter()
            .find(|d| d.department_id == department_id)
            .cloned())
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner
            .profiles
            .iter_mut()
            .find(|p| p.user_id == profile.user_id)
        {
            existing.department_id = profile.department_id;
            existing.batch = profile.batch;
            existing.profile_quote = profile.profile_quote.clone();
            existing.description = profile.description.clone();
            existing.profile_picture = profile.profile_picture.clone();
            existing.approval_status = ApprovalStatus::Pending;
            existing.updated_utc = Utc::now();
            return Ok(existing.clone());
        }
        inner.profiles.push(profile.clone());
        Ok(profile.clone())
    }

    async fn find_profile_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ProfileRecord>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .profiles
            .iter()
            .find(|p| p.user_id == user_id)
            .and_then(|p| Self::record(&inner, p)))
    }

    async fn find_profile_by_id(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<ProfileRecord>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .profiles
            .iter()
            .find(|p| p.profile_id == profile_id)
            .and_then(|p| Self::record(&inner, p)))
    }

    async fn list_profiles(
        &self,
        filter: &ProfileFilter,
    ) -> Result<(Vec<ProfileRecord>, i64), AppError> {
        let inner = self.inner.lock().unwrap();
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());

        let mut matches: Vec<ProfileRecord> = inner
            .profiles
            .iter()
            .filter(|p| {
                filter
                    .department_id
                    .map_or(true, |id| p.department_id == Some(id))
            })
            .filter(|p| filter.status.map_or(true, |s| p.approval_status == s))
            .filter(|p| filter.graduation_year.map_or(true, |y| p.batch == y))
            .filter_map(|p| Self::record(&inner, p))
            .filter(|r| match &needle {
                Some(needle) => {
                    r.user.full_name.to_lowercase().contains(needle)
                        || r.user.email.to_lowercase().contains(needle)
                }
                None => true,
            })
            .collect();

        matches.sort_by(|a, b| {
            let ordering = match filter.sort_by {
                ProfileSort::CreatedUtc => a.profile.created_utc.cmp(&b.profile.created_utc),
                ProfileSort::UpdatedUtc => a.profile.updated_utc.cmp(&b.profile.updated_utc),
                ProfileSort::Batch => a.profile.batch.cmp(&b.profile.batch),
            };
            if filter.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });

        let total = matches.len() as i64;
        let offset = (filter.page.saturating_sub(1) as usize) * filter.limit as usize;
        let page: Vec<ProfileRecord> = matches
            .into_iter()
            .skip(offset)
            .take(filter.limit as usize)
            .collect();

        Ok((page, total))
    }

    async fn list_approved_profiles(&self) -> Result<Vec<ProfileRecord>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .profiles
            .iter()
            .filter(|p| p.approval_status == ApprovalStatus::Approved)
            .filter_map(|p| Self::record(&inner, p))
            .collect())
    }

    async fn set_profile_status(
        &self,
        profile_id: Uuid,
        status: ApprovalStatus,
    ) -> Result<Option<UserProfile>, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(profile) = inner
            .profiles
            .iter_mut()
            .find(|p| p.profile_id == profile_id)
        else {
            return Ok(None);
        };
        profile.approval_status = status;
        profile.updated_utc = Utc::now();
        Ok(Some(profile.clone()))
    }

    async fn pending_profiles_in_department(
        &self,
        department_id: Uuid,
    ) -> Result<Vec<UserProfile>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .profiles
            .iter()
            .filter(|p| {
                p.department_id == Some(department_id)
                    && p.approval_status == ApprovalStatus::Pending
            })
            .cloned()
            .collect())
    }

    async fn insert_photo(&self, photo: &Photo) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        inner.photos.push(photo.clone());
        Ok(())
    }

    async fn photos_for_user(&self, user_id: Uuid) -> Result<Vec<Photo>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut photos: Vec<Photo> = inner
            .photos
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        photos.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));
        Ok(photos)
    }

    async fn insert_approval(&self, event: &ApprovalEvent) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        inner.approvals.push(event.clone());
        Ok(())
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        inner.notifications.push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn seeded_user(store: &MemoryStore) -> User {
        let user = User::new(
            "Alice".to_string(),
            "a@x.com".to_string(),
            "hash".to_string(),
        );
        store.insert_user(&user).await.unwrap();
        user
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let user = seeded_user(&store).await;

        let twin = User::new("Other".to_string(), user.email.clone(), "hash2".to_string());
        let err = store.insert_user(&twin).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn email_lookup_is_case_sensitive() {
        let store = MemoryStore::new();
        seeded_user(&store).await;

        assert!(store.find_user_by_email("a@x.com").await.unwrap().is_some());
        assert!(store.find_user_by_email("A@X.COM").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rotation_is_one_time_use() {
        let store = MemoryStore::new();
        let user = seeded_user(&store).await;
        let session = Session::new(user.user_id, "hash-0".to_string(), 7);
        store.insert_session(&session).await.unwrap();

        let expiry = Utc::now() + Duration::days(7);
        let first = store
            .rotate_session("hash-0", "hash-1", expiry)
            .await
            .unwrap();
        assert!(first.is_some());

        // The same current hash cannot win twice.
        let second = store
            .rotate_session("hash-0", "hash-2", expiry)
            .await
            .unwrap();
        assert!(second.is_none());

        // The rotated hash is now the live one.
        let third = store
            .rotate_session("hash-1", "hash-2", expiry)
            .await
            .unwrap();
        assert!(third.is_some());
    }

    #[tokio::test]
    async fn expired_sessions_never_rotate() {
        let store = MemoryStore::new();
        let user = seeded_user(&store).await;
        let mut session = Session::new(user.user_id, "hash-0".to_string(), 7);
        session.expiry_utc = Utc::now() - Duration::seconds(1);
        store.insert_session(&session).await.unwrap();

        let rotated = store
            .rotate_session("hash-0", "hash-1", Utc::now() + Duration::days(7))
            .await
            .unwrap();
        assert!(rotated.is_none());
    }

    #[tokio::test]
    async fn session_deletion_is_idempotent() {
        let store = MemoryStore::new();
        let user = seeded_user(&store).await;
        let session = Session::new(user.user_id, "hash-0".to_string(), 7);
        store.insert_session(&session).await.unwrap();

        assert_eq!(
            store.delete_sessions_by_token_hash("hash-0").await.unwrap(),
            1
        );
        assert_eq!(
            store.delete_sessions_by_token_hash("hash-0").await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn resubmission_resets_approval() {
        let store = MemoryStore::new();
        let user = seeded_user(&store).await;

        let profile = UserProfile::new(user.user_id, None, 2024, None, None, None);
        let stored = store.upsert_profile(&profile).await.unwrap();
        store
            .set_profile_status(stored.profile_id, ApprovalStatus::Approved)
            .await
            .unwrap();

        let resubmitted = UserProfile::new(
            user.user_id,
            None,
            2024,
            Some("new quote".to_string()),
            None,
            None,
        );
        let updated = store.upsert_profile(&resubmitted).await.unwrap();

        assert_eq!(updated.profile_id, stored.profile_id);
        assert_eq!(updated.approval_status, ApprovalStatus::Pending);
        assert_eq!(updated.profile_quote.as_deref(), Some("new quote"));
    }
}
