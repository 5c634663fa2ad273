//! # User Repository
//!
//! Staff accounts: creation, login, profile edits, role/status changes.
//!
//! | Operation            | Who                          |
//! |----------------------|------------------------------|
//! | create               | admin                        |
//! | list                 | admin: everyone, user: self  |
//! | update_profile       | admin or the account owner   |
//! | set_role_and_status  | admin                        |
//! | change_password      | owner (with current) / admin |

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::password::{hash_password, verify_password};
use daftar_core::validation::{validate_password, validate_user_profile, validate_username};
use daftar_core::{Actor, EmploymentStatus, NewUser, Role, User, UserProfile, ValidationError};

const USER_COLUMNS: &str = r#"
    id, username, first_name, last_name, email, phone_number, national_id,
    address, position, hire_date, bank_account_number, role, current_status,
    is_active, bio, created_at, updated_at
"#;

/// Repository for staff accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn find(&self, id: i64) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn get(&self, id: i64) -> DbResult<User> {
        self.find(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Number of accounts, used by the seeder to detect a fresh database.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Lists accounts visible to the actor, ordered by username.
    pub async fn list(&self, actor: &Actor) -> DbResult<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE ?1 IS NULL OR id = ?1 ORDER BY username",
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(actor.owner_scope())
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Creates an account on behalf of an admin.
    pub async fn create(&self, actor: &Actor, new_user: &NewUser) -> DbResult<User> {
        actor.ensure_admin("create staff accounts")?;
        self.insert(new_user).await
    }

    /// Creates an account with no permission check. Used by the seeder to
    /// bootstrap the first admin.
    pub async fn insert(&self, new_user: &NewUser) -> DbResult<User> {
        let username = validate_username(&new_user.username)?;
        validate_password(&new_user.password)?;
        let profile = validate_user_profile(&new_user.profile)?;

        if self.find_by_username(&username).await?.is_some() {
            return Err(ValidationError::Duplicate {
                field: "username".to_string(),
                value: username,
            }
            .into());
        }
        if let Some(national_id) = &profile.national_id {
            self.ensure_national_id_free(national_id, None).await?;
        }

        let password_hash = hash_password(&new_user.password)?;
        let now = Utc::now();

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (
                username, password_hash, first_name, last_name, email,
                phone_number, national_id, address, position, hire_date,
                bank_account_number, role, current_status, is_active, bio,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 1, ?14, ?15, ?15)
            RETURNING id
            "#,
        )
        .bind(&username)
        .bind(&password_hash)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.email)
        .bind(&profile.phone_number)
        .bind(&profile.national_id)
        .bind(&profile.address)
        .bind(&profile.position)
        .bind(profile.hire_date)
        .bind(&profile.bank_account_number)
        .bind(new_user.role)
        .bind(EmploymentStatus::Active)
        .bind(&profile.bio)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!(id, username = %username, role = new_user.role.as_str(), "User created");
        self.get(id).await
    }

    /// Checks credentials. Returns `None` for unknown users, wrong passwords
    /// and inactive accounts alike.
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<Option<User>> {
        let row: Option<(i64, String, bool)> = sqlx::query_as(
            "SELECT id, password_hash, is_active FROM users WHERE username = ?1",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, hash, is_active)) = row else {
            debug!(username = %username, "Login for unknown user");
            return Ok(None);
        };

        if !verify_password(password, &hash) {
            warn!(user_id = id, "Login with wrong password");
            return Ok(None);
        }

        if !is_active {
            warn!(user_id = id, "Login to inactive account");
            return Ok(None);
        }

        self.find(id).await
    }

    /// Replaces the profile fields of an account.
    pub async fn update_profile(&self, actor: &Actor, id: i64, profile: &UserProfile) -> DbResult<User> {
        actor.ensure_self_or_admin(id, "edit another user's profile")?;
        let profile = validate_user_profile(profile)?;
        if let Some(national_id) = &profile.national_id {
            self.ensure_national_id_free(national_id, Some(id)).await?;
        }

        let result = sqlx::query(
            r#"
            UPDATE users SET
                first_name = ?2,
                last_name = ?3,
                email = ?4,
                phone_number = ?5,
                national_id = ?6,
                address = ?7,
                position = ?8,
                hire_date = ?9,
                bank_account_number = ?10,
                bio = ?11,
                updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.email)
        .bind(&profile.phone_number)
        .bind(&profile.national_id)
        .bind(&profile.address)
        .bind(&profile.position)
        .bind(profile.hire_date)
        .bind(&profile.bank_account_number)
        .bind(&profile.bio)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        debug!(id, "User profile updated");
        self.get(id).await
    }

    /// Changes role, employment status and login permission. Admin only.
    pub async fn set_role_and_status(
        &self,
        actor: &Actor,
        id: i64,
        role: Role,
        current_status: EmploymentStatus,
        is_active: bool,
    ) -> DbResult<User> {
        actor.ensure_admin("change roles or employment status")?;

        let result = sqlx::query(
            r#"
            UPDATE users SET role = ?2, current_status = ?3, is_active = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(role)
        .bind(current_status)
        .bind(is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(id, role = role.as_str(), is_active, "User role/status changed");
        self.get(id).await
    }

    /// Sets a new password.
    ///
    /// Owners must supply their current password. Admins resetting someone
    /// else's password do not.
    pub async fn change_password(
        &self,
        actor: &Actor,
        id: i64,
        current_password: Option<&str>,
        new_password: &str,
    ) -> DbResult<()> {
        actor.ensure_self_or_admin(id, "change another user's password")?;
        validate_password(new_password)?;

        if actor.user_id == id {
            let hash: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| DbError::not_found("User", id))?;

            let current = current_password.unwrap_or_default();
            if !verify_password(current, &hash) {
                return Err(ValidationError::invalid("current_password", "does not match").into());
            }
        }

        let new_hash = hash_password(new_password)?;
        let result = sqlx::query("UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(new_hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(id, "Password changed");
        Ok(())
    }

    async fn ensure_national_id_free(&self, national_id: &str, except: Option<i64>) -> DbResult<()> {
        let taken: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE national_id = ?1 AND id IS NOT ?2")
                .bind(national_id)
                .bind(except)
                .fetch_optional(&self.pool)
                .await?;

        if taken.is_some() {
            return Err(ValidationError::Duplicate {
                field: "national_id".to_string(),
                value: national_id.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn new_user(username: &str, role: Role) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "s3cret-pass".to_string(),
            role,
            profile: UserProfile {
                first_name: "Sara".to_string(),
                last_name: "Ahmadi".to_string(),
                ..Default::default()
            },
        }
    }

    async fn setup() -> (Database, User) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = db.users().insert(&new_user("admin", Role::Admin)).await.unwrap();
        (db, admin)
    }

    #[tokio::test]
    async fn test_create_and_authenticate() {
        let (db, admin) = setup().await;
        let actor = Actor::admin(admin.id);
        let user = db.users().create(&actor, &new_user("sara", Role::User)).await.unwrap();

        assert_eq!(user.display_name(), "Sara Ahmadi");
        assert_eq!(user.current_status, EmploymentStatus::Active);

        let logged_in = db.users().authenticate("sara", "s3cret-pass").await.unwrap();
        assert_eq!(logged_in.map(|u| u.id), Some(user.id));
        assert!(db.users().authenticate("sara", "wrong-pass").await.unwrap().is_none());
        assert!(db.users().authenticate("nobody", "s3cret-pass").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inactive_account_cannot_log_in() {
        let (db, admin) = setup().await;
        let actor = Actor::admin(admin.id);
        let user = db.users().create(&actor, &new_user("sara", Role::User)).await.unwrap();

        db.users()
            .set_role_and_status(&actor, user.id, Role::User, EmploymentStatus::Terminated, false)
            .await
            .unwrap();
        assert!(db.users().authenticate("sara", "s3cret-pass").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_cannot_create_or_change_roles() {
        let (db, admin) = setup().await;
        let user = db
            .users()
            .create(&Actor::admin(admin.id), &new_user("sara", Role::User))
            .await
            .unwrap();
        let as_user = Actor::user(user.id);

        let err = db.users().create(&as_user, &new_user("reza", Role::User)).await.unwrap_err();
        assert!(matches!(err, DbError::PermissionDenied { .. }));

        let err = db
            .users()
            .set_role_and_status(&as_user, user.id, Role::Admin, EmploymentStatus::Active, true)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let (db, admin) = setup().await;
        let err = db
            .users()
            .create(&Actor::admin(admin.id), &new_user("admin", Role::User))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(ValidationError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn test_list_scoped_to_self_for_users() {
        let (db, admin) = setup().await;
        let user = db
            .users()
            .create(&Actor::admin(admin.id), &new_user("sara", Role::User))
            .await
            .unwrap();

        assert_eq!(db.users().list(&Actor::admin(admin.id)).await.unwrap().len(), 2);
        let own = db.users().list(&Actor::user(user.id)).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].id, user.id);
    }

    #[tokio::test]
    async fn test_change_password_requires_current_for_owner() {
        let (db, admin) = setup().await;
        let user = db
            .users()
            .create(&Actor::admin(admin.id), &new_user("sara", Role::User))
            .await
            .unwrap();
        let as_user = Actor::user(user.id);

        let err = db
            .users()
            .change_password(&as_user, user.id, Some("bad-guess"), "new-password-1")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        db.users()
            .change_password(&as_user, user.id, Some("s3cret-pass"), "new-password-1")
            .await
            .unwrap();
        assert!(db.users().authenticate("sara", "new-password-1").await.unwrap().is_some());

        // Admin reset needs no current password.
        db.users()
            .change_password(&Actor::admin(admin.id), user.id, None, "reset-password")
            .await
            .unwrap();
        assert!(db.users().authenticate("sara", "reset-password").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_profile_edit_by_other_user_denied() {
        let (db, admin) = setup().await;
        let user = db
            .users()
            .create(&Actor::admin(admin.id), &new_user("sara", Role::User))
            .await
            .unwrap();

        let profile = UserProfile {
            first_name: "Hacked".to_string(),
            ..Default::default()
        };
        let err = db
            .users()
            .update_profile(&Actor::user(user.id), admin.id, &profile)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::PermissionDenied { .. }));

        let mine = UserProfile {
            first_name: "Sara".to_string(),
            last_name: "Moradi".to_string(),
            phone_number: Some("09121234567".to_string()),
            ..Default::default()
        };
        let updated = db
            .users()
            .update_profile(&Actor::user(user.id), user.id, &mine)
            .await
            .unwrap();
        assert_eq!(updated.display_name(), "Sara Moradi");
    }
}
