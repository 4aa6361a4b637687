//! Accounts and customer profiles.

use async_trait::async_trait;
use sqlx::PgConnection;

use record_store_core::{AccountId, ProfileId};

use super::{PgStore, ProfileRow, profile_columns};
use crate::db::RepositoryError;
use crate::db::repository::ProfileRepository;
use crate::models::{NewAccount, Profile, ProfileUpdate, profile::non_empty};

/// Create the profile row for `account` if it does not exist yet.
async fn ensure_profile(
    conn: &mut PgConnection,
    account: AccountId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO user_profile (account_id) VALUES ($1)
        ON CONFLICT (account_id) DO NOTHING
        ",
    )
    .bind(account)
    .execute(conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_foreign_key_violation()
        {
            return RepositoryError::NotFound;
        }
        RepositoryError::Database(e)
    })?;
    Ok(())
}

async fn profile_by_account(
    conn: &mut PgConnection,
    account: AccountId,
) -> Result<Profile, RepositoryError> {
    let row = sqlx::query_as::<_, ProfileRow>(concat!(
        "SELECT ",
        profile_columns!(),
        r"
        FROM user_profile up
        JOIN account ac ON ac.id = up.account_id
        WHERE ac.id = $1
        "
    ))
    .bind(account)
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    Profile::try_from(row)
}

/// Load a profile by its own id.
pub(super) async fn profile_by_id(
    conn: &mut PgConnection,
    id: ProfileId,
) -> Result<Profile, RepositoryError> {
    let row = sqlx::query_as::<_, ProfileRow>(concat!(
        "SELECT ",
        profile_columns!(),
        r"
        FROM user_profile up
        JOIN account ac ON ac.id = up.account_id
        WHERE up.id = $1
        "
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    Profile::try_from(row)
}

#[async_trait]
impl ProfileRepository for PgStore {
    async fn create_account(&self, account: &NewAccount) -> Result<AccountId, RepositoryError> {
        sqlx::query_scalar(
            r"
            INSERT INTO account (username, email, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&account.username)
        .bind(account.email.as_ref().map(|e| e.as_str()))
        .bind(&account.first_name)
        .bind(&account.last_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match RepositoryError::from_write(e) {
            RepositoryError::Conflict(_) => RepositoryError::Conflict(format!(
                "username '{}' is already taken",
                account.username
            )),
            other => other,
        })
    }

    async fn get_or_create_profile(&self, account: AccountId) -> Result<Profile, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        ensure_profile(&mut conn, account).await?;
        profile_by_account(&mut conn, account).await
    }

    async fn update_profile(
        &self,
        account: AccountId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        ensure_profile(&mut tx, account).await?;

        sqlx::query(
            r"
            UPDATE account SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name)
            WHERE id = $1
            ",
        )
        .bind(account)
        .bind(update.first_name.as_deref().map(str::trim))
        .bind(update.last_name.as_deref().map(str::trim))
        .execute(&mut *tx)
        .await?;

        // Each optional column gets a "present" flag so that an explicit
        // clear can be told apart from an omitted field.
        let address = update.address.as_deref().map(non_empty);
        let city = update.city.as_deref().map(non_empty);
        let phone = update.phone.as_deref().map(non_empty);
        let zip_code = update
            .zip_code
            .as_ref()
            .map(|z| z.as_ref().map(|z| z.as_str().to_owned()));

        sqlx::query(
            r"
            UPDATE user_profile SET
                address = CASE WHEN $2 THEN $3 ELSE address END,
                zip_code = CASE WHEN $4 THEN $5 ELSE zip_code END,
                city = CASE WHEN $6 THEN $7 ELSE city END,
                phone = CASE WHEN $8 THEN $9 ELSE phone END
            WHERE account_id = $1
            ",
        )
        .bind(account)
        .bind(address.is_some())
        .bind(address.flatten())
        .bind(zip_code.is_some())
        .bind(zip_code.flatten())
        .bind(city.is_some())
        .bind(city.flatten())
        .bind(phone.is_some())
        .bind(phone.flatten())
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        let profile = profile_by_account(&mut tx, account).await?;
        tx.commit().await?;
        Ok(profile)
    }
}
