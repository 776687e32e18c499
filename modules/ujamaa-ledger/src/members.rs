//! Member rows: identity upserts, role changes, rank cache refresh.

use sqlx::PgPool;
use ujamaa_common::{RankTier, Result, Role, UjamaaError};

use crate::types::{Member, MemberIdentity};

#[derive(Clone)]
pub struct MemberStore {
    pool: PgPool,
}

impl MemberStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert a member from login identity. Existing profile fields are only
    /// overwritten when the incoming value is present, so a login without a
    /// photo doesn't erase a previously stored one. Always bumps last_active.
    pub async fn upsert(&self, identity: &MemberIdentity) -> Result<Member> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (member_id, provider, display_name, email, photo_url, last_active)
            VALUES ($1, $2, $3, $4, $5, now())
            ON CONFLICT (member_id) DO UPDATE SET
                provider     = EXCLUDED.provider,
                display_name = COALESCE(EXCLUDED.display_name, members.display_name),
                email        = COALESCE(EXCLUDED.email, members.email),
                photo_url    = COALESCE(EXCLUDED.photo_url, members.photo_url),
                last_active  = now()
            RETURNING *
            "#,
        )
        .bind(&identity.member_id)
        .bind(&identity.provider)
        .bind(&identity.display_name)
        .bind(&identity.email)
        .bind(&identity.photo_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(member)
    }

    pub async fn get(&self, member_id: &str) -> Result<Option<Member>> {
        let row = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE member_id = $1")
            .bind(member_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Fetch a member or fail with UnknownMember.
    pub async fn require(&self, member_id: &str) -> Result<Member> {
        self.get(member_id)
            .await?
            .ok_or_else(|| UjamaaError::UnknownMember(member_id.to_string()))
    }

    pub async fn set_role(&self, member_id: &str, role: Role) -> Result<()> {
        let result = sqlx::query("UPDATE members SET role = $2 WHERE member_id = $1")
            .bind(member_id)
            .bind(role.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(UjamaaError::UnknownMember(member_id.to_string()));
        }
        Ok(())
    }

    /// All member ids, oldest first. Used by the batch jobs to walk the
    /// whole membership.
    pub async fn member_ids(&self) -> Result<Vec<String>> {
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT member_id FROM members ORDER BY created_at ASC, member_id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn list(&self, limit: u32) -> Result<Vec<Member>> {
        let rows = sqlx::query_as::<_, Member>(
            r#"
            SELECT * FROM members
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Write the cached rank columns. Only the rank refresh job calls this.
    pub async fn set_rank_cache(
        &self,
        member_id: &str,
        star_total: i64,
        tier: RankTier,
    ) -> Result<()> {
        sqlx::query("UPDATE members SET star_total = $2, star_rank = $3 WHERE member_id = $1")
            .bind(member_id)
            .bind(star_total)
            .bind(tier.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
