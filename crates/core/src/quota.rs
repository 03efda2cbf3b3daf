use sqlx::SqlitePool;
use tastebook_shared::user::AiUsage;
use tastebook_shared::{Error, Result};

pub const DEFAULT_DAILY_LIMIT: u32 = 3;

const RESET_WINDOW_SECS: i64 = 24 * 3600;

/// The window is rolling: it restarts 24h after the first use, not at
/// midnight.
pub fn should_reset(now: i64, last_reset: i64) -> bool {
    now - last_reset >= RESET_WINDOW_SECS
}

/// Spend one unit of the user's AI quota, persisting the new state.
///
/// Returns the updated usage, or `Error::Forbidden` when the limit is
/// exhausted inside the current window. A denied attempt leaves the
/// stored state untouched.
pub async fn consume(
    pool: &SqlitePool,
    user_id: &str,
    limit: u32,
    now: i64,
) -> Result<AiUsage> {
    let user = tastebook_db::users::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

    let usage = if should_reset(now, user.ai_usage.last_reset) {
        AiUsage {
            count: 1,
            last_reset: now,
        }
    } else if user.ai_usage.count >= limit {
        return Err(Error::Forbidden(
            "You have reached the daily AI suggestion limit".to_string(),
        ));
    } else {
        AiUsage {
            count: user.ai_usage.count + 1,
            last_reset: user.ai_usage.last_reset,
        }
    };

    tastebook_db::users::set_ai_usage(pool, user_id, &usage).await?;
    Ok(usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_pool;
    use tastebook_shared::user::Role;

    async fn seeded_user(pool: &SqlitePool) -> String {
        let new_user = tastebook_db::users::NewUser {
            name: "Quota Tester".to_string(),
            email: "quota@example.com".to_string(),
            password_hash: "x".to_string(),
            food_preference: None,
            short_bio: None,
            role: Role::User,
            is_verified: true,
        };
        tastebook_db::users::create(pool, &new_user).await.unwrap().id
    }

    #[test]
    fn reset_boundary() {
        assert!(should_reset(RESET_WINDOW_SECS, 0));
        assert!(!should_reset(RESET_WINDOW_SECS - 1, 0));
        assert!(!should_reset(0, 0));
    }

    #[tokio::test]
    async fn limit_is_enforced_then_window_resets() {
        let pool = memory_pool().await;
        let user_id = seeded_user(&pool).await;
        let start = 1_000_000;

        for expected in 1..=DEFAULT_DAILY_LIMIT {
            let usage = consume(&pool, &user_id, DEFAULT_DAILY_LIMIT, start)
                .await
                .unwrap();
            assert_eq!(usage.count, expected);
        }

        let err = consume(&pool, &user_id, DEFAULT_DAILY_LIMIT, start + 100)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        // Denial must not have clobbered the stored state.
        let stored = tastebook_db::users::find_by_id(&pool, &user_id)
            .await
            .unwrap()
            .unwrap()
            .ai_usage;
        assert_eq!(stored.count, DEFAULT_DAILY_LIMIT);

        let later = start + RESET_WINDOW_SECS;
        let usage = consume(&pool, &user_id, DEFAULT_DAILY_LIMIT, later)
            .await
            .unwrap();
        assert_eq!(usage.count, 1);
        assert_eq!(usage.last_reset, later);
    }

    #[tokio::test]
    async fn first_use_starts_a_window() {
        let pool = memory_pool().await;
        let user_id = seeded_user(&pool).await;

        // Seed state has last_reset 0, far outside any window.
        let usage = consume(&pool, &user_id, DEFAULT_DAILY_LIMIT, 5_000_000)
            .await
            .unwrap();
        assert_eq!(usage.count, 1);
        assert_eq!(usage.last_reset, 5_000_000);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let pool = memory_pool().await;
        let err = consume(&pool, &"f".repeat(24), DEFAULT_DAILY_LIMIT, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
