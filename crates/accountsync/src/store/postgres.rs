//! PostgreSQL store implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AccountId, UserId};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::error::{SyncError, SyncResult};
use crate::store::traits::{LedgerTotals, SyncStore};
use crate::types::{Account, AccountSettings, NewAccount, NewLedgerOrder, OrderStatus};

/// PostgreSQL synchronizer store
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wrap an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database with the given pool size
    pub async fn connect(url: &str, max_connections: u32) -> SyncResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| SyncError::Storage(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Create missing tables and indexes
    ///
    /// Idempotent; run at startup. The unique ledger index is what backs
    /// the upsert-or-ignore idempotency of settlement recording.
    pub async fn ensure_schema(&self) -> SyncResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL,
                name TEXT,
                access_token TEXT,
                notify_chat_id BIGINT,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_accounts_user ON accounts (user_id)",
            r#"
            CREATE TABLE IF NOT EXISTS account_settings (
                account_id BIGINT PRIMARY KEY REFERENCES accounts (id),
                min_amount DOUBLE PRECISION,
                max_amount DOUBLE PRECISION,
                auto_mode BOOLEAN NOT NULL DEFAULT FALSE,
                notifications_enabled BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS provider_account_map (
                account_id BIGINT PRIMARY KEY REFERENCES accounts (id),
                provider_account_id TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL,
                account_id BIGINT NOT NULL,
                external_id TEXT NOT NULL,
                status TEXT NOT NULL,
                amount_fiat DOUBLE PRECISION NOT NULL,
                rate DOUBLE PRECISION NOT NULL,
                reward_amount DOUBLE PRECISION NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_orders_user ON orders (user_id)",
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_orders_account_external
                ON orders (account_id, external_id)
            "#,
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| SyncError::Storage(e.to_string()))?;
        }
        tracing::debug!("Schema ensured");
        Ok(())
    }

    fn row_to_account(&self, row: &PgRow) -> SyncResult<Account> {
        Ok(Account {
            id: AccountId(row.get::<i64, _>("id")),
            user_id: UserId(row.get::<i64, _>("user_id")),
            name: row.get("name"),
            access_token: row.get("access_token"),
            notify_chat_id: row.get("notify_chat_id"),
            is_active: row.get("is_active"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn row_to_settings(&self, row: &PgRow) -> SyncResult<AccountSettings> {
        Ok(AccountSettings {
            account_id: AccountId(row.get::<i64, _>("account_id")),
            min_amount: row.get("min_amount"),
            max_amount: row.get("max_amount"),
            auto_mode: row.get("auto_mode"),
            notifications_enabled: row.get("notifications_enabled"),
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl SyncStore for PostgresStore {
    async fn create_account(&self, new: NewAccount) -> SyncResult<Account> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO accounts (user_id, name, access_token, notify_chat_id, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, TRUE, $5, $5)
            RETURNING id
            "#,
        )
        .bind(new.user_id.as_i64())
        .bind(&new.name)
        .bind(&new.access_token)
        .bind(new.notify_chat_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| SyncError::Storage(e.to_string()))?;

        Ok(Account {
            id: AccountId(row.get::<i64, _>("id")),
            user_id: new.user_id,
            name: new.name,
            access_token: new.access_token,
            notify_chat_id: new.notify_chat_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_account(&self, id: AccountId) -> SyncResult<Option<Account>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SyncError::Storage(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(self.row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_accounts(&self, user: UserId) -> SyncResult<Vec<Account>> {
        let rows = sqlx::query("SELECT * FROM accounts WHERE user_id = $1 ORDER BY id")
            .bind(user.as_i64())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SyncError::Storage(e.to_string()))?;

        rows.iter().map(|row| self.row_to_account(row)).collect()
    }

    async fn count_accounts(&self, user: UserId) -> SyncResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM accounts WHERE user_id = $1")
            .bind(user.as_i64())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| SyncError::Storage(e.to_string()))?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn update_account(&self, account: &Account) -> SyncResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET name = $2, access_token = $3, notify_chat_id = $4, is_active = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(account.id.as_i64())
        .bind(&account.name)
        .bind(&account.access_token)
        .bind(account.notify_chat_id)
        .bind(account.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| SyncError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(SyncError::AccountNotFound(account.id));
        }
        Ok(())
    }

    async fn delete_account(&self, id: AccountId) -> SyncResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SyncError::Storage(e.to_string()))?;

        for statement in [
            "DELETE FROM orders WHERE account_id = $1",
            "DELETE FROM account_settings WHERE account_id = $1",
            "DELETE FROM provider_account_map WHERE account_id = $1",
        ] {
            sqlx::query(statement)
                .bind(id.as_i64())
                .execute(&mut *tx)
                .await
                .map_err(|e| SyncError::Storage(e.to_string()))?;
        }

        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await
            .map_err(|e| SyncError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(SyncError::AccountNotFound(id));
        }

        tx.commit()
            .await
            .map_err(|e| SyncError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn get_settings(&self, id: AccountId) -> SyncResult<Option<AccountSettings>> {
        let row = sqlx::query("SELECT * FROM account_settings WHERE account_id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SyncError::Storage(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(self.row_to_settings(&row)?)),
            None => Ok(None),
        }
    }

    async fn upsert_settings(&self, settings: &AccountSettings) -> SyncResult<()> {
        sqlx::query(
            r#"
            INSERT INTO account_settings
                (account_id, min_amount, max_amount, auto_mode, notifications_enabled, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (account_id) DO UPDATE
            SET min_amount = EXCLUDED.min_amount,
                max_amount = EXCLUDED.max_amount,
                auto_mode = EXCLUDED.auto_mode,
                notifications_enabled = EXCLUDED.notifications_enabled
            "#,
        )
        .bind(settings.account_id.as_i64())
        .bind(settings.min_amount)
        .bind(settings.max_amount)
        .bind(settings.auto_mode)
        .bind(settings.notifications_enabled)
        .bind(settings.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| SyncError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn get_provider_id(&self, id: AccountId) -> SyncResult<Option<String>> {
        let row = sqlx::query(
            "SELECT provider_account_id FROM provider_account_map WHERE account_id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SyncError::Storage(e.to_string()))?;

        Ok(row.map(|r| r.get("provider_account_id")))
    }

    async fn put_provider_id(&self, id: AccountId, provider_id: &str) -> SyncResult<()> {
        sqlx::query(
            r#"
            INSERT INTO provider_account_map (account_id, provider_account_id)
            VALUES ($1, $2)
            ON CONFLICT (account_id) DO UPDATE SET provider_account_id = EXCLUDED.provider_account_id
            "#,
        )
        .bind(id.as_i64())
        .bind(provider_id)
        .execute(&self.pool)
        .await
        .map_err(|e| SyncError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn record_settled_order(&self, order: NewLedgerOrder) -> SyncResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO orders
                (user_id, account_id, external_id, status, amount_fiat, rate, reward_amount, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (account_id, external_id) DO NOTHING
            "#,
        )
        .bind(order.user_id.as_i64())
        .bind(order.account_id.as_i64())
        .bind(&order.external_id)
        .bind(order.status.as_str())
        .bind(order.amount_fiat)
        .bind(order.rate)
        .bind(order.reward_amount)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| SyncError::Storage(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn aggregate_settled(
        &self,
        user: UserId,
        since: DateTime<Utc>,
    ) -> SyncResult<LedgerTotals> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS n,
                   COALESCE(SUM(amount_fiat), 0) AS turnover,
                   COALESCE(SUM(reward_amount), 0) AS total_reward
            FROM orders
            WHERE user_id = $1
              AND status IN ($2, $3, $4)
              AND created_at >= $5
            "#,
        )
        .bind(user.as_i64())
        .bind(OrderStatus::Paid.as_str())
        .bind(OrderStatus::Completed.as_str())
        .bind(OrderStatus::Done.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| SyncError::Storage(e.to_string()))?;

        Ok(LedgerTotals {
            count: row.get::<i64, _>("n") as u64,
            turnover: row.get("turnover"),
            total_reward: row.get("total_reward"),
        })
    }
}
