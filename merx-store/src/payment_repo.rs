use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use merx_core::BoxError;
use merx_payment::models::{Customer, Transaction, TransactionStatus};
use merx_payment::repository::{CustomerRepository, TransactionRepository};

pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    account_id: i64,
    customer_id: String,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn find_by_account(&self, account_id: i64) -> Result<Option<Customer>, BoxError> {
        let row: Option<CustomerRow> = sqlx::query_as(
            "SELECT account_id, customer_id, created_at FROM customers WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Customer {
            account_id: r.account_id,
            customer_id: r.customer_id,
            created_at: r.created_at,
        }))
    }

    async fn save(&self, customer: &Customer) -> Result<(), BoxError> {
        // Concurrent first-time checkouts can race here; the first
        // mapping wins and the loser's row is dropped.
        sqlx::query(
            "INSERT INTO customers (account_id, customer_id, created_at) \
             VALUES ($1, $2, $3) ON CONFLICT (account_id) DO NOTHING",
        )
        .bind(customer.account_id)
        .bind(&customer.customer_id)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub struct PgTransactionRepository {
    pool: PgPool,
}

impl PgTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    product_id: String,
    order_id: Uuid,
    account_id: i64,
    customer_id: String,
    amount: i64,
    currency: String,
    payment_id: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_transaction(self) -> Result<Transaction, BoxError> {
        Ok(Transaction {
            product_id: self.product_id,
            order_id: self.order_id,
            account_id: self.account_id,
            customer_id: self.customer_id,
            amount: self.amount,
            currency: self.currency,
            payment_id: self.payment_id,
            status: self.status.parse::<TransactionStatus>()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn insert(&self, transaction: &Transaction) -> Result<(), BoxError> {
        sqlx::query(
            "INSERT INTO transactions \
             (product_id, order_id, account_id, customer_id, amount, currency, payment_id, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&transaction.product_id)
        .bind(transaction.order_id)
        .bind(transaction.account_id)
        .bind(&transaction.customer_id)
        .bind(transaction.amount)
        .bind(&transaction.currency)
        .bind(&transaction.payment_id)
        .bind(transaction.status.as_str())
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_product(&self, product_id: &str) -> Result<Option<Transaction>, BoxError> {
        let row: Option<TransactionRow> = sqlx::query_as(
            "SELECT product_id, order_id, account_id, customer_id, amount, currency, \
                    payment_id, status, created_at, updated_at \
             FROM transactions WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TransactionRow::into_transaction).transpose()
    }

    async fn settle(
        &self,
        product_id: &str,
        payment_id: &str,
        status: TransactionStatus,
    ) -> Result<bool, BoxError> {
        // Only a pending row settles; terminal rows are left untouched
        // so the caller can tell replays from conflicts.
        let result = sqlx::query(
            "UPDATE transactions SET payment_id = $2, status = $3, updated_at = NOW() \
             WHERE product_id = $1 AND status = $4",
        )
        .bind(product_id)
        .bind(payment_id)
        .bind(status.as_str())
        .bind(TransactionStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
