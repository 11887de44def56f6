use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use merx_core::BoxError;
use merx_order::models::{NewOrder, Order, OrderStatus, OrderedProduct};
use merx_order::repository::OrderRepository;

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn items_for_order(&self, order_id: Uuid) -> Result<Vec<OrderedProduct>, BoxError> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT order_id, product_id, name, description, unit_price, quantity \
             FROM order_items WHERE order_id = $1 ORDER BY product_id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItemRow::into_product).collect())
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    account_id: i64,
    total_price: Decimal,
    status: String,
}

impl OrderRow {
    fn into_order(self, products: Vec<OrderedProduct>) -> Result<Order, BoxError> {
        Ok(Order {
            id: self.id,
            created_at: self.created_at,
            account_id: self.account_id,
            total_price: self.total_price,
            status: self.status.parse::<OrderStatus>()?,
            products,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    #[allow(dead_code)]
    order_id: Uuid,
    product_id: String,
    name: String,
    description: String,
    unit_price: Decimal,
    quantity: i32,
}

impl OrderItemRow {
    fn into_product(self) -> OrderedProduct {
        OrderedProduct {
            product_id: self.product_id,
            name: self.name,
            description: self.description,
            unit_price: self.unit_price,
            quantity: self.quantity as u32,
        }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create_order(&self, order: &NewOrder) -> Result<Order, BoxError> {
        let order_id = Uuid::new_v4();
        let created_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, created_at, account_id, total_price, status) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order_id)
        .bind(created_at)
        .bind(order.account_id)
        .bind(order.total_price)
        .bind(OrderStatus::Created.as_str())
        .execute(&mut *tx)
        .await?;

        for product in &order.products {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, name, description, unit_price, quantity) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(order_id)
            .bind(&product.product_id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.unit_price)
            .bind(product.quantity as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Order {
            id: order_id,
            created_at,
            account_id: order.account_id,
            total_price: order.total_price,
            status: OrderStatus::Created,
            products: order.products.clone(),
        })
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, BoxError> {
        let row: Option<OrderRow> = sqlx::query_as(
            "SELECT id, created_at, account_id, total_price, status FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let products = self.items_for_order(row.id).await?;
                Ok(Some(row.into_order(products)?))
            }
            None => Ok(None),
        }
    }

    async fn orders_for_account(&self, account_id: i64) -> Result<Vec<Order>, BoxError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT id, created_at, account_id, total_price, status \
             FROM orders WHERE account_id = $1 ORDER BY created_at DESC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let products = self.items_for_order(row.id).await?;
            orders.push(row.into_order(products)?);
        }
        Ok(orders)
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<(), BoxError> {
        sqlx::query("UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
