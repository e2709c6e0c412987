//! Delivery order repository.

use std::sync::Arc;

use forkd_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder};

use crate::entities::{DeliveryOrder, delivery_order};

/// Repository for delivery orders.
#[derive(Clone)]
pub struct DeliveryOrderRepository {
    db: Arc<DatabaseConnection>,
}

impl DeliveryOrderRepository {
    /// Create a new delivery order repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get an order by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<delivery_order::Model> {
        DeliveryOrder::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Order {id} not found")))
    }

    /// All orders, most recent first.
    pub async fn list(&self) -> AppResult<Vec<delivery_order::Model>> {
        DeliveryOrder::find()
            .order_by_desc(delivery_order::Column::OrderTime)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an order.
    pub async fn update(
        &self,
        model: delivery_order::ActiveModel,
    ) -> AppResult<delivery_order::Model> {
        model.update(self.db.as_ref()).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => AppError::NotFound("Order not found".to_string()),
            e => AppError::Database(e.to_string()),
        })
    }
}
