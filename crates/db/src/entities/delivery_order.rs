//! Delivery order entity (order to rider assignment).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Delivery progress of an order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    #[sea_orm(string_value = "open")]
    #[default]
    Open,
    #[sea_orm(string_value = "ongoing")]
    Ongoing,
    #[sea_orm(string_value = "delivered")]
    Delivered,
}

/// Progress note shown to the customer, from a fixed sequence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(64))")]
pub enum DeliveryNote {
    #[sea_orm(string_value = "Looking for a delivery partner")]
    #[serde(rename = "Looking for a delivery partner")]
    #[default]
    LookingForPartner,
    #[sea_orm(string_value = "Rider on their way to pick up order")]
    #[serde(rename = "Rider on their way to pick up order")]
    HeadingToPickup,
    #[sea_orm(string_value = "Rider has reached pickup location")]
    #[serde(rename = "Rider has reached pickup location")]
    AtPickup,
    #[sea_orm(string_value = "Rider has picked up your order")]
    #[serde(rename = "Rider has picked up your order")]
    PickedUp,
    #[sea_orm(string_value = "Rider is on the way to deliver your order")]
    #[serde(rename = "Rider is on the way to deliver your order")]
    OutForDelivery,
    #[sea_orm(string_value = "Rider has successfully delivered your order")]
    #[serde(rename = "Rider has successfully delivered your order")]
    Delivered,
}

/// Delivery order model.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "delivery_order")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    #[sea_orm(nullable)]
    pub rider_id: Option<String>,
    pub status: DeliveryStatus,
    pub delivery_note: DeliveryNote,
    #[sea_orm(column_type = "JsonBinary")]
    pub items: Json,
    #[sea_orm(column_type = "Text", nullable)]
    pub delivery_address: Option<String>,
    #[sea_orm(nullable)]
    pub delivery_lat: Option<f64>,
    #[sea_orm(nullable)]
    pub delivery_lng: Option<f64>,
    pub order_time: DateTimeWithTimeZone,
    /// Computed from rider distance, never entered by hand.
    #[sea_orm(nullable)]
    pub expected_delivery_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Delivery coordinates, when both are known.
    #[must_use]
    pub fn destination(&self) -> Option<(f64, f64)> {
        self.delivery_lat.zip(self.delivery_lng)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subject::Entity",
        from = "Column::RiderId",
        to = "super::subject::Column::Id"
    )]
    Rider,
}

impl Related<super::subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rider.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
