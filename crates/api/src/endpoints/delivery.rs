//! Delivery endpoints: order list, rider assignment and ETA estimates.

use axum::{Json, Router, extract::State, routing::post};
use chrono::{DateTime, FixedOffset, Utc};
use forkd_common::AppResult;
use forkd_core::{AssignRiderInput, GeoPoint, estimate_eta};
use forkd_db::entities::{
    delivery_order::{self, DeliveryNote, DeliveryStatus},
    subject,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{extractors::AdminAuth, middleware::AppState, response::ApiResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", post(orders))
        .route("/riders", post(riders))
        .route("/assign", post(assign))
        .route("/estimate", post(estimate))
}

/// Delivery order response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub rider_id: Option<String>,
    pub status: DeliveryStatus,
    pub delivery_note: DeliveryNote,
    pub items: serde_json::Value,
    pub delivery_address: Option<String>,
    pub destination: Option<GeoPoint>,
    pub order_time: DateTime<FixedOffset>,
    pub expected_delivery_at: Option<DateTime<FixedOffset>>,
}

impl From<delivery_order::Model> for OrderResponse {
    fn from(order: delivery_order::Model) -> Self {
        let destination = order.destination().map(GeoPoint::from);
        Self {
            id: order.id,
            user_id: order.user_id,
            rider_id: order.rider_id,
            status: order.status,
            delivery_note: order.delivery_note,
            items: order.items,
            delivery_address: order.delivery_address,
            destination,
            order_time: order.order_time,
            expected_delivery_at: order.expected_delivery_at,
        }
    }
}

/// Assignable rider.
#[derive(Debug, Serialize)]
pub struct RiderResponse {
    pub id: String,
    pub name: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl From<subject::Model> for RiderResponse {
    fn from(rider: subject::Model) -> Self {
        let location = rider.location();
        Self {
            id: rider.id,
            name: rider.name,
            lat: location.map(|(lat, _)| lat),
            lng: location.map(|(_, lng)| lng),
        }
    }
}

/// Assign request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub order_id: String,
    /// Omit or send null to unassign.
    pub rider_id: Option<String>,
    pub status: DeliveryStatus,
    pub delivery_note: DeliveryNote,
}

/// Coordinates in degrees.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct PointRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}

impl From<PointRequest> for GeoPoint {
    fn from(point: PointRequest) -> Self {
        Self::new(point.lat, point.lng)
    }
}

/// Estimate request.
#[derive(Debug, Deserialize, Validate)]
pub struct EstimateRequest {
    #[validate(nested)]
    pub from: PointRequest,
    #[validate(nested)]
    pub to: PointRequest,
}

/// Estimate response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    pub distance_km: f64,
    pub minutes: f64,
    pub expected_at: DateTime<Utc>,
}

/// List orders, most recent first.
async fn orders(
    AdminAuth(_session): AdminAuth,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<OrderResponse>>> {
    let orders = state.assignment_service.list_orders().await?;
    Ok(ApiResponse::ok(
        orders.into_iter().map(OrderResponse::from).collect(),
    ))
}

/// List riders that can take orders.
async fn riders(
    AdminAuth(_session): AdminAuth,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<RiderResponse>>> {
    let riders = state.assignment_service.fetch_active_riders().await?;
    Ok(ApiResponse::ok(
        riders.into_iter().map(RiderResponse::from).collect(),
    ))
}

/// Assign or unassign a rider.
async fn assign(
    AdminAuth(session): AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<AssignRequest>,
) -> AppResult<ApiResponse<OrderResponse>> {
    let input = AssignRiderInput {
        order_id: req.order_id,
        rider_id: req.rider_id,
        status: req.status,
        note: req.delivery_note,
    };

    let order = state
        .assignment_service
        .assign_rider(&session, input)
        .await?;
    Ok(ApiResponse::ok(order.into()))
}

/// Estimate distance and arrival between two points.
async fn estimate(
    AdminAuth(_session): AdminAuth,
    Json(req): Json<EstimateRequest>,
) -> AppResult<ApiResponse<EstimateResponse>> {
    req.validate()?;
    let eta = estimate_eta(req.from.into(), req.to.into(), Utc::now());
    Ok(ApiResponse::ok(EstimateResponse {
        distance_km: eta.distance_km,
        minutes: eta.minutes,
        expected_at: eta.expected_at,
    }))
}
