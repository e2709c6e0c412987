//! Rider assignment and delivery ETA estimation.

use chrono::{DateTime, Duration, Utc};
use forkd_common::{AppError, AppResult};
use forkd_db::{
    entities::{
        admin_session,
        delivery_order::{self, DeliveryNote, DeliveryStatus},
        subject::{self, LifecycleState, SubjectRole},
    },
    repositories::{DeliveryOrderRepository, SubjectRepository},
};
use sea_orm::{Set, prelude::DateTimeWithTimeZone};
use serde::{Deserialize, Serialize};

/// Mean earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Travel time budget per kilometre.
pub const MINUTES_PER_KM: f64 = 5.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

/// Great-circle distance in kilometres (Haversine).
#[must_use]
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance and expected arrival for one rider/destination pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EtaEstimate {
    pub distance_km: f64,
    pub minutes: f64,
    pub expected_at: DateTime<Utc>,
}

/// Estimate delivery time from the rider's position to the destination.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn estimate_eta(rider: GeoPoint, destination: GeoPoint, now: DateTime<Utc>) -> EtaEstimate {
    let distance_km = haversine_km(rider, destination);
    let minutes = distance_km * MINUTES_PER_KM;
    let millis = (minutes * 60_000.0).round() as i64;

    EtaEstimate {
        distance_km,
        minutes,
        expected_at: now + Duration::milliseconds(millis),
    }
}

/// Input for [`AssignmentService::assign_rider`].
#[derive(Debug, Clone)]
pub struct AssignRiderInput {
    pub order_id: String,
    /// `None` unassigns the current rider.
    pub rider_id: Option<String>,
    pub status: DeliveryStatus,
    pub note: DeliveryNote,
}

/// Rider assignment service.
#[derive(Clone)]
pub struct AssignmentService {
    order_repo: DeliveryOrderRepository,
    subject_repo: SubjectRepository,
}

impl AssignmentService {
    /// Create a new assignment service.
    #[must_use]
    pub const fn new(order_repo: DeliveryOrderRepository, subject_repo: SubjectRepository) -> Self {
        Self {
            order_repo,
            subject_repo,
        }
    }

    /// All orders, most recent first.
    pub async fn list_orders(&self) -> AppResult<Vec<delivery_order::Model>> {
        self.order_repo.list().await
    }

    /// Approved riders that can take orders.
    pub async fn fetch_active_riders(&self) -> AppResult<Vec<subject::Model>> {
        let riders = self.subject_repo.list_active_riders().await?;
        Ok(riders.into_iter().filter(is_assignable).collect())
    }

    /// Assign, reassign or unassign a rider and update delivery progress.
    ///
    /// The ETA is recomputed when the order ends up `ongoing` with a rider and
    /// either the status just became `ongoing` or the rider changed. A rider
    /// without coordinates leaves it empty; clearing the rider clears it.
    pub async fn assign_rider(
        &self,
        session: &admin_session::Model,
        input: AssignRiderInput,
    ) -> AppResult<delivery_order::Model> {
        let order = self.order_repo.get_by_id(&input.order_id).await?;

        let rider = match input.rider_id.as_deref() {
            Some(rider_id) => Some(self.get_assignable_rider(rider_id).await?),
            None => None,
        };

        let now = Utc::now();
        let recompute = input.status == DeliveryStatus::Ongoing
            && rider.is_some()
            && (order.status != DeliveryStatus::Ongoing || order.rider_id != input.rider_id);

        let expected_delivery_at: Option<DateTimeWithTimeZone> = match &rider {
            None => None,
            Some(rider) if recompute => rider
                .location()
                .zip(order.destination())
                .map(|(from, to)| estimate_eta(from.into(), to.into(), now).expected_at.into()),
            Some(_) => order.expected_delivery_at,
        };

        let mut active: delivery_order::ActiveModel = order.into();
        active.rider_id = Set(input.rider_id.clone());
        active.status = Set(input.status);
        active.delivery_note = Set(input.note);
        active.expected_delivery_at = Set(expected_delivery_at);

        let order = self.order_repo.update(active).await?;

        tracing::info!(
            order_id = %order.id,
            rider_id = ?order.rider_id,
            status = ?order.status,
            eta_recomputed = recompute,
            actor = %session.username,
            "Order assignment updated"
        );
        Ok(order)
    }

    async fn get_assignable_rider(&self, id: &str) -> AppResult<subject::Model> {
        let rider = self.subject_repo.get_by_id(id).await?;
        if rider.role != SubjectRole::Rider {
            return Err(AppError::NotFound(format!("Rider {id} not found")));
        }
        if !is_assignable(&rider) {
            return Err(AppError::validation(format!(
                "Rider {id} is not active and cannot take orders"
            )));
        }
        Ok(rider)
    }
}

fn is_assignable(rider: &subject::Model) -> bool {
    rider.is_active && matches!(rider.state(), Ok(LifecycleState::Approved))
}
