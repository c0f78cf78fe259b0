//! Liveness plus admission gauges
//!
//! `GET /health` answers without taking a slot, so it stays responsive
//! while every class is saturated.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::admission::{AdmissionController, OperationClass};
use crate::http::server::AppState;

/// Free and held slots of one operation class.
#[derive(Debug, Serialize)]
pub struct SlotUsage {
    pub available: usize,
    pub in_flight: usize,
}

impl SlotUsage {
    fn of(admission: &AdmissionController, class: OperationClass) -> Self {
        Self {
            available: admission.available(class),
            in_flight: admission.in_flight(class),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdmissionUsage {
    pub create: SlotUsage,
    pub read: SlotUsage,
    pub list: SlotUsage,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub admission: AdmissionUsage,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let admission = state.service.admission();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        admission: AdmissionUsage {
            create: SlotUsage::of(admission, OperationClass::Create),
            read: SlotUsage::of(admission, OperationClass::Read),
            list: SlotUsage::of(admission, OperationClass::List),
        },
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}
