use axum::extract::{Json, State};
use serde::Serialize;

use crate::dashboard::{response_type_shares, DashboardStats, ResponseTypeShare};
use crate::models::DocumentStatus;
use crate::state::AppState;

#[derive(Serialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub response_type_shares: Vec<ResponseTypeShare>,
    pub pending_suggestions: usize,
    pub pending_documents: usize,
}

pub async fn overview(State(state): State<AppState>) -> Json<DashboardResponse> {
    let catalog = state.catalog.read().await;
    let stats = catalog.stats.clone();
    let response_type_shares = response_type_shares(&stats.response_types);
    let pending_documents = catalog
        .documents
        .iter()
        .filter(|document| document.status == DocumentStatus::Pending)
        .count();

    Json(DashboardResponse {
        response_type_shares,
        pending_suggestions: catalog.pending_suggestions().len(),
        pending_documents,
        stats,
    })
}
