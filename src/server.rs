use crate::cluster::build_cluster_map;
use crate::config::ServiceConfig;
use crate::data::{AssignmentResult, ClusterReport, Participant, SlotKey};
use crate::error::ServiceError;
use crate::formula::parse_region_config;
use crate::hierarchy::Hierarchy;
use crate::solver;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::post};
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRequest {
    /// Region configuration text.
    pub config: String,
    pub hierarchy: Hierarchy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRequest {
    pub slots: Vec<SlotKey>,
    pub participants: Vec<Participant>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::Parse(_) | ServiceError::Hierarchy(_) | ServiceError::Assignment(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!("Request failed: {}", self);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn cluster_handler(
    Json(request): Json<ClusterRequest>,
) -> Result<Json<ClusterReport>, ServiceError> {
    let config = parse_region_config(&request.config)?;
    let report = build_cluster_map(&config, &request.hierarchy)?;
    Ok(Json(report))
}

async fn assignment_handler(
    Json(request): Json<AssignmentRequest>,
) -> Result<Json<AssignmentResult>, ServiceError> {
    let result = solver::compute_assignment(&request.slots, &request.participants)?;
    Ok(Json(result))
}

pub fn router() -> Router {
    Router::new()
        .route("/v1/regions/cluster", post(cluster_handler))
        .route("/v1/assignment/solve", post(assignment_handler))
}

pub async fn run_server(config: &ServiceConfig) -> Result<(), ServiceError> {
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);
    axum::serve(listener, router()).await?;
    Ok(())
}
