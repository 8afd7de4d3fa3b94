//! JSON API handlers for the admin console.
//!
//! # Responsibility
//! - Translate HTTP requests into `listdist_core` service calls.
//! - Wrap results in the `{success, ...}` envelopes the console expects.
//!
//! # Invariants
//! - Handlers never touch SQLite on the async runtime; every service call
//!   runs through [`AppState::with_conn`].
//! - Core services own all validation; handlers only parse transport input.

use crate::error::ApiError;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use listdist_core::{
    Agent, AgentId, AgentService, AssignedList, ContactRecord, DistributionOutcome,
    DistributionService, DistributionServiceError, ListDraft, NewAgent, SqliteAgentRepository,
    SqliteListRepository,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct IdRequest {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct DistributionRequest {
    pub distribution: Vec<ListDraft>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecipientsResponse {
    pub success: bool,
    pub recipients: Vec<Agent>,
}

#[derive(Debug, Serialize)]
pub struct RecipientResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub recipient: Agent,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionResponse {
    pub success: bool,
    pub message: String,
    pub lists: Vec<AssignedList>,
    pub total_items: usize,
    pub recipient_count: usize,
}

impl DistributionResponse {
    fn from_outcome(message: impl Into<String>, outcome: DistributionOutcome) -> Self {
        Self {
            success: true,
            message: message.into(),
            lists: outcome.lists,
            total_items: outcome.total_items,
            recipient_count: outcome.agent_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub success: bool,
    pub records: Vec<ContactRecord>,
    pub total_items: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListsResponse {
    pub success: bool,
    pub lists: Vec<AssignedList>,
    pub total_items: u64,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub list: AssignedList,
}

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

/// GET /api/recipients
pub async fn list_recipients(State(state): State<AppState>) -> ApiResult<RecipientsResponse> {
    let recipients = state
        .with_conn(|conn| with_agent_service(conn, |service| service.list_agents()))
        .await?;
    Ok(Json(RecipientsResponse {
        success: true,
        recipients,
    }))
}

/// POST /api/recipients
pub async fn create_recipient(
    State(state): State<AppState>,
    payload: Result<Json<NewAgent>, JsonRejection>,
) -> ApiResult<RecipientResponse> {
    let Json(agent) = payload?;
    let recipient = state
        .with_conn(move |conn| with_agent_service(conn, |service| service.register_agent(&agent)))
        .await?;
    Ok(Json(RecipientResponse {
        success: true,
        message: Some("Recipient created successfully".to_string()),
        recipient,
    }))
}

/// POST /api/recipients/single
pub async fn get_recipient(
    State(state): State<AppState>,
    payload: Result<Json<IdRequest>, JsonRejection>,
) -> ApiResult<RecipientResponse> {
    let Json(request) = payload?;
    let id = parse_agent_id(&request.id)?;
    let recipient = state
        .with_conn(move |conn| with_agent_service(conn, |service| service.get_agent(id)))
        .await?;
    Ok(Json(RecipientResponse {
        success: true,
        message: None,
        recipient,
    }))
}

/// POST /api/recipients/remove
pub async fn remove_recipient(
    State(state): State<AppState>,
    payload: Result<Json<IdRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(request) = payload?;
    let id = parse_agent_id(&request.id)?;
    state
        .with_conn(move |conn| with_agent_service(conn, |service| service.remove_agent(id)))
        .await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Recipient removed successfully".to_string(),
    }))
}

/// POST /api/distribution
pub async fn save_distribution(
    State(state): State<AppState>,
    payload: Result<Json<DistributionRequest>, JsonRejection>,
) -> ApiResult<DistributionResponse> {
    let Json(request) = payload?;
    let outcome = state
        .with_conn(move |conn| {
            with_distribution_service(conn, |service| {
                service.distribute_payload(&request.distribution)
            })
        })
        .await?;
    Ok(Json(DistributionResponse::from_outcome(
        "Distribution saved successfully",
        outcome,
    )))
}

/// POST /api/distribution/upload?fileName=...
pub async fn upload_distribution(
    State(state): State<AppState>,
    query: Result<Query<UploadQuery>, QueryRejection>,
    body: Bytes,
) -> ApiResult<DistributionResponse> {
    let file_name = required_file_name(query?.0)?;
    let outcome = state
        .with_conn(move |conn| {
            with_distribution_service(conn, |service| service.distribute_upload(&file_name, &body))
        })
        .await?;
    let message = format!(
        "Distributed {} items across {} recipients",
        outcome.total_items, outcome.agent_count
    );
    Ok(Json(DistributionResponse::from_outcome(message, outcome)))
}

/// POST /api/distribution/preview?fileName=...
pub async fn preview_distribution(
    State(state): State<AppState>,
    query: Result<Query<UploadQuery>, QueryRejection>,
    body: Bytes,
) -> ApiResult<PreviewResponse> {
    let file_name = required_file_name(query?.0)?;
    let records = state
        .with_conn(move |conn| {
            with_distribution_service(conn, |service| service.preview(&file_name, &body))
        })
        .await?;
    Ok(Json(PreviewResponse {
        success: true,
        total_items: records.len(),
        records,
    }))
}

/// GET /api/distribution
pub async fn list_distribution(State(state): State<AppState>) -> ApiResult<ListsResponse> {
    let (lists, total_items) = state
        .with_conn(|conn| {
            with_distribution_service(conn, |service| {
                Ok::<_, DistributionServiceError>((service.list_all()?, service.total_items()?))
            })
        })
        .await?;
    Ok(Json(ListsResponse {
        success: true,
        lists,
        total_items,
    }))
}

/// GET /api/distribution/recipient/:id
pub async fn recipient_distribution(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ListResponse> {
    let id = parse_agent_id(&id)?;
    let list = state
        .with_conn(move |conn| with_distribution_service(conn, |service| service.get_by_agent(id)))
        .await?;
    Ok(Json(ListResponse {
        success: true,
        list,
    }))
}

fn with_agent_service<T, E>(
    conn: &Connection,
    f: impl FnOnce(&AgentService<SqliteAgentRepository<'_>>) -> Result<T, E>,
) -> Result<T, ApiError>
where
    ApiError: From<E>,
{
    let service = AgentService::new(SqliteAgentRepository::try_new(conn)?);
    Ok(f(&service)?)
}

fn with_distribution_service<T, E>(
    conn: &Connection,
    f: impl FnOnce(
        &DistributionService<SqliteAgentRepository<'_>, SqliteListRepository<'_>>,
    ) -> Result<T, E>,
) -> Result<T, ApiError>
where
    ApiError: From<E>,
{
    let service = DistributionService::new(
        SqliteAgentRepository::try_new(conn)?,
        SqliteListRepository::try_new(conn)?,
    );
    Ok(f(&service)?)
}

fn parse_agent_id(raw: &str) -> Result<AgentId, ApiError> {
    AgentId::parse_str(raw.trim())
        .map_err(|_| ApiError::bad_request("invalid_id", "recipient id must be a UUID"))
}

fn required_file_name(query: UploadQuery) -> Result<String, ApiError> {
    match query.file_name {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => Err(ApiError::bad_request(
            "missing_file_name",
            "fileName query parameter is required",
        )),
    }
}
