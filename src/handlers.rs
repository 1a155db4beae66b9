//! The four collection operations, written once and instantiated per record kind.
use crate::app::AppState;
use crate::error::ApiError;
use crate::models::{Catalog, MediaRecord, Selector};
use crate::store::next_id;
use axum::{http::StatusCode, Json};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

pub async fn list<R: MediaRecord>(state: &AppState) -> Result<Json<Vec<R>>, ApiError> {
    let mut catalog = load(state).await?;
    Ok(Json(std::mem::take(R::collection_mut(&mut catalog))))
}

pub async fn create<R: MediaRecord>(
    state: &AppState,
    body: &[u8],
) -> Result<(StatusCode, Json<R>), ApiError> {
    let draft: R::Draft = parse_body(body)?;
    let mut record = R::from_draft(draft).ok_or_else(|| {
        warn!("Rejecting {} create: missing required fields", R::KIND);
        ApiError::Validation
    })?;

    let _write = state.write_lock.lock().await;
    let mut catalog = load(state).await?;
    let records = R::collection_mut(&mut catalog);
    let id = next_id(records).ok_or_else(|| {
        error!("No id left for a new {}", R::KIND);
        ApiError::IdsExhausted
    })?;
    record.set_id(id);
    records.push(record.clone());
    save(state, &catalog).await?;

    info!("Created {} {}", R::KIND, id);
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update<R: MediaRecord>(state: &AppState, body: &[u8]) -> Result<Json<R>, ApiError> {
    let patch: R::Patch = parse_body(body)?;
    let id = R::target(&patch).ok_or_else(|| missing_id::<R>("update"))?;

    let _write = state.write_lock.lock().await;
    let mut catalog = load(state).await?;
    let record = R::collection_mut(&mut catalog)
        .iter_mut()
        .find(|r| r.id() == id)
        .ok_or_else(|| not_found::<R>(id))?;
    record.apply(patch);
    let updated = record.clone();
    save(state, &catalog).await?;

    info!("Updated {} {}", R::KIND, id);
    Ok(Json(updated))
}

pub async fn delete<R: MediaRecord>(state: &AppState, body: &[u8]) -> Result<Json<R>, ApiError> {
    let selector: Selector = parse_body(body)?;
    let id = selector.id().ok_or_else(|| missing_id::<R>("delete"))?;

    let _write = state.write_lock.lock().await;
    let mut catalog = load(state).await?;
    let records = R::collection_mut(&mut catalog);
    let index = records
        .iter()
        .position(|r| r.id() == id)
        .ok_or_else(|| not_found::<R>(id))?;
    let removed = records.remove(index);
    save(state, &catalog).await?;

    info!("Deleted {} {}", R::KIND, id);
    Ok(Json(removed))
}

/// Parse failures and wrongly typed fields are reported as missing fields.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!("Unusable request body: {}", e);
        ApiError::Validation
    })
}

fn missing_id<R: MediaRecord>(op: &str) -> ApiError {
    warn!("Rejecting {} {}: missing id", R::KIND, op);
    ApiError::Validation
}

fn not_found<R: MediaRecord>(id: u64) -> ApiError {
    warn!("{} {} not found", R::KIND, id);
    ApiError::NotFound(R::KIND)
}

async fn load(state: &AppState) -> Result<Catalog, ApiError> {
    state.store.load().await.map_err(|e| {
        error!("Failed to load catalog: {}", e);
        ApiError::Load(e)
    })
}

async fn save(state: &AppState, catalog: &Catalog) -> Result<(), ApiError> {
    state.store.save(catalog).await.map_err(|e| {
        error!("Failed to save catalog: {}", e);
        ApiError::Save(e)
    })
}
