//! Conference listing and key-field catalogs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use papercompass_common::{auth::AuthContext, errors::Result};
use papercompass_search::catalog::{Categories, KeyFields};

#[derive(Debug, Default, Deserialize)]
pub struct YearQuery {
    pub year: Option<String>,
}

#[derive(Serialize)]
pub struct ConferenceList {
    pub conferences: Vec<String>,
}

#[derive(Serialize)]
pub struct KeyFieldsResponse {
    pub conference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    pub key_fields: KeyFields,
}

#[derive(Serialize)]
pub struct CategoriesResponse {
    pub conference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    pub categories: Categories,
}

#[derive(Serialize)]
pub struct YearsResponse {
    pub conference: String,
    pub years: Vec<String>,
}

pub async fn list_conferences(State(state): State<AppState>, _auth: AuthContext) -> Result<Json<ConferenceList>> {
    Ok(Json(ConferenceList {
        conferences: state.engine.conferences().await?,
    }))
}

/// Distinct values of each key field, optionally for one year
pub async fn key_fields(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(conference): Path<String>,
    Query(query): Query<YearQuery>,
) -> Result<Json<KeyFieldsResponse>> {
    let key_fields = state.engine.catalogs().key_fields(&conference, query.year.as_deref()).await?;

    Ok(Json(KeyFieldsResponse {
        conference,
        year: query.year,
        key_fields,
    }))
}

pub async fn categories(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(conference): Path<String>,
    Query(query): Query<YearQuery>,
) -> Result<Json<CategoriesResponse>> {
    let categories = state.engine.catalogs().categories(&conference, query.year.as_deref()).await?;

    Ok(Json(CategoriesResponse {
        conference,
        year: query.year,
        categories,
    }))
}

pub async fn years(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(conference): Path<String>,
) -> Result<Json<YearsResponse>> {
    let years = state.engine.catalogs().years(&conference).await?;
    Ok(Json(YearsResponse { conference, years }))
}
