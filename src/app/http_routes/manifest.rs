use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::app::http_routes::common::PageQuery;
use crate::app::http_routes::extract::CurrentUser;
use crate::app::state::AppState;
use crate::domain::import::{ImportOutcome, ImportReport, UploadedFile};
use crate::domain::manifest::{Crew, CrewUpdate, Manifest};
use crate::domain::types::Role;
use crate::importer::manifest_assembler::VoyageHeaderForm;

// ==========================================
// 舱单相关路由
// ==========================================

/// multipart 中的文件字段
pub(super) async fn read_file_field(field: axum::extract::multipart::Field<'_>) -> ApiResult<Option<UploadedFile>> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("读取上传文件失败: {}", e)))?;

    // 浏览器对未选择的文件字段会提交空文件
    if bytes.is_empty() && file_name.is_empty() {
        return Ok(None);
    }
    Ok(Some(UploadedFile {
        file_name,
        bytes: bytes.to_vec(),
    }))
}

/// multipart 中的文本字段（空白视为未填）
pub(super) async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> ApiResult<Option<String>> {
    let text = field
        .text()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("读取表单字段失败: {}", e)))?;
    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}

/// 上传舱单（agen）
///
/// multipart 字段: passenger_file, crew_file, ship_name, flag, skipper_name,
/// arrival_date, departure_date, origin, destination
pub async fn upload_manifest(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<Json<ImportOutcome>> {
    user.require(Role::Agen)?;

    let mut form = VoyageHeaderForm::default();
    let mut passenger_file = None;
    let mut crew_file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("multipart 解析失败: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "passenger_file" => passenger_file = read_file_field(field).await?,
            "crew_file" => crew_file = read_file_field(field).await?,
            "ship_name" => form.ship_name = read_text_field(field).await?,
            "flag" => form.flag = read_text_field(field).await?,
            "skipper_name" => form.skipper_name = read_text_field(field).await?,
            "arrival_date" => form.arrival_date = read_text_field(field).await?,
            "departure_date" => form.departure_date = read_text_field(field).await?,
            "origin" => form.origin = read_text_field(field).await?,
            "destination" => form.destination = read_text_field(field).await?,
            other => debug!(field = %other, "忽略未知表单字段"),
        }
    }

    let outcome = state
        .manifest_api
        .upload_manifest(form, passenger_file, crew_file, Some(user.id()))
        .await?;
    Ok(Json(outcome))
}

pub async fn list_manifests(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<Vec<Manifest>>> {
    let manifests = state.manifest_api.list_manifests(page.skip, page.limit).await?;
    Ok(Json(manifests))
}

pub async fn get_manifest(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(manifest_id): Path<i64>,
) -> ApiResult<Json<Manifest>> {
    Ok(Json(state.manifest_api.get_manifest(manifest_id).await?))
}

pub async fn get_import_report(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(manifest_id): Path<i64>,
) -> ApiResult<Json<ImportReport>> {
    Ok(Json(state.manifest_api.get_import_report(manifest_id).await?))
}

/// 补录船员证件（agen）
pub async fn update_crew(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(crew_id): Path<i64>,
    Json(update): Json<CrewUpdate>,
) -> ApiResult<Json<Crew>> {
    user.require(Role::Agen)?;
    Ok(Json(state.manifest_api.update_crew(crew_id, update).await?))
}
