// ==========================================
// 港口到港舱单系统 - 舱单 API
// ==========================================
// 职责: 舱单上传、查询、导入报告与船员证件补录
// ==========================================

use std::sync::Arc;

use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::import::{ImportOutcome, ImportReport, ManifestUpload, UploadedFile};
use crate::domain::manifest::{Crew, CrewUpdate, Manifest};
use crate::importer::manifest_assembler::VoyageHeaderForm;
use crate::importer::ManifestImporter;
use crate::repository::ManifestRepository;

/// 分页默认值
pub const DEFAULT_PAGE_LIMIT: i64 = 100;
/// 分页上限
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// 分页参数校验
pub(crate) fn validate_page(skip: Option<i64>, limit: Option<i64>) -> ApiResult<(i64, i64)> {
    let skip = skip.unwrap_or(0);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if skip < 0 {
        return Err(ApiError::InvalidInput(format!("skip 不能为负数: {}", skip)));
    }
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(ApiError::InvalidInput(format!(
            "limit 必须在 1..={} 之间: {}",
            MAX_PAGE_LIMIT, limit
        )));
    }
    Ok((skip, limit))
}

/// 舱单API
pub struct ManifestApi {
    importer: Arc<dyn ManifestImporter>,
    manifest_repo: Arc<dyn ManifestRepository>,
}

impl ManifestApi {
    /// 创建新的ManifestApi实例
    ///
    /// # 参数
    /// - importer: 舱单导入器
    /// - manifest_repo: 舱单仓储（查询与补录）
    pub fn new(importer: Arc<dyn ManifestImporter>, manifest_repo: Arc<dyn ManifestRepository>) -> Self {
        Self {
            importer,
            manifest_repo,
        }
    }

    /// 上传舱单
    ///
    /// # 参数
    /// - form: 航次表头表单字段
    /// - passenger_file / crew_file: 旅客表与船员表（至少一个）
    /// - uploaded_by: 上传人 id
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 已落库舱单 + 导入报告
    /// - Err(ApiError): 表头校验失败(422) / 文件格式错误(422) / 整单拒收(422)
    pub async fn upload_manifest(
        &self,
        form: VoyageHeaderForm,
        passenger_file: Option<UploadedFile>,
        crew_file: Option<UploadedFile>,
        uploaded_by: Option<i64>,
    ) -> ApiResult<ImportOutcome> {
        // 表头先于任何解析校验
        let header = form.into_header()?;

        if passenger_file.is_none() && crew_file.is_none() {
            return Err(ApiError::InvalidInput(
                "至少需要上传旅客表或船员表".to_string(),
            ));
        }

        let outcome = self
            .importer
            .import(ManifestUpload {
                header,
                passenger_file,
                crew_file,
                uploaded_by,
            })
            .await?;

        info!(
            manifest_id = outcome.manifest.id,
            has_issues = outcome.report.has_issues(),
            "舱单上传完成"
        );
        Ok(outcome)
    }

    /// 分页查询舱单
    pub async fn list_manifests(&self, skip: Option<i64>, limit: Option<i64>) -> ApiResult<Vec<Manifest>> {
        let (skip, limit) = validate_page(skip, limit)?;
        Ok(self.manifest_repo.list_manifests(skip, limit).await?)
    }

    /// 查询单个舱单
    pub async fn get_manifest(&self, manifest_id: i64) -> ApiResult<Manifest> {
        self.manifest_repo
            .find_manifest(manifest_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("舱单(id={})不存在", manifest_id)))
    }

    /// 查询舱单的导入报告
    pub async fn get_import_report(&self, manifest_id: i64) -> ApiResult<ImportReport> {
        self.manifest_repo
            .find_import_report(manifest_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("舱单(id={})的导入报告不存在", manifest_id)))
    }

    /// 补录船员护照信息
    pub async fn update_crew(&self, crew_id: i64, update: CrewUpdate) -> ApiResult<Crew> {
        if update.passport_no.is_none() && update.passport_expiry.is_none() {
            return Err(ApiError::InvalidInput(
                "passport_no 与 passport_expiry 至少提供一个".to_string(),
            ));
        }
        let update = CrewUpdate {
            passport_no: update
                .passport_no
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            ..update
        };

        self.manifest_repo
            .update_crew(crew_id, update)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("船员(id={})不存在", crew_id)))
    }
}
