// ==========================================
// 港口到港舱单系统 - 舱单导入器实现
// ==========================================
// 职责: 整合导入流程，从上传字节到数据库
// 流程: 读取 → 标准化 → 校验 → 组装 → 文件留存 → 落库
// ==========================================
// ManifestPipeline 为纯同步部分（无 IO 依赖，可直接单测）
// ManifestImporterImpl 负责配置读取、文件留存与持久化
// calamine 解析与 rusqlite 事务均为阻塞调用，放到 spawn_blocking 线程池执行
// ==========================================

use crate::config::IngestConfigReader;
use crate::domain::import::{ImportOutcome, ManifestUpload, RowPolicy, SheetKind, UploadedFile};
use crate::domain::manifest::VoyageHeader;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_normalizer::FieldNormalizer;
use crate::importer::file_parser::{missing_optional_columns, missing_required_columns, ExcelParser, ReadOptions};
use crate::importer::manifest_assembler::{AssembledManifest, ManifestAssembler};
use crate::importer::manifest_importer_trait::{ManifestImporter, SheetReader};
use crate::importer::record_validator::{RecordValidator, SheetOutcome};
use crate::importer::sheet_schema::SheetLayout;
use crate::repository::ManifestRepository;
use crate::storage::FileStore;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::task::JoinError;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 原始舱单文件的存储子目录
pub const MANIFEST_FILE_CATEGORY: &str = "manifests";

fn join_error(err: JoinError) -> ImportError {
    ImportError::InternalError(format!("任务执行失败: {}", err))
}

// ==========================================
// ManifestPipeline - 同步解析管道
// ==========================================
pub struct ManifestPipeline {
    reader: Box<dyn SheetReader>,
    normalizer: FieldNormalizer,
    validator: RecordValidator,
}

impl Default for ManifestPipeline {
    fn default() -> Self {
        Self::new(Box::new(ExcelParser))
    }
}

impl ManifestPipeline {
    pub fn new(reader: Box<dyn SheetReader>) -> Self {
        Self {
            reader,
            normalizer: FieldNormalizer,
            validator: RecordValidator,
        }
    }

    /// 读取并校验一张表
    ///
    /// # 返回
    /// - Ok(SheetOutcome): 接受记录 + 拒收 + 告警
    /// - Err: 文档结构错误（缺表 / 缺必需列 / 列配置不一致）
    pub fn process_sheet(&self, layout: &SheetLayout, bytes: &[u8]) -> ImportResult<SheetOutcome> {
        let options = ReadOptions::from(layout);
        let sheet = self.reader.read(bytes, &options)?;
        debug!(sheet = %layout.kind, rows = sheet.rows.len(), "表格读取完成");

        if layout.header_row.is_some() {
            let missing = missing_required_columns(layout, &sheet);
            if !missing.is_empty() {
                return Err(ImportError::MissingColumns {
                    sheet: layout.sheet_name.clone(),
                    columns: missing,
                });
            }
            let optional = missing_optional_columns(layout, &sheet);
            if !optional.is_empty() {
                warn!(sheet = %layout.kind, columns = ?optional, "可选列缺失，对应字段置空");
            }
        }

        Ok(self.validator.validate_sheet(layout, &sheet, &self.normalizer))
    }

    /// 运行完整管道（不含持久化）
    ///
    /// # 参数
    /// - header: 已校验的航次表头
    /// - passenger_file / crew_file: 原始字节（至少一个）
    /// - passenger_layout / crew_layout: 表格布局
    /// - policy: 行级策略
    /// - batch_id: 导入批次号
    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &self,
        header: VoyageHeader,
        passenger_file: Option<&[u8]>,
        crew_file: Option<&[u8]>,
        passenger_layout: &SheetLayout,
        crew_layout: &SheetLayout,
        policy: RowPolicy,
        batch_id: &str,
    ) -> ImportResult<AssembledManifest> {
        if passenger_file.is_none() && crew_file.is_none() {
            return Err(ImportError::NoDocuments);
        }

        let passengers = match passenger_file {
            Some(bytes) => self.process_sheet(passenger_layout, bytes)?,
            None => SheetOutcome::default(),
        };
        let crews = match crew_file {
            Some(bytes) => self.process_sheet(crew_layout, bytes)?,
            None => SheetOutcome::default(),
        };

        ManifestAssembler::new(policy).assemble(header, passengers, crews, batch_id)
    }
}

// ==========================================
// ManifestImporterImpl - 舱单导入器实现
// ==========================================
pub struct ManifestImporterImpl<R, C>
where
    R: ManifestRepository,
    C: IngestConfigReader,
{
    // 数据访问层
    manifest_repo: Arc<R>,

    // 配置读取器
    config: C,

    // 原始文件留存
    file_store: Arc<dyn FileStore>,

    pipeline: Arc<ManifestPipeline>,
}

impl<R, C> ManifestImporterImpl<R, C>
where
    R: ManifestRepository,
    C: IngestConfigReader,
{
    /// 创建新的导入器实例
    ///
    /// # 参数
    /// - manifest_repo: 舱单仓储
    /// - config: 导入配置读取器
    /// - file_store: 原始文件留存
    /// - pipeline: 解析管道
    pub fn new(manifest_repo: R, config: C, file_store: Arc<dyn FileStore>, pipeline: ManifestPipeline) -> Self {
        Self {
            manifest_repo: Arc::new(manifest_repo),
            config,
            file_store,
            pipeline: Arc::new(pipeline),
        }
    }

    /// 留存原始文件；失败只记录告警
    async fn retain(&self, file: Option<&UploadedFile>) -> Option<String> {
        let file = file?;
        match self
            .file_store
            .save(MANIFEST_FILE_CATEGORY, &file.file_name, &file.bytes)
            .await
        {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(file = %file.file_name, error = %e, "原始文件留存失败");
                None
            }
        }
    }
}

#[async_trait]
impl<R, C> ManifestImporter for ManifestImporterImpl<R, C>
where
    R: ManifestRepository + Send + Sync + 'static,
    C: IngestConfigReader + Send + Sync,
{
    #[instrument(skip(self, upload), fields(batch_id, ship = %upload.header.ship_name))]
    async fn import(&self, upload: ManifestUpload) -> ImportResult<ImportOutcome> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        info!(
            passenger_file = upload.passenger_file.as_ref().map(|f| f.file_name.as_str()),
            crew_file = upload.crew_file.as_ref().map(|f| f.file_name.as_str()),
            "开始导入舱单"
        );

        // === 步骤 1: 读取配置 ===
        let passenger_layout = self.config.get_sheet_layout(SheetKind::Passenger).await?;
        let crew_layout = self.config.get_sheet_layout(SheetKind::Crew).await?;
        let policy = self.config.get_row_policy().await?;
        debug!(?policy, "导入配置已加载");

        // === 步骤 2: 解析 / 校验 / 组装（阻塞线程）===
        let ManifestUpload {
            header,
            passenger_file,
            crew_file,
            uploaded_by,
        } = upload;
        let pipeline = Arc::clone(&self.pipeline);
        let run_batch_id = batch_id.clone();
        let (assembled, passenger_file, crew_file) = tokio::task::spawn_blocking(move || {
            let assembled = pipeline.run(
                header,
                passenger_file.as_ref().map(|f| f.bytes.as_slice()),
                crew_file.as_ref().map(|f| f.bytes.as_slice()),
                &passenger_layout,
                &crew_layout,
                policy,
                &run_batch_id,
            );
            (assembled, passenger_file, crew_file)
        })
        .await
        .map_err(join_error)?;
        let assembled = assembled.map_err(|e| {
            error!(error = %e, "舱单解析失败");
            e
        })?;

        // === 步骤 3: 原始文件留存 ===
        let AssembledManifest {
            mut manifest,
            mut report,
        } = assembled;
        manifest.passenger_file_url = self.retain(passenger_file.as_ref()).await;
        manifest.crew_file_url = self.retain(crew_file.as_ref()).await;
        manifest.uploaded_by = uploaded_by;

        // === 步骤 4: 落库（事务化，阻塞线程）===
        report.elapsed_ms = start_time.elapsed().as_millis() as u64;
        let repo = Arc::clone(&self.manifest_repo);
        let handle = Handle::current();
        let (saved, report) = tokio::task::spawn_blocking(move || {
            handle.block_on(async move {
                let manifest_id = repo.insert_manifest(manifest, &report).await?;
                let saved = repo.find_manifest(manifest_id).await?.ok_or_else(|| {
                    ImportError::InternalError(format!("舱单 {} 落库后读取失败", manifest_id))
                })?;
                Ok::<_, ImportError>((saved, report))
            })
        })
        .await
        .map_err(join_error)??;
        let manifest_id = saved.id;

        info!(
            manifest_id,
            passengers = report.passengers_accepted,
            crews = report.crew_accepted,
            rejected = report.rejected.len(),
            warnings = report.warnings.len(),
            elapsed_ms = report.elapsed_ms,
            "舱单导入完成"
        );

        Ok(ImportOutcome {
            manifest: saved,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::file_parser::{rows_from_range, SheetData};
    use calamine::{Data, Range};
    use chrono::NaiveDate;

    /// 以内存 Range 代替真实工作簿
    struct RangeReader {
        passenger: Range<Data>,
        crew: Range<Data>,
    }

    impl SheetReader for RangeReader {
        fn read(&self, _bytes: &[u8], options: &ReadOptions) -> ImportResult<SheetData> {
            let range = if options.sheet_name == "Form 22" {
                &self.crew
            } else {
                &self.passenger
            };
            rows_from_range(range, options)
        }
    }

    fn header() -> VoyageHeader {
        VoyageHeader {
            ship_name: "KM KELUD".to_string(),
            flag: Some("ID".to_string()),
            skipper_name: None,
            origin: "Batam".to_string(),
            destination: "Tanjung Priok".to_string(),
            arrival_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            departure_date: None,
        }
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    fn passenger_range() -> Range<Data> {
        let mut r = Range::new((0, 0), (3, 2));
        r.set_value((0, 0), s("HEADER NAME PASSENGER"));
        r.set_value((0, 1), s("PASSPORT NO."));
        r.set_value((0, 2), s("DATE OF BIRTH \n(DD/MM/YYYY)"));
        r.set_value((1, 0), s("ALICE"));
        r.set_value((1, 1), s("A1"));
        r.set_value((1, 2), s("24/07/2020"));
        r.set_value((2, 0), s("BOB"));
        r.set_value((3, 0), s("CAROL"));
        r.set_value((3, 1), Data::Float(445566.0));
        r.set_value((3, 2), Data::Float(44036.0));
        r
    }

    fn crew_range() -> Range<Data> {
        let mut r = Range::new((0, 0), (20, 7));
        r.set_value((17, 0), Data::Int(1));
        r.set_value((17, 1), s("JOHN"));
        r.set_value((17, 3), Data::Float(30000.0));
        r.set_value((17, 7), s("MASTER"));
        r.set_value((18, 0), Data::Int(2));
        r.set_value((18, 1), s("JANE"));
        r.set_value((20, 1), s("Signed by master"));
        r
    }

    fn pipeline() -> ManifestPipeline {
        ManifestPipeline::new(Box::new(RangeReader {
            passenger: passenger_range(),
            crew: crew_range(),
        }))
    }

    #[test]
    fn test_pipeline_partial_admission() {
        let assembled = pipeline()
            .run(
                header(),
                Some(b"pax"),
                Some(b"crew"),
                &SheetLayout::default_passenger(),
                &SheetLayout::default_crew(),
                RowPolicy::Partial,
                "batch-t",
            )
            .unwrap();

        let pax = &assembled.manifest.passengers;
        assert_eq!(pax.len(), 2);
        assert_eq!(pax[0].name, "ALICE");
        assert_eq!(pax[1].passport_no, "445566");
        // 文本日期与序列号日期一致
        assert_eq!(pax[0].dob, pax[1].dob);
        assert_eq!(pax[0].dob, NaiveDate::from_ymd_opt(2020, 7, 24));

        assert_eq!(assembled.report.rejected.len(), 1);
        assert_eq!(assembled.report.rejected[0].row_index, 3);
        assert_eq!(assembled.report.rejected[0].missing_fields, vec!["passport_no".to_string()]);

        let crews = &assembled.manifest.crews;
        assert_eq!(crews.len(), 2);
        assert_eq!(crews[0].rank.as_deref(), Some("MASTER"));
        assert_eq!(assembled.report.crew_rows_total, 2);
    }

    #[test]
    fn test_pipeline_atomic_rejects_upload() {
        let err = pipeline()
            .run(
                header(),
                Some(b"pax"),
                None,
                &SheetLayout::default_passenger(),
                &SheetLayout::default_crew(),
                RowPolicy::Atomic,
                "batch-a",
            )
            .unwrap_err();
        assert!(matches!(err, ImportError::RowsRejected(ref rows) if rows.len() == 1));
    }

    #[test]
    fn test_pipeline_requires_a_document() {
        let err = pipeline()
            .run(
                header(),
                None,
                None,
                &SheetLayout::default_passenger(),
                &SheetLayout::default_crew(),
                RowPolicy::Partial,
                "batch-n",
            )
            .unwrap_err();
        assert!(matches!(err, ImportError::NoDocuments));
    }

    #[test]
    fn test_missing_required_column_is_format_error() {
        let mut r = Range::new((0, 0), (1, 0));
        r.set_value((0, 0), s("HEADER NAME PASSENGER"));
        r.set_value((1, 0), s("ALICE"));
        let pipeline = ManifestPipeline::new(Box::new(RangeReader {
            passenger: r,
            crew: crew_range(),
        }));

        let err = pipeline
            .process_sheet(&SheetLayout::default_passenger(), b"pax")
            .unwrap_err();
        assert!(err.is_format_error());
        assert!(matches!(err, ImportError::MissingColumns { ref columns, .. } if columns == &vec!["PASSPORT NO.".to_string()]));
    }

    #[tokio::test]
    async fn test_blocking_task_panic_maps_to_internal_error() {
        let err = tokio::task::spawn_blocking(|| -> ImportResult<()> { panic!("reader crashed") })
            .await
            .map_err(join_error)
            .unwrap_err();
        assert!(matches!(err, ImportError::InternalError(ref msg) if msg.contains("任务执行失败")));
        assert!(!err.is_format_error());
    }
}
