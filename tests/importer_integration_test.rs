// ==========================================
// 导入层集成测试
// ==========================================
// 测试目标: 验证完整的 读取 → 标准化 → 校验 → 组装 → 留存 → 落库 流程
// ==========================================

mod test_helpers;

use port_manifest::config::ConfigManager;
use port_manifest::domain::import::{ManifestUpload, RowPolicy, SheetKind, UploadedFile};
use port_manifest::importer::field_normalizer::{REASON_BAD_DATE, REASON_BAD_SEX};
use port_manifest::importer::*;
use port_manifest::logging;
use port_manifest::repository::{ManifestRepository, ManifestRepositoryImpl};
use port_manifest::storage::{FileStore, LocalFileStore};
use std::sync::Arc;
use tempfile::TempDir;
use test_helpers::{date, voyage_header, InMemoryWorkbook};

/// 创建测试用的 ManifestImporter
fn create_test_importer(
    db_path: &str,
    upload_dir: &TempDir,
    workbook: InMemoryWorkbook,
) -> ManifestImporterImpl<ManifestRepositoryImpl, ConfigManager> {
    let repo = ManifestRepositoryImpl::new(db_path).expect("Failed to create manifest repo");
    let config = ConfigManager::new(db_path).expect("Failed to create config");
    let store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(
        upload_dir.path(),
        "http://localhost:8000/uploads",
    ));

    ManifestImporterImpl::new(repo, config, store, ManifestPipeline::new(Box::new(workbook)))
}

fn upload(with_passengers: bool, with_crew: bool) -> ManifestUpload {
    ManifestUpload {
        header: voyage_header("Batam", "Tanjung Pinang", date(2024, 5, 2)),
        passenger_file: with_passengers.then(|| UploadedFile {
            file_name: "passengers.xlsx".to_string(),
            bytes: b"passenger sheet".to_vec(),
        }),
        crew_file: with_crew.then(|| UploadedFile {
            file_name: "crew list.xls".to_string(),
            bytes: b"crew sheet".to_vec(),
        }),
        uploaded_by: None,
    }
}

// ==========================================
// 测试用例
// ==========================================

#[tokio::test]
async fn test_complete_import_flow() {
    logging::init_test();

    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let upload_dir = TempDir::new().unwrap();
    let importer = create_test_importer(&db_path, &upload_dir, InMemoryWorkbook::default());

    let outcome = importer.import(upload(true, true)).await.expect("import failed");

    // 旅客：3 行中 1 行缺护照号被拒收，其余按原顺序入库
    let manifest = &outcome.manifest;
    assert_eq!(manifest.ship_name, "KM SINABUNG");
    assert_eq!(manifest.passengers.len(), 2);
    assert_eq!(manifest.passengers[0].name, "ALICE");
    assert_eq!(manifest.passengers[0].seq_no, 1);
    assert_eq!(manifest.passengers[1].name, "CAROL");
    assert_eq!(manifest.passengers[1].seq_no, 2);

    // 文本日期与序列号日期一致
    assert_eq!(manifest.passengers[0].dob, Some(date(2020, 7, 24)));
    assert_eq!(manifest.passengers[1].dob, Some(date(2020, 7, 24)));

    // 无法识别的性别原样保留并告警
    assert_eq!(manifest.passengers[1].sex.as_deref(), Some("?"));

    // 船员：遇到序号为空的行即停止
    assert_eq!(manifest.crews.len(), 2);
    assert_eq!(manifest.crews[0].name, "HASAN");
    assert_eq!(manifest.crews[0].dob, Some(date(1975, 2, 1)));
    assert_eq!(manifest.crews[0].seaman_book_expiry, Some(date(2026, 12, 31)));
    assert_eq!(manifest.crews[1].rank.as_deref(), Some("COOK"));

    // 导入报告
    let report = &outcome.report;
    assert_eq!(report.passenger_rows_total, 3);
    assert_eq!(report.passengers_accepted, 2);
    assert_eq!(report.crew_rows_total, 2);
    assert_eq!(report.crew_accepted, 2);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].sheet, SheetKind::Passenger);
    assert_eq!(report.rejected[0].row_index, 3);
    assert_eq!(report.rejected[0].missing_fields, vec!["passport_no".to_string()]);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.reason == REASON_BAD_SEX && w.row_index == 4));

    // 原始文件已留存
    let passenger_url = manifest.passenger_file_url.as_deref().expect("passenger file url");
    assert!(passenger_url.starts_with("http://localhost:8000/uploads/manifests/"));
    assert!(manifest.crew_file_url.as_deref().unwrap().ends_with("_crew_list.xls"));

    // 报告随舱单持久化
    let repo = ManifestRepositoryImpl::new(&db_path).unwrap();
    let stored = repo.find_import_report(manifest.id).await.unwrap().expect("report stored");
    assert_eq!(&stored, report);
}

#[tokio::test]
async fn test_single_document_upload() {
    logging::init_test();

    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let upload_dir = TempDir::new().unwrap();
    let importer = create_test_importer(&db_path, &upload_dir, InMemoryWorkbook::default());

    let outcome = importer.import(upload(false, true)).await.expect("import failed");

    assert!(outcome.manifest.passengers.is_empty());
    assert_eq!(outcome.manifest.crews.len(), 2);
    assert!(outcome.manifest.passenger_file_url.is_none());
    assert_eq!(outcome.report.passenger_rows_total, 0);
}

#[tokio::test]
async fn test_no_documents_rejected() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let upload_dir = TempDir::new().unwrap();
    let importer = create_test_importer(&db_path, &upload_dir, InMemoryWorkbook::default());

    let err = importer.import(upload(false, false)).await.unwrap_err();
    assert!(matches!(err, ImportError::NoDocuments));
}

#[tokio::test]
async fn test_atomic_policy_persists_nothing() {
    logging::init_test();

    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    ConfigManager::new(&db_path)
        .unwrap()
        .set_row_policy(RowPolicy::Atomic)
        .unwrap();

    let upload_dir = TempDir::new().unwrap();
    let importer = create_test_importer(&db_path, &upload_dir, InMemoryWorkbook::default());

    let err = importer.import(upload(true, true)).await.unwrap_err();
    match err {
        ImportError::RowsRejected(rows) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].row_index, 3);
        }
        other => panic!("Expected RowsRejected, got {:?}", other),
    }

    let repo = ManifestRepositoryImpl::new(&db_path).unwrap();
    assert!(repo.list_manifests(0, 100).await.unwrap().is_empty());
    // 校验失败时不留存文件
    assert!(!upload_dir.path().join("manifests").exists());
}

#[tokio::test]
async fn test_layout_override_applies() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");

    // 新版模板：船员表多两行抬头
    let mut layout = SheetLayout::default_crew();
    layout.skip_rows = 19;
    ConfigManager::new(&db_path).unwrap().set_sheet_layout(&layout).unwrap();

    let mut workbook = InMemoryWorkbook::default();
    workbook.crew = {
        let mut r = calamine::Range::new((0, 0), (20, 7));
        r.set_value((19, 0), calamine::Data::Int(1));
        r.set_value((19, 1), calamine::Data::String("RUDI".to_string()));
        r.set_value((19, 3), calamine::Data::String("1980-13-45".to_string()));
        r
    };

    let upload_dir = TempDir::new().unwrap();
    let importer = create_test_importer(&db_path, &upload_dir, workbook);
    let outcome = importer.import(upload(false, true)).await.expect("import failed");

    assert_eq!(outcome.manifest.crews.len(), 1);
    assert_eq!(outcome.manifest.crews[0].name, "RUDI");
    assert_eq!(outcome.manifest.crews[0].dob, None);
    assert!(outcome
        .report
        .warnings
        .iter()
        .any(|w| w.field == "dob" && w.reason == REASON_BAD_DATE));
}

#[tokio::test]
async fn test_unreadable_workbook_is_format_error() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let upload_dir = TempDir::new().unwrap();

    let repo = ManifestRepositoryImpl::new(&db_path).unwrap();
    let config = ConfigManager::new(&db_path).unwrap();
    let store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(upload_dir.path(), "http://x/uploads"));
    let importer = ManifestImporterImpl::new(repo, config, store, ManifestPipeline::default());

    let err = importer.import(upload(true, false)).await.unwrap_err();
    assert!(err.is_format_error(), "unexpected error: {:?}", err);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_imports_on_multi_thread_runtime() {
    logging::init_test();

    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let upload_dir = TempDir::new().unwrap();
    let importer = Arc::new(create_test_importer(&db_path, &upload_dir, InMemoryWorkbook::default()));

    let first = tokio::spawn({
        let importer = Arc::clone(&importer);
        async move { importer.import(upload(true, true)).await }
    });
    let second = tokio::spawn({
        let importer = Arc::clone(&importer);
        async move { importer.import(upload(true, false)).await }
    });

    let first = first.await.unwrap().expect("first import failed");
    let second = second.await.unwrap().expect("second import failed");

    assert_ne!(first.manifest.id, second.manifest.id);
    assert_eq!(first.manifest.crews.len(), 2);
    assert!(second.manifest.crews.is_empty());

    let repo = ManifestRepositoryImpl::new(&db_path).unwrap();
    assert_eq!(repo.list_manifests(0, 10).await.unwrap().len(), 2);
}
