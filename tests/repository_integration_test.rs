// ==========================================
// 仓储层集成测试
// ==========================================
// 测试目标: 舱单落库 / 分页 / 船员补录 / 驾驶舱聚合
// ==========================================

mod test_helpers;

use port_manifest::domain::import::ImportReport;
use port_manifest::domain::manifest::{CrewRecord, CrewUpdate};
use port_manifest::logging;
use port_manifest::repository::{AnalyticsRepository, ManifestRepository, ManifestRepositoryImpl};
use test_helpers::{date, new_manifest, passenger, voyage_header};

fn report(batch_id: &str) -> ImportReport {
    ImportReport {
        batch_id: batch_id.to_string(),
        ..Default::default()
    }
}

/// 三张舱单：两条航线，两个到港日
async fn seed(repo: &ManifestRepositoryImpl) {
    let m1 = new_manifest(
        voyage_header("Batam", "Tanjung Pinang", date(2024, 5, 1)),
        vec![
            passenger(2, "ALICE", "F", Some(date(2010, 6, 1)), "INDONESIA"),
            passenger(3, "BUDI", "M", Some(date(1990, 5, 1)), "INDONESIA"),
            passenger(4, "CHEN", "M", Some(date(1950, 1, 1)), "SINGAPORE"),
        ],
    );
    let m2 = new_manifest(
        voyage_header("Batam", "Tanjung Pinang", date(2024, 5, 1)),
        vec![passenger(2, "DIAN", "F", Some(date(1980, 5, 2)), "MALAYSIA")],
    );
    let m3 = new_manifest(
        voyage_header("Singapore", "Tanjung Pinang", date(2024, 5, 3)),
        vec![passenger(2, "EKO", "M", None, "INDONESIA")],
    );

    for (i, m) in [m1, m2, m3].into_iter().enumerate() {
        repo.insert_manifest(m, &report(&format!("batch-{}", i)))
            .await
            .expect("insert manifest failed");
    }
}

#[tokio::test]
async fn test_insert_list_and_find() {
    logging::init_test();
    println!("\n=== 测试: 舱单落库与分页 ===");

    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let repo = ManifestRepositoryImpl::new(&db_path).expect("Failed to create repo");
    seed(&repo).await;

    let all = repo.list_manifests(0, 100).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].id < w[1].id));

    // 子记录按原始顺序编号
    let first = &all[0];
    let names: Vec<&str> = first.passengers.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["ALICE", "BUDI", "CHEN"]);
    assert_eq!(
        first.passengers.iter().map(|p| p.seq_no).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert!(first.passengers.iter().all(|p| p.manifest_id == first.id));

    let page = repo.list_manifests(1, 1).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, all[1].id);

    let beyond = repo.list_manifests(10, 5).await.unwrap();
    assert!(beyond.is_empty());

    let found = repo.find_manifest(all[2].id).await.unwrap().expect("manifest exists");
    assert_eq!(found.origin, "Singapore");
    assert_eq!(found.passengers[0].dob, None);

    assert!(repo.find_manifest(9999).await.unwrap().is_none());
    assert!(repo.find_import_report(9999).await.unwrap().is_none());

    let stored = repo.find_import_report(all[1].id).await.unwrap().expect("report exists");
    assert_eq!(stored.batch_id, "batch-1");

    println!("✓ 舱单落库与分页正常");
}

#[tokio::test]
async fn test_update_crew_passport() {
    logging::init_test();

    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let repo = ManifestRepositoryImpl::new(&db_path).unwrap();

    let mut manifest = new_manifest(voyage_header("Batam", "Tanjung Pinang", date(2024, 5, 1)), vec![]);
    manifest.crews.push(CrewRecord {
        row_index: 18,
        name: "HASAN".to_string(),
        dob: Some(date(1975, 2, 1)),
        passport_no: None,
        passport_expiry: None,
        seaman_book_no: Some("SB-001".to_string()),
        seaman_book_expiry: None,
        rank: Some("MASTER".to_string()),
    });
    let id = repo.insert_manifest(manifest, &report("crew")).await.unwrap();
    let crew_id = repo.find_manifest(id).await.unwrap().unwrap().crews[0].id;

    // 只补录护照号，有效期保持为空
    let updated = repo
        .update_crew(
            crew_id,
            CrewUpdate {
                passport_no: Some("B9876".to_string()),
                passport_expiry: None,
            },
        )
        .await
        .unwrap()
        .expect("crew exists");
    assert_eq!(updated.passport_no.as_deref(), Some("B9876"));
    assert_eq!(updated.passport_expiry, None);
    assert_eq!(updated.seaman_book_no.as_deref(), Some("SB-001"));

    // 再补录有效期，护照号不被覆盖
    let updated = repo
        .update_crew(
            crew_id,
            CrewUpdate {
                passport_no: None,
                passport_expiry: Some(date(2030, 1, 31)),
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.passport_no.as_deref(), Some("B9876"));
    assert_eq!(updated.passport_expiry, Some(date(2030, 1, 31)));

    let missing = repo.update_crew(4242, CrewUpdate::default()).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_overview_stats() {
    logging::init_test();
    println!("\n=== 测试: 概览统计 ===");

    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let analytics = AnalyticsRepository::new(&db_path).unwrap();

    // 空库
    let empty = analytics.overview().unwrap();
    assert_eq!(empty.total_manifests, 0);
    assert_eq!(empty.avg_passengers_per_manifest, 0.0);
    assert_eq!(empty.top_nationality.nationality, "N/A");
    assert_eq!(empty.top_nationality.count, 0);

    let repo = ManifestRepositoryImpl::new(&db_path).unwrap();
    seed(&repo).await;

    let stats = analytics.overview().unwrap();
    assert_eq!(stats.total_manifests, 3);
    assert_eq!(stats.total_passengers, 5);
    assert_eq!(stats.male_passengers, 3);
    assert_eq!(stats.female_passengers, 2);
    // 5 / 3 = 1.666… → 1.7
    assert_eq!(stats.avg_passengers_per_manifest, 1.7);
    assert_eq!(stats.top_nationality.nationality, "INDONESIA");
    assert_eq!(stats.top_nationality.count, 3);

    println!("✓ 概览统计正确");
}

#[tokio::test]
async fn test_enhanced_dashboard() {
    logging::init_test();
    println!("\n=== 测试: 增强驾驶舱 ===");

    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let repo = ManifestRepositoryImpl::new(&db_path).unwrap();
    seed(&repo).await;

    let stats = AnalyticsRepository::new(&db_path).unwrap().enhanced().unwrap();

    // 按到港日
    assert_eq!(stats.daily_traffic.len(), 2);
    assert_eq!(stats.daily_traffic[0].date, "2024-05-01");
    assert_eq!(stats.daily_traffic[0].passenger_count, 4);
    assert_eq!(stats.daily_traffic[0].manifest_count, 2);
    assert_eq!(stats.daily_traffic[1].date, "2024-05-03");
    assert_eq!(stats.daily_traffic[1].passenger_count, 1);

    // 航线
    assert_eq!(stats.route_comparison.len(), 2);
    assert_eq!(stats.route_comparison[0].route, "Batam - Tanjung Pinang");
    assert_eq!(stats.route_comparison[0].passenger_count, 4);
    assert_eq!(stats.route_comparison[1].route, "Singapore - Tanjung Pinang");

    // 国籍
    assert_eq!(stats.nationality_distribution[0].nationality, "INDONESIA");
    assert_eq!(stats.nationality_distribution[0].count, 3);

    // 年龄 × 性别：始终输出 5 个分组
    let groups: Vec<&str> = stats
        .age_gender_distribution
        .iter()
        .map(|g| g.age_group.as_str())
        .collect();
    assert_eq!(groups, vec!["0-17", "18-30", "31-45", "46-60", "60+"]);

    let by_group = |label: &str| {
        stats
            .age_gender_distribution
            .iter()
            .find(|g| g.age_group == label)
            .map(|g| (g.male_count, g.female_count))
            .unwrap()
    };
    // ALICE 13 岁, BUDI 34 岁（生日当天）, CHEN 74 岁, DIAN 43 岁（生日前一天）, EKO 无出生日期
    assert_eq!(by_group("0-17"), (0, 1));
    assert_eq!(by_group("18-30"), (0, 0));
    assert_eq!(by_group("31-45"), (1, 1));
    assert_eq!(by_group("46-60"), (0, 0));
    assert_eq!(by_group("60+"), (1, 0));

    println!("✓ 增强驾驶舱统计正确");
}
