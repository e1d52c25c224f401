// ==========================================
// 港口到港舱单系统 - 驾驶舱统计仓储
// ==========================================
// 职责: 只读聚合查询（概览 / 增强驾驶舱）
// 年龄按到港日期计算周岁，分组在内存中完成
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::analytics::{
    age_group_label, age_on, round_avg, AgeGenderDistributionStat, DailyTrafficStat,
    DashboardStats, EnhancedDashboardStats, NationalityDistributionStat, RouteComparisonStat,
    TopNationalityStat, AGE_GROUPS,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct AnalyticsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AnalyticsRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 概览统计
    pub fn overview(&self) -> RepositoryResult<DashboardStats> {
        let conn = self.get_conn()?;

        let total_manifests: i64 = conn.query_row("SELECT COUNT(*) FROM manifests", [], |r| r.get(0))?;
        let total_passengers: i64 = conn.query_row("SELECT COUNT(*) FROM passengers", [], |r| r.get(0))?;
        let count_sex = |sex: &str| -> rusqlite::Result<i64> {
            conn.query_row(
                "SELECT COUNT(*) FROM passengers WHERE sex = ?1",
                params![sex],
                |r| r.get(0),
            )
        };
        let male_passengers = count_sex("M")?;
        let female_passengers = count_sex("F")?;

        let top_nationality = conn
            .query_row(
                r#"
                SELECT nationality, COUNT(*) AS cnt
                FROM passengers
                WHERE nationality IS NOT NULL
                GROUP BY nationality
                ORDER BY cnt DESC, nationality ASC
                LIMIT 1
                "#,
                [],
                |r| {
                    Ok(TopNationalityStat {
                        nationality: r.get(0)?,
                        count: r.get(1)?,
                    })
                },
            )
            .optional()?
            .unwrap_or_default();

        Ok(DashboardStats {
            total_manifests,
            total_passengers,
            male_passengers,
            female_passengers,
            avg_passengers_per_manifest: round_avg(total_passengers, total_manifests),
            top_nationality,
        })
    }

    /// 增强驾驶舱统计
    pub fn enhanced(&self) -> RepositoryResult<EnhancedDashboardStats> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT m.arrival_date, COUNT(p.id), COUNT(DISTINCT m.id)
            FROM manifests m
            LEFT JOIN passengers p ON p.manifest_id = m.id
            GROUP BY m.arrival_date
            ORDER BY m.arrival_date
            "#,
        )?;
        let daily_traffic = stmt
            .query_map([], |r| {
                let date: NaiveDate = r.get(0)?;
                Ok(DailyTrafficStat {
                    date: date.format("%Y-%m-%d").to_string(),
                    passenger_count: r.get(1)?,
                    manifest_count: r.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT m.origin || ' - ' || m.destination AS route, COUNT(p.id) AS cnt
            FROM manifests m
            LEFT JOIN passengers p ON p.manifest_id = m.id
            GROUP BY route
            ORDER BY cnt DESC, route ASC
            "#,
        )?;
        let route_comparison = stmt
            .query_map([], |r| {
                Ok(RouteComparisonStat {
                    route: r.get(0)?,
                    passenger_count: r.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT nationality, COUNT(*) AS cnt
            FROM passengers
            WHERE nationality IS NOT NULL
            GROUP BY nationality
            ORDER BY cnt DESC, nationality ASC
            "#,
        )?;
        let nationality_distribution = stmt
            .query_map([], |r| {
                Ok(NationalityDistributionStat {
                    nationality: r.get(0)?,
                    count: r.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT p.dob, p.sex, m.arrival_date
            FROM passengers p
            JOIN manifests m ON m.id = p.manifest_id
            WHERE p.dob IS NOT NULL AND p.sex IN ('M', 'F')
            "#,
        )?;
        let mut buckets: HashMap<&'static str, (i64, i64)> = HashMap::new();
        let rows = stmt.query_map([], |r| {
            Ok((
                r.get::<_, NaiveDate>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, NaiveDate>(2)?,
            ))
        })?;
        for row in rows {
            let (dob, sex, arrival) = row?;
            let Some(age) = age_on(dob, arrival) else {
                continue;
            };
            let bucket = buckets.entry(age_group_label(age)).or_default();
            if sex == "M" {
                bucket.0 += 1;
            } else {
                bucket.1 += 1;
            }
        }
        let age_gender_distribution = AGE_GROUPS
            .iter()
            .map(|(label, _, _)| {
                let (male_count, female_count) = buckets.get(label).copied().unwrap_or_default();
                AgeGenderDistributionStat {
                    age_group: label.to_string(),
                    male_count,
                    female_count,
                }
            })
            .collect();

        Ok(EnhancedDashboardStats {
            daily_traffic,
            route_comparison,
            nationality_distribution,
            age_gender_distribution,
        })
    }
}
