//! Integration tests for report persistence and the radius query
//!
//! Tests cover:
//! - Database creation and reopening
//! - Report insertion and lookup
//! - Radius inclusion agreeing with the in-process haversine
//! - Newest-first ordering
//! - Input validation

use chrono::Duration;
use floodmap_common::db::{
    find_within_radius, get_report, init_database, insert_report, recent_reports, NewReport,
};
use floodmap_common::geo::{haversine_km, haversine_miles, EARTH_RADIUS_KM, EARTH_RADIUS_MILES};
use floodmap_common::time::now;
use floodmap_common::{CommunityReport, Error, Severity};
use sqlx::SqlitePool;
use tempfile::TempDir;

const CENTER: (f64, f64) = (29.4241, -98.4936);

async fn setup_db() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().expect("Should create temp dir");
    let pool = init_database(&dir.path().join("floodmap.db"))
        .await
        .expect("Should initialize database");
    (dir, pool)
}

fn new_report(lat: f64, lon: f64, minutes_ago: i64) -> NewReport {
    let mut report = NewReport::new(lat, lon, Severity::Medium, "Standing water");
    report.created_at = Some(now() - Duration::minutes(minutes_ago));
    report
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("floodmap.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("floodmap.db");

    let pool1 = init_database(&db_path).await.unwrap();
    insert_report(&pool1, new_report(CENTER.0, CENTER.1, 0)).await.unwrap();
    drop(pool1);

    let pool2 = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_insert_and_get_report() {
    let (_dir, pool) = setup_db().await;

    let mut submission = new_report(CENTER.0, CENTER.1, 5);
    submission.photo_urls = vec!["photos/one.jpg".to_string(), "photos/two.jpg".to_string()];
    submission.user_id = Some("user-42".to_string());
    submission.manual_location = true;
    submission.severity = Severity::Extreme;

    let inserted = insert_report(&pool, submission).await.unwrap();
    let loaded = get_report(&pool, &inserted.id).await.unwrap();

    assert_eq!(loaded, inserted);
    assert_eq!(loaded.photo_urls.len(), 2);
    assert_eq!(loaded.severity, Severity::Extreme);
    assert_eq!(loaded.confirm_count, 0);

    let as_report: CommunityReport = loaded.clone().into();
    assert_eq!(as_report.timestamp_ms, loaded.created_at_ms());
}

#[tokio::test]
async fn test_get_missing_report_is_not_found() {
    let (_dir, pool) = setup_db().await;
    let result = get_report(&pool, "no-such-report").await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_insert_rejects_nan_coordinates() {
    let (_dir, pool) = setup_db().await;
    let result = insert_report(&pool, new_report(f64::NAN, CENTER.1, 0)).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_radius_query_matches_in_process_haversine() {
    let (_dir, pool) = setup_db().await;

    // Spread of points from ~0.1 to ~20 miles out in several directions
    let offsets = [
        (0.001, 0.0),
        (0.0, 0.002),
        (-0.01, 0.01),
        (0.02, -0.015),
        (-0.03, -0.03),
        (0.05, 0.04),
        (-0.08, 0.07),
        (0.12, -0.10),
        (0.2, 0.2),
        (-0.25, 0.1),
    ];
    for (i, (dlat, dlon)) in offsets.iter().enumerate() {
        insert_report(&pool, new_report(CENTER.0 + dlat, CENTER.1 + dlon, i as i64))
            .await
            .unwrap();
    }

    for radius in [0.5, 1.0, 2.5, 5.0, 10.0, 25.0] {
        let found = find_within_radius(&pool, CENTER.0, CENTER.1, radius)
            .await
            .unwrap();

        let expected = offsets
            .iter()
            .filter(|(dlat, dlon)| {
                haversine_miles(CENTER.0, CENTER.1, CENTER.0 + dlat, CENTER.1 + dlon) <= radius
            })
            .count();

        assert_eq!(found.len(), expected, "radius {} mi", radius);
        for report in &found {
            let d = haversine_miles(CENTER.0, CENTER.1, report.latitude, report.longitude);
            assert!(d <= radius, "report at {} mi returned for radius {}", d, radius);
        }
    }
}

#[tokio::test]
async fn test_radius_query_decides_boundary_points_like_haversine() {
    let (_dir, pool) = setup_db().await;

    // Spiral of points out to ~9 miles, golden-angle bearings
    let mut points = Vec::new();
    for i in 0..120 {
        let bearing = i as f64 * 2.399_963;
        let reach = 0.0004 + i as f64 * 0.0011;
        let lat = CENTER.0 + reach * bearing.cos();
        let lon = CENTER.1 + reach * bearing.sin();
        points.push(insert_report(&pool, new_report(lat, lon, i)).await.unwrap());
    }

    for point in &points {
        let radius = haversine_miles(CENTER.0, CENTER.1, point.latitude, point.longitude);

        let at_radius = find_within_radius(&pool, CENTER.0, CENTER.1, radius).await.unwrap();
        assert!(
            at_radius.iter().any(|r| r.id == point.id),
            "point at exactly {} mi was excluded",
            radius
        );

        // One ulp tighter must drop it, and everything returned must still fit
        let tighter = f64::from_bits(radius.to_bits() - 1);
        let inside = find_within_radius(&pool, CENTER.0, CENTER.1, tighter).await.unwrap();
        assert!(
            !inside.iter().any(|r| r.id == point.id),
            "point at {} mi was included for radius {}",
            radius,
            tighter
        );
        for report in &inside {
            let d = haversine_miles(CENTER.0, CENTER.1, report.latitude, report.longitude);
            assert!(d <= tighter, "report at {} mi returned for radius {}", d, tighter);
        }
    }
}

#[tokio::test]
async fn test_radius_query_consistent_with_km_metric() {
    let (_dir, pool) = setup_db().await;
    insert_report(&pool, new_report(CENTER.0 + 0.02, CENTER.1, 0)).await.unwrap();

    let km = haversine_km(CENTER.0, CENTER.1, CENTER.0 + 0.02, CENTER.1);
    let miles = km * EARTH_RADIUS_MILES / EARTH_RADIUS_KM;

    let just_inside = find_within_radius(&pool, CENTER.0, CENTER.1, miles * 1.001).await.unwrap();
    let just_outside = find_within_radius(&pool, CENTER.0, CENTER.1, miles * 0.999).await.unwrap();

    assert_eq!(just_inside.len(), 1);
    assert!(just_outside.is_empty());
}

#[tokio::test]
async fn test_radius_query_newest_first() {
    let (_dir, pool) = setup_db().await;

    let oldest = insert_report(&pool, new_report(CENTER.0, CENTER.1, 120)).await.unwrap();
    let newest = insert_report(&pool, new_report(CENTER.0 + 0.001, CENTER.1, 1)).await.unwrap();
    let middle = insert_report(&pool, new_report(CENTER.0, CENTER.1 + 0.001, 30)).await.unwrap();

    let found = find_within_radius(&pool, CENTER.0, CENTER.1, 1.0).await.unwrap();
    let ids: Vec<&str> = found.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec![newest.id.as_str(), middle.id.as_str(), oldest.id.as_str()]);
}

#[tokio::test]
async fn test_radius_query_empty_store() {
    let (_dir, pool) = setup_db().await;
    let found = find_within_radius(&pool, CENTER.0, CENTER.1, 5.0).await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_radius_query_rejects_bad_input() {
    let (_dir, pool) = setup_db().await;

    let negative = find_within_radius(&pool, CENTER.0, CENTER.1, -1.0).await;
    assert!(matches!(negative, Err(Error::InvalidInput(_))));

    let nan_radius = find_within_radius(&pool, CENTER.0, CENTER.1, f64::NAN).await;
    assert!(matches!(nan_radius, Err(Error::InvalidInput(_))));

    let bad_center = find_within_radius(&pool, 95.0, CENTER.1, 1.0).await;
    assert!(matches!(bad_center, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_recent_reports_window() {
    let (_dir, pool) = setup_db().await;

    insert_report(&pool, new_report(CENTER.0, CENTER.1, 300)).await.unwrap();
    let recent = insert_report(&pool, new_report(CENTER.0, CENTER.1, 10)).await.unwrap();

    let found = recent_reports(&pool, now() - Duration::hours(1), 100).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, recent.id);
}
