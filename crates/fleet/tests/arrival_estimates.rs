use std::sync::Arc;

use busline_fleet::{
    ArrivalEstimator, BusRegistration, FieldValue, FleetConfig, FleetRegistry, FleetResult,
    FleetStore, NullNotifier,
};
use tempfile::tempdir;
use time::Duration;
use time::macros::datetime;

async fn open(base: &std::path::Path, name: &str) -> FleetResult<FleetStore> {
    let config = FleetConfig::default_sqlite(base.join(name).to_string_lossy());
    FleetStore::connect(&config, base, Arc::new(NullNotifier)).await
}

#[tokio::test]
async fn seed_route_projects_from_one_snapshot() -> FleetResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path(), "eta.sqlite").await?;
    let estimator = ArrivalEstimator::new(store);
    let now = datetime!(2024-06-01 08:00:00 UTC);

    let estimates = estimator.estimate_arrivals_at("492", now).await?;
    assert_eq!(estimates.len(), 40);
    assert_eq!(estimates[0].bus_stop_id, "1");
    assert_eq!(estimates[0].timestamp, now);
    assert_eq!(estimates[1].bus_stop_id, "2");
    assert_eq!(estimates[1].timestamp, now + Duration::seconds(51));
    for estimate in &estimates {
        assert_eq!(estimate.bus_id, "492");
        assert_eq!(
            estimate.timestamp - Duration::seconds(estimate.time_seconds),
            now
        );
    }
    Ok(())
}

#[tokio::test]
async fn live_estimates_share_a_single_now() -> FleetResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path(), "live.sqlite").await?;
    let estimator = ArrivalEstimator::new(store);

    let estimates = estimator.estimate_arrivals("492").await?;
    let anchor = estimates[0].timestamp - Duration::seconds(estimates[0].time_seconds);
    assert!(
        estimates
            .iter()
            .all(|estimate| estimate.timestamp - Duration::seconds(estimate.time_seconds) == anchor)
    );
    Ok(())
}

#[tokio::test]
async fn buses_without_offsets_get_an_empty_schedule() -> FleetResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path(), "empty.sqlite").await?;
    FleetRegistry::new(store.clone())
        .register_bus(&BusRegistration {
            id: Some("38".to_string()),
            latitude: Some(FieldValue::Number(41.9)),
            longitude: Some(FieldValue::Number(12.5)),
        })
        .await?;
    let estimator = ArrivalEstimator::new(store);

    assert!(estimator.estimate_arrivals("38").await?.is_empty());
    assert!(estimator.estimate_arrivals("never-registered").await?.is_empty());
    Ok(())
}
