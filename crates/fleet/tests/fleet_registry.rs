use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Waker};
use std::time::Duration;

use busline_fleet::{
    BusRegistration, FieldValue, FleetConfig, FleetError, FleetRegistry, FleetResult, FleetStore,
    NullNotifier, ReferenceDataApi,
};
use tempfile::tempdir;

fn registration(id: &str, latitude: f64, longitude: f64) -> BusRegistration {
    BusRegistration {
        id: Some(id.to_string()),
        latitude: Some(FieldValue::Number(latitude)),
        longitude: Some(FieldValue::Number(longitude)),
    }
}

async fn open(base: &std::path::Path, name: &str) -> FleetResult<FleetStore> {
    let config = FleetConfig::default_sqlite(base.join(name).to_string_lossy());
    FleetStore::connect(&config, base, Arc::new(NullNotifier)).await
}

#[tokio::test]
async fn fresh_bus_is_registered_and_visible() -> FleetResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path(), "registry.sqlite").await?;
    let registry = FleetRegistry::new(store.clone());

    assert!(!registry.bus_exists("910").await?);
    let bus = registry
        .register_bus(&registration("910", 41.9, 12.5))
        .await?;
    assert_eq!(bus.id, "910");
    assert!(registry.bus_exists("910").await?);

    let ids: Vec<String> = store.list_buses().await?.into_iter().map(|bus| bus.id).collect();
    assert_eq!(ids, vec!["492".to_string(), "910".to_string()]);
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_conflicts_and_keeps_one_row() -> FleetResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path(), "duplicate.sqlite").await?;
    let registry = FleetRegistry::new(store.clone());

    registry
        .register_bus(&registration("64", 41.89, 12.47))
        .await?;
    let err = registry
        .register_bus(&registration("64", 10.0, 10.0))
        .await
        .expect_err("duplicate");
    assert!(matches!(err, FleetError::Conflict { .. }));

    let buses = store.list_buses().await?;
    let matching: Vec<_> = buses.iter().filter(|bus| bus.id == "64").collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].latitude, 41.89);
    Ok(())
}

#[tokio::test]
async fn seed_bus_cannot_be_registered_again() -> FleetResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path(), "seed.sqlite").await?;
    let registry = FleetRegistry::new(store);
    let err = registry
        .register_bus(&registration("492", 41.9, 12.5))
        .await
        .expect_err("seeded");
    assert_eq!(err.code(), "conflict");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_registrations_pick_one_winner() -> FleetResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path(), "race.sqlite").await?;
    let registry = FleetRegistry::new(store.clone());

    let left = registry.clone();
    let right = registry.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { left.register_bus(&registration("77", 41.0, 12.0)).await }),
        tokio::spawn(async move { right.register_bus(&registration("77", 42.0, 13.0)).await }),
    );
    let outcomes = [a.expect("join"), b.expect("join")];
    let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, Err(FleetError::Conflict { .. })))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);

    let count = store
        .list_buses()
        .await?
        .into_iter()
        .filter(|bus| bus.id == "77")
        .count();
    assert_eq!(count, 1);
    Ok(())
}

#[tokio::test]
async fn invalid_registrations_are_rejected_before_storage() -> FleetResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path(), "invalid.sqlite").await?;
    let registry = FleetRegistry::new(store.clone());

    let missing_id = BusRegistration {
        id: None,
        ..registration("x", 1.0, 1.0)
    };
    let bad_latitude = BusRegistration {
        latitude: Some(FieldValue::Text("north".to_string())),
        ..registration("81", 1.0, 1.0)
    };
    for input in [missing_id, bad_latitude] {
        let err = registry.register_bus(&input).await.expect_err("invalid");
        assert!(matches!(err, FleetError::Validation { .. }));
    }
    assert_eq!(store.list_buses().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn abandoned_registration_still_lands() -> FleetResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path(), "abandoned.sqlite").await?;
    let registry = FleetRegistry::new(store.clone());

    let input = registration("77", 41.9, 12.5);
    let mut request = Box::pin(registry.register_bus(&input));
    let mut cx = Context::from_waker(Waker::noop());
    assert!(request.as_mut().poll(&mut cx).is_pending());
    drop(request);

    let mut registered = false;
    for _ in 0..100 {
        if registry.bus_exists("77").await? {
            registered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(registered);
    Ok(())
}
