use crate::{FleetError, FleetResult};
use crate::api::{Bus, BusRegistration, BusWriteApi};
use crate::store::{FleetStore, run_detached};
use crate::validate::{LATITUDE_RANGE, LONGITUDE_RANGE, parse_coordinate, parse_identifier};

/// Accepts bus registrations and owns identifier uniqueness.
#[derive(Clone)]
pub struct FleetRegistry {
    store: FleetStore,
}

impl FleetRegistry {
    pub fn new(store: FleetStore) -> Self {
        Self { store }
    }

    /// Check-then-insert. The existence check is a fast path only; a concurrent
    /// duplicate that slips past it is rejected by the primary key.
    pub async fn register_bus(&self, input: &BusRegistration) -> FleetResult<Bus> {
        let bus = Bus {
            id: parse_identifier("id", input.id.as_deref())?,
            latitude: parse_coordinate("latitude", input.latitude.as_ref(), LATITUDE_RANGE)?,
            longitude: parse_coordinate("longitude", input.longitude.as_ref(), LONGITUDE_RANGE)?,
        };
        let store = self.store.clone();
        run_detached(async move { create_if_absent(&store, bus).await }).await
    }

    pub async fn bus_exists(&self, bus_id: &str) -> FleetResult<bool> {
        self.store.bus_exists(bus_id).await
    }
}

async fn create_if_absent(store: &FleetStore, bus: Bus) -> FleetResult<Bus> {
    if store.bus_exists(&bus.id).await? {
        return Err(FleetError::conflict(format!(
            "bus {} already exists",
            bus.id
        )));
    }
    store.create_bus(&bus).await?;
    log::info!("fleet: registered bus {}", bus.id);
    Ok(bus)
}
