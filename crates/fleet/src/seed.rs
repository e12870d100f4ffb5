//! Reference data for line 492 (Stazione Tiburtina to Stazione Metro Cipro).

use log::info;
use sea_orm::sea_query::{OnConflict, Query};
use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::FleetResult;
use crate::db;
use crate::store::exec;

pub const SEED_BUS_ID: &str = "492";
const SEED_BUS_POSITION: (f64, f64) = (41.9096, 12.52975);

pub const SEED_STOPS: [(&str, &str, f64, f64); 40] = [
    ("1", "Stazione Tiburtina", 41.9096, 12.52975),
    ("2", "Tiburtina / Crociate", 41.90815, 12.52589),
    ("3", "Tiburtina / Valerio Massimo", 41.90594, 12.52228),
    ("4", "Tiburtina / Castro Laurenziano", 41.90391, 12.52032),
    ("5", "De Lollis / Verano", 41.90171, 12.5178),
    ("6", "De Lollis / Irpini", 41.90101, 12.51577),
    ("7", "Ramni / Marrucini", 41.9001, 12.51309),
    ("8", "Ramni/ Porta Tiburtina", 41.89906, 12.51032),
    ("9", "Pretoriano", 41.90064, 12.50818),
    ("10", "Catro Pretorio / Monzambano", 41.90347, 12.50687),
    ("11", "S. M. Battaglia", 41.90604, 12.50557),
    ("12", "Indipendenza", 41.90475, 12.50249),
    ("13", "Volturno / Gaeta", 41.90404, 12.50032),
    ("14", "Volturno / Cernaia", 41.90521, 12.49892),
    ("15", "Palestro", 41.90797, 12.50053),
    ("16", "XX Settembre / Piave", 41.90709, 12.49814),
    ("17", "XX Settembre / Min. Finanze", 41.90592, 12.49644),
    ("18", "Bissolati", 41.90525, 12.49266),
    ("19", "Barberini", 41.9043, 12.48889),
    ("20", "Tritone / Berberini", 41.90343, 12.48755),
    ("21", "Tritone / Fontana Trevi", 41.90262, 12.48446),
    ("22", "S. Claudio", 41.90195, 12.48037),
    ("23", "Corso / Minghetti", 41.89945, 12.48107),
    ("24", "Plebiscito", 41.89634, 12.48062),
    ("25", "Argentina", 41.89608, 12.47684),
    ("26", "Rinascimento", 41.89814, 12.47398),
    ("27", "Senato", 41.90028, 12.47382),
    ("28", "Zanardelli", 41.90139, 12.47211),
    ("29", "Lungotevere Marzio", 41.90316, 12.47378),
    ("30", "Vittoria Colonna", 41.90517, 12.47168),
    ("31", "Piazza Cavour", 41.90588, 12.46994),
    ("32", "Crescenzo / Orazio", 41.90547, 12.46739),
    ("33", "Crescenzo / Terenzio", 41.90572, 12.46387),
    ("34", "Crescenzo / Rinascimento", 41.90605, 12.45911),
    ("35", "Bastioni di Michelangelo", 41.90694, 12.45573),
    ("36", "Leone IV", 41.90903, 12.45524),
    ("37", "Doria A. / Largo Trionfale", 41.91007, 12.45347),
    ("38", "Di Lauria", 41.90875, 12.4503),
    ("39", "Emo", 41.9069, 12.44926),
    ("40", "Stazione Metro Cipro", 41.90722, 12.44789),
];

/// Seconds from route start at which bus 492 reaches each stop.
pub const SEED_OFFSETS: [(&str, i32); 40] = [
    ("1", 0),
    ("2", 51),
    ("3", 70),
    ("4", 78),
    ("5", 110),
    ("6", 117),
    ("7", 127),
    ("8", 147),
    ("9", 170),
    ("10", 196),
    ("11", 228),
    ("12", 262),
    ("13", 288),
    ("14", 303),
    ("15", 330),
    ("16", 339),
    ("17", 346),
    ("18", 380),
    ("19", 406),
    ("20", 427),
    ("21", 464),
    ("22", 486),
    ("23", 507),
    ("24", 529),
    ("25", 551),
    ("26", 591),
    ("27", 620),
    ("28", 684),
    ("29", 715),
    ("30", 750),
    ("31", 783),
    ("32", 803),
    ("33", 814),
    ("34", 829),
    ("35", 879),
    ("36", 891),
    ("37", 906),
    ("38", 923),
    ("39", 952),
    ("40", 969),
];

/// Insert the seed stops, bus and time table, leaving existing rows untouched.
pub async fn ensure_reference_data(conn: &DatabaseConnection) -> FleetResult<()> {
    let tx = conn.begin().await?;

    let mut stops = Query::insert()
        .into_table(db::BusStop::Table)
        .columns([
            db::BusStop::Id,
            db::BusStop::Name,
            db::BusStop::Latitude,
            db::BusStop::Longitude,
        ])
        .on_conflict(OnConflict::column(db::BusStop::Id).do_nothing().to_owned())
        .to_owned();
    for (id, name, latitude, longitude) in SEED_STOPS {
        stops.values_panic([id.into(), name.into(), latitude.into(), longitude.into()]);
    }
    exec(&tx, &stops).await?;

    let (latitude, longitude) = SEED_BUS_POSITION;
    let bus = Query::insert()
        .into_table(db::Bus::Table)
        .columns([db::Bus::Id, db::Bus::Latitude, db::Bus::Longitude])
        .values_panic([SEED_BUS_ID.into(), latitude.into(), longitude.into()])
        .on_conflict(OnConflict::column(db::Bus::Id).do_nothing().to_owned())
        .to_owned();
    exec(&tx, &bus).await?;

    let mut offsets = Query::insert()
        .into_table(db::BusTimeTable::Table)
        .columns([
            db::BusTimeTable::BusId,
            db::BusTimeTable::BusStopId,
            db::BusTimeTable::TimeSeconds,
        ])
        .on_conflict(
            OnConflict::columns([db::BusTimeTable::BusId, db::BusTimeTable::BusStopId])
                .do_nothing()
                .to_owned(),
        )
        .to_owned();
    for (stop_id, seconds) in SEED_OFFSETS {
        offsets.values_panic([SEED_BUS_ID.into(), stop_id.into(), seconds.into()]);
    }
    exec(&tx, &offsets).await?;

    tx.commit().await?;
    info!(
        "fleet: reference data ensured stops={} offsets={}",
        SEED_STOPS.len(),
        SEED_OFFSETS.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{SEED_OFFSETS, SEED_STOPS};

    #[test]
    fn every_offset_references_a_seed_stop() {
        let stops: HashSet<&str> = SEED_STOPS.iter().map(|(id, ..)| *id).collect();
        for (stop_id, _) in SEED_OFFSETS {
            assert!(stops.contains(stop_id), "offset for unknown stop {stop_id}");
        }
    }

    #[test]
    fn seed_offsets_increase_along_the_route() {
        for pair in SEED_OFFSETS.windows(2) {
            assert!(pair[0].1 < pair[1].1, "{:?} then {:?}", pair[0], pair[1]);
        }
    }
}
