use std::sync::Mutex;

use time::OffsetDateTime;

use crate::{FleetError, FleetResult};

static LAST_ISSUED_MICROS: Mutex<i64> = Mutex::new(0);

/// Process-wide clock for server-assigned creation times.
///
/// Readings never go backwards within one process, even if the wall clock is
/// stepped back; a regression repeats the last issued reading instead.
pub struct ServerClock;

impl ServerClock {
    pub fn now_micros() -> i64 {
        let physical = wall_clock_micros();
        let mut guard = match LAST_ISSUED_MICROS.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let next = physical.max(*guard);
        *guard = next;
        next
    }

    pub fn now() -> OffsetDateTime {
        // The reading originates from the wall clock, so it is always in range.
        from_micros(Self::now_micros()).unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}

fn wall_clock_micros() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    (nanos / 1_000) as i64
}

pub fn to_micros(value: OffsetDateTime) -> i64 {
    (value.unix_timestamp_nanos() / 1_000) as i64
}

pub fn from_micros(micros: i64) -> FleetResult<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(micros) * 1_000)
        .map_err(|err| FleetError::storage(format!("timestamp {micros} out of range: {err}")))
}

#[cfg(test)]
mod tests {
    use super::{ServerClock, from_micros, to_micros};

    #[test]
    fn readings_are_non_decreasing() {
        let mut last = ServerClock::now_micros();
        for _ in 0..1_000 {
            let next = ServerClock::now_micros();
            assert!(next >= last);
            last = next;
        }
    }

    #[test]
    fn micros_convert_both_ways() {
        let now = ServerClock::now();
        let micros = to_micros(now);
        let back = from_micros(micros).expect("in range");
        assert_eq!(to_micros(back), micros);
        assert!(from_micros(i64::MAX).is_err());
    }
}
