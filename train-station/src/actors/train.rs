//! Train lifecycle: arrive, load, depart.

use std::sync::Arc;

use crate::domain::{DepartureRecord, ProtocolError};
use crate::protocol::Station;

/// Drive one train through a full cycle.
///
/// The train waits for the platform to be free, opens `capacity` seats,
/// blocks until boarding can go no further and then finalizes its
/// departure. Fresh capacity for any follow-up train comes from the driver,
/// never from inside the station guard.
pub async fn run_train(
    station: Arc<Station>,
    capacity: u32,
) -> Result<DepartureRecord, ProtocolError> {
    station.admit_train(capacity).await?;
    station.await_boarding_complete().await?;
    station.depart()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DepartureReason;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn lone_train_departs_empty() {
        let (station, _events) = Station::new();
        station.stage_cycle(0, 3).unwrap();

        let record = timeout(Duration::from_secs(5), run_train(station, 3))
            .await
            .expect("an undemanded train must not block")
            .unwrap();

        assert_eq!(record.reason, DepartureReason::NoDemand);
        assert_eq!(record.unused_seats, 3);
    }
}
