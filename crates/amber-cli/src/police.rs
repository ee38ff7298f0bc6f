//! Simulated traffic police console.
//!
//! Checks the authority for pending preemption requests at a fixed interval
//! and accepts each one after a seeded random response delay.

use std::sync::Arc;
use std::time::Duration;

use amber_authority::InMemoryAuthority;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::PoliceConfig;

pub fn spawn_operator(authority: Arc<InMemoryAuthority>, config: PoliceConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        loop {
            tokio::time::sleep(config.check_interval()).await;
            for request in authority.pending_requests() {
                let delay = response_delay(&mut rng, &config);
                info!(
                    request = %request.id,
                    signal = %request.signal_id,
                    delay_ms = delay.as_millis() as u64,
                    "police reviewing request"
                );
                tokio::time::sleep(delay).await;
                match authority.accept(&request.id) {
                    Ok(signal) => info!(%signal, "police accepted request, signal green"),
                    Err(e) => warn!(request = %request.id, error = %e, "accept failed"),
                }
            }
        }
    })
}

fn response_delay(rng: &mut ChaCha8Rng, config: &PoliceConfig) -> Duration {
    let ms = rng.gen_range(config.min_response_ms..=config.max_response_ms);
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use amber_route::{Signal, SignalId, SignalStatus, Waypoint};

    use super::*;

    #[test]
    fn test_delays_within_bounds_and_reproducible() {
        let config = PoliceConfig::default();
        let mut a = ChaCha8Rng::seed_from_u64(config.seed);
        let mut b = ChaCha8Rng::seed_from_u64(config.seed);
        for _ in 0..100 {
            let d = response_delay(&mut a, &config);
            assert!(d >= Duration::from_millis(config.min_response_ms));
            assert!(d <= Duration::from_millis(config.max_response_ms));
            assert_eq!(d, response_delay(&mut b, &config));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_operator_accepts_pending_request() {
        let authority = Arc::new(InMemoryAuthority::with_signals(&[Signal::new(
            SignalId(0),
            Waypoint::new(12.9, 77.6),
        )]));
        authority.request(SignalId(0)).unwrap();

        let config = PoliceConfig::default();
        let operator = spawn_operator(authority.clone(), config.clone());

        tokio::time::sleep(config.check_interval() + Duration::from_millis(config.min_response_ms - 1)).await;
        assert_eq!(authority.status(SignalId(0)).unwrap(), SignalStatus::Red);

        tokio::time::sleep(Duration::from_millis(config.max_response_ms)).await;
        assert_eq!(authority.status(SignalId(0)).unwrap(), SignalStatus::Green);
        assert!(authority.pending_requests().is_empty());
        operator.abort();
    }
}
