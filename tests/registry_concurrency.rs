//! Registry behaviour under contention.

use std::io;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use breaker_registry::resilience::{BreakerConfig, BreakerRegistry, CircuitBreaker, CircuitState};

fn config() -> BreakerConfig {
    BreakerConfig::new(0.5, Duration::from_secs(30), 10, Duration::from_secs(60)).unwrap()
}

#[test]
fn test_concurrent_get_or_add_across_keys() {
    let registry = Arc::new(BreakerRegistry::new());
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let mut seen = Vec::new();
                for k in 0..8 {
                    let key = format!("service-{}", (i + k) % 8);
                    let breaker = registry.get_or_add_with(&key, || Arc::new(CircuitBreaker::new(config())));
                    seen.push((key, breaker));
                }
                seen
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();

    assert_eq!(registry.len(), 8);
    for (key, breaker) in results {
        assert!(Arc::ptr_eq(&breaker, &registry.get(&key).unwrap()));
    }
}

#[test]
fn test_admin_commands_race_with_traffic() {
    let registry = Arc::new(BreakerRegistry::new());
    registry.register("shared", config());
    let barrier = Arc::new(Barrier::new(5));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let registry = registry.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            let breaker = registry.get("shared").unwrap();
            barrier.wait();
            for n in 0..500 {
                if breaker.permit_call() {
                    if n % 3 == 0 {
                        breaker.report_error(io::Error::new(io::ErrorKind::Other, "boom"));
                    } else {
                        breaker.report_success();
                    }
                }
            }
        }));
    }

    let admin = {
        let registry = registry.clone();
        let barrier = barrier.clone();
        thread::spawn(move || {
            barrier.wait();
            for n in 0..200 {
                if n % 2 == 0 {
                    registry.isolate("shared").unwrap();
                } else {
                    registry.reset("shared").unwrap();
                }
                let _ = registry.states();
            }
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    admin.join().unwrap();

    registry.isolate("shared").unwrap();
    assert_eq!(registry.state_of("shared").unwrap(), CircuitState::Isolated);
    registry.reset("shared").unwrap();
    assert_eq!(registry.state_of("shared").unwrap(), CircuitState::Closed);
    assert_eq!(registry.get("shared").unwrap().stats().throughput, 0);
}
