//! Failure injection and call accounting for the mock services.

use super::latency::Operation;
use rand::Rng;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use talentloom_core::{ServiceError, ServiceResult};

/// Decides whether a simulated call fails.
///
/// Scripted failures (queued per operation with [`FaultInjector::fail_next`])
/// are consumed first; otherwise a call fails transiently with probability
/// `failure_rate`.
#[derive(Debug, Default)]
pub struct FaultInjector {
    failure_rate: f64,
    scripted: Mutex<HashMap<Operation, VecDeque<ServiceError>>>,
}

impl FaultInjector {
    pub fn new(failure_rate: f64) -> Self {
        Self {
            failure_rate: failure_rate.clamp(0.0, 1.0),
            scripted: Mutex::new(HashMap::new()),
        }
    }

    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }

    /// Make the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: Operation, error: ServiceError) {
        self.scripted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Drop every queued failure.
    pub fn clear(&self) {
        self.scripted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn check(&self, operation: Operation) -> ServiceResult<()> {
        let scripted = self
            .scripted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);
        if let Some(error) = scripted {
            return Err(error);
        }
        if self.failure_rate > 0.0 && rand::rng().random_bool(self.failure_rate) {
            return Err(ServiceError::transient(
                operation.as_str(),
                "simulated network failure",
            ));
        }
        Ok(())
    }
}

/// Counts how often each operation reached the mock services.
#[derive(Debug, Default)]
pub struct CallLog {
    calls: Mutex<BTreeMap<Operation, usize>>,
}

impl CallLog {
    pub fn record(&self, operation: Operation) {
        *self
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(operation)
            .or_insert(0) += 1;
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&operation)
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }

    pub fn reset(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_failures_are_consumed_in_order() {
        let faults = FaultInjector::new(0.0);
        faults.fail_next(Operation::ListJobs, ServiceError::unknown("first"));
        faults.fail_next(Operation::ListJobs, ServiceError::unknown("second"));

        assert_eq!(
            faults.check(Operation::ListJobs),
            Err(ServiceError::unknown("first"))
        );
        assert!(faults.check(Operation::ListOffers).is_ok());
        assert_eq!(
            faults.check(Operation::ListJobs),
            Err(ServiceError::unknown("second"))
        );
        assert!(faults.check(Operation::ListJobs).is_ok());
    }

    #[test]
    fn test_full_failure_rate_always_fails_transiently() {
        let faults = FaultInjector::new(1.0);
        let err = faults.check(Operation::Kpis).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_failure_rate_is_clamped() {
        assert_eq!(FaultInjector::new(7.0).failure_rate(), 1.0);
        assert_eq!(FaultInjector::new(-1.0).failure_rate(), 0.0);
    }

    #[test]
    fn test_call_log_counts() {
        let log = CallLog::default();
        log.record(Operation::ListPipeline);
        log.record(Operation::ListPipeline);
        log.record(Operation::Kpis);
        assert_eq!(log.count(Operation::ListPipeline), 2);
        assert_eq!(log.total(), 3);
        log.reset();
        assert_eq!(log.total(), 0);
    }
}
