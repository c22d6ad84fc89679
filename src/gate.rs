//! Per-caller request cooldown / 请求冷却（按调用方）
//!
//! A request is admitted when the caller has no record or the last admitted
//! request is at least `cooldown` old. Dropped requests leave the record
//! untouched, so hammering never extends the window.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Gate decision / 放行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Drop,
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allow)
    }
}

/// Request gate / 请求闸门
pub struct RequestGate<K: Eq + Hash> {
    cooldown: Duration,
    /// caller -> last admitted request / 调用方 -> 上次放行时间
    records: DashMap<K, Instant>,
}

impl<K: Eq + Hash> RequestGate<K> {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            records: DashMap::new(),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Check-and-update under the caller's shard lock / 原子地检查并更新
    pub fn admit(&self, caller: K, now: Instant) -> Admission {
        match self.records.entry(caller) {
            Entry::Vacant(slot) => {
                slot.insert(now);
                Admission::Allow
            }
            Entry::Occupied(mut slot) => {
                if now.saturating_duration_since(*slot.get()) >= self.cooldown {
                    slot.insert(now);
                    Admission::Allow
                } else {
                    Admission::Drop
                }
            }
        }
    }

    pub fn admit_now(&self, caller: K) -> Admission {
        self.admit(caller, Instant::now())
    }

    /// Number of distinct callers seen / 已记录的调用方数量
    pub fn tracked_callers(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const COOLDOWN: Duration = Duration::from_millis(500);

    #[test]
    fn test_second_request_inside_cooldown_is_dropped() {
        let gate = RequestGate::new(COOLDOWN);
        let t0 = Instant::now();

        assert_eq!(gate.admit(1u64, t0), Admission::Allow);
        assert_eq!(gate.admit(1u64, t0 + Duration::from_millis(200)), Admission::Drop);
    }

    #[test]
    fn test_request_after_cooldown_is_allowed() {
        let gate = RequestGate::new(COOLDOWN);
        let t0 = Instant::now();

        assert!(gate.admit(1u64, t0).is_allowed());
        assert!(gate.admit(1u64, t0 + COOLDOWN).is_allowed());
    }

    #[test]
    fn test_drop_does_not_reset_window() {
        let gate = RequestGate::new(COOLDOWN);
        let t0 = Instant::now();

        gate.admit(7u64, t0);
        assert_eq!(gate.admit(7u64, t0 + Duration::from_millis(400)), Admission::Drop);
        // measured from t0, not from the dropped request
        assert_eq!(gate.admit(7u64, t0 + Duration::from_millis(500)), Admission::Allow);
    }

    #[test]
    fn test_different_callers_are_independent() {
        let gate = RequestGate::new(COOLDOWN);
        let t0 = Instant::now();

        assert!(gate.admit("alice", t0).is_allowed());
        assert!(gate.admit("bob", t0).is_allowed());
        assert_eq!(gate.tracked_callers(), 2);
    }

    #[test]
    fn test_clock_going_backwards_is_dropped() {
        let gate = RequestGate::new(COOLDOWN);
        let t0 = Instant::now() + Duration::from_secs(1);

        gate.admit(1u64, t0);
        assert_eq!(gate.admit(1u64, t0 - Duration::from_millis(10)), Admission::Drop);
    }

    #[test]
    fn test_concurrent_same_caller_admits_once() {
        let gate = Arc::new(RequestGate::new(Duration::from_secs(60)));
        let now = Instant::now();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let gate = gate.clone();
                std::thread::spawn(move || gate.admit(42u64, now))
            })
            .collect();

        let allowed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(Admission::is_allowed)
            .count();
        assert_eq!(allowed, 1);
    }
}
