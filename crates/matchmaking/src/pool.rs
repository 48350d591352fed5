//! Rating-ordered waiting pool (spec §4.8, C8).
//!
//! One ordered structure per time-control key, backed by a `BTreeMap<i32,
//! Vec<WaitingPlayer>>` bucketed by rating (ratings are not unique) plus a
//! secondary `user id -> rating` index for O(log n) leave-by-user-id. A
//! single lock covers every pool and the index, matching the original's
//! `PoolManager` (one `sync.RWMutex` guarding every `llrb.LLRB` plus the
//! `playerIndex` map).

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

/// The literal set of supported time-control keys (spec §6), keyed here as
/// `"<initialMinutes>_<incrementSeconds>"`.
pub const POOL_KEYS: &[&str] = &[
    "1_0", "1_1", "2_1", "3_0", "3_2", "10_0", "10_5", "15_10", "30_0", "30_20",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitingPlayer {
    pub user_id: String,
    pub username: String,
    pub rating: i32,
}

#[derive(Default)]
struct PoolState {
    buckets: BTreeMap<i32, Vec<WaitingPlayer>>,
    index: HashMap<String, i32>,
}

pub struct MatchmakingPool {
    pools: Mutex<HashMap<String, PoolState>>,
}

impl MatchmakingPool {
    pub fn new() -> MatchmakingPool {
        let mut pools = HashMap::with_capacity(POOL_KEYS.len());
        for key in POOL_KEYS {
            pools.insert((*key).to_string(), PoolState::default());
        }
        MatchmakingPool {
            pools: Mutex::new(pools),
        }
    }

    /// Removes any prior entry for this user under `pool_key`, then inserts
    /// the fresh one. Unknown pool keys are created on demand so a caller
    /// passing an unlisted key still behaves sanely.
    pub fn join(&self, pool_key: &str, player: WaitingPlayer) {
        let mut pools = self.pools.lock();
        let state = pools.entry(pool_key.to_string()).or_default();
        remove_indexed(state, &player.user_id);
        state.index.insert(player.user_id.clone(), player.rating);
        state.buckets.entry(player.rating).or_default().push(player);
    }

    pub fn leave(&self, pool_key: &str, user_id: &str) {
        let mut pools = self.pools.lock();
        if let Some(state) = pools.get_mut(pool_key) {
            remove_indexed(state, user_id);
        }
    }

    /// Examines the successor and predecessor of `target_rating` and removes
    /// and returns whichever is closer (ties resolved in favor of the
    /// successor — either is acceptable per spec). Returns `None` on an
    /// empty or unknown pool.
    pub fn find_nearest(&self, pool_key: &str, target_rating: i32) -> Option<WaitingPlayer> {
        let mut pools = self.pools.lock();
        let state = pools.get_mut(pool_key)?;

        let successor = state
            .buckets
            .range(target_rating..)
            .next()
            .map(|(&rating, _)| rating);
        let predecessor = state
            .buckets
            .range(..target_rating)
            .next_back()
            .map(|(&rating, _)| rating);

        let chosen_rating = match (successor, predecessor) {
            (Some(s), Some(p)) => {
                if (s - target_rating).abs() <= (target_rating - p).abs() {
                    s
                } else {
                    p
                }
            }
            (Some(s), None) => s,
            (None, Some(p)) => p,
            (None, None) => return None,
        };

        let bucket = state.buckets.get_mut(&chosen_rating)?;
        let player = bucket.pop()?;
        if bucket.is_empty() {
            state.buckets.remove(&chosen_rating);
        }
        state.index.remove(&player.user_id);
        Some(player)
    }

    pub fn pool_size(&self, pool_key: &str) -> usize {
        let pools = self.pools.lock();
        pools
            .get(pool_key)
            .map(|state| state.index.len())
            .unwrap_or(0)
    }
}

impl Default for MatchmakingPool {
    fn default() -> MatchmakingPool {
        MatchmakingPool::new()
    }
}

fn remove_indexed(state: &mut PoolState, user_id: &str) {
    if let Some(rating) = state.index.remove(user_id) {
        if let Some(bucket) = state.buckets.get_mut(&rating) {
            bucket.retain(|p| p.user_id != user_id);
            if bucket.is_empty() {
                state.buckets.remove(&rating);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, rating: i32) -> WaitingPlayer {
        WaitingPlayer {
            user_id: id.to_string(),
            username: id.to_string(),
            rating,
        }
    }

    #[test]
    fn join_then_find_nearest_returns_the_only_entry() {
        let pool = MatchmakingPool::new();
        pool.join("3_2", player("a", 1500));
        let found = pool.find_nearest("3_2", 1500).unwrap();
        assert_eq!(found.user_id, "a");
        assert_eq!(pool.pool_size("3_2"), 0);
    }

    #[test]
    fn rejoin_under_same_key_replaces_prior_rating() {
        let pool = MatchmakingPool::new();
        pool.join("3_2", player("a", 1200));
        pool.join("3_2", player("a", 1800));
        assert_eq!(pool.pool_size("3_2"), 1);
        let found = pool.find_nearest("3_2", 1800).unwrap();
        assert_eq!(found.rating, 1800);
    }

    #[test]
    fn find_nearest_prefers_closer_side() {
        let pool = MatchmakingPool::new();
        pool.join("3_2", player("low", 1000));
        pool.join("3_2", player("high", 1400));
        let found = pool.find_nearest("3_2", 1350).unwrap();
        assert_eq!(found.user_id, "high");
    }

    #[test]
    fn leave_removes_the_entry() {
        let pool = MatchmakingPool::new();
        pool.join("3_2", player("a", 1500));
        pool.leave("3_2", "a");
        assert_eq!(pool.pool_size("3_2"), 0);
        assert!(pool.find_nearest("3_2", 1500).is_none());
    }

    #[test]
    fn empty_pool_has_no_nearest() {
        let pool = MatchmakingPool::new();
        assert!(pool.find_nearest("3_2", 1500).is_none());
    }
}
