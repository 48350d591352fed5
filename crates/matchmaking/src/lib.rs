//! Rating-ordered waiting pool and pairing worker (spec §4.8/§4.9, C8/C9).

pub mod pairing;
pub mod player_client;
pub mod pool;

pub use pairing::{spawn_pairing_workers, PairingJob};
pub use player_client::PlayerServiceClient;
pub use pool::{MatchmakingPool, WaitingPlayer, POOL_KEYS};
