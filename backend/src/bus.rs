//! In-process substitute for the external pub/sub bus and durable queue
//! (spec §9 "Move suspension via channels"). The spec's contract is the
//! message shapes on `move_in`/`game_action`/`move_out`/`game.create` and
//! the ordering guarantees around them, not the transport; a real deployment
//! swaps this module for a pub/sub client and a durable-queue consumer
//! without touching `room` or `game_manager`.
//!
//! `move_out` is multi-producer, multi-consumer fan-out to a fleet of
//! gateway processes (spec §5), so it is a broadcast channel; `move_in`,
//! `game_action`, and `game.create` each have exactly one consumer (the
//! game manager), so they are plain mpsc channels.

use tokio::sync::{broadcast, mpsc};
use wire::{GameActionIn, GameCreateEnvelope, MoveIn, MoveOut};

pub const MOVE_IN_CAPACITY: usize = 256;
pub const GAME_ACTION_CAPACITY: usize = 256;
pub const GAME_CREATE_CAPACITY: usize = 64;
pub const MOVE_OUT_CAPACITY: usize = 1024;

/// The inbound halves of the bus, handed to the game manager's listener
/// tasks; the matching `*_tx` senders are cloned out to whatever external
/// surface accepts gateway traffic before this struct is constructed.
pub struct BusInbound {
    pub move_in_rx: mpsc::Receiver<MoveIn>,
    pub game_action_rx: mpsc::Receiver<GameActionIn>,
    pub game_create_rx: mpsc::Receiver<GameCreateEnvelope>,
}

/// Senders side of the bus: what the (out-of-scope) gateway and pairing
/// worker hold to publish onto the in-process substitute.
#[derive(Clone)]
pub struct BusHandles {
    pub move_in_tx: mpsc::Sender<MoveIn>,
    pub game_action_tx: mpsc::Sender<GameActionIn>,
    pub game_create_tx: mpsc::Sender<GameCreateEnvelope>,
    pub move_out_tx: broadcast::Sender<MoveOut>,
}

impl BusHandles {
    /// A fresh subscription to `move_out`, as a new gateway process
    /// connecting to the fan-out bus would take.
    pub fn subscribe_move_out(&self) -> broadcast::Receiver<MoveOut> {
        self.move_out_tx.subscribe()
    }
}

/// Builds the bus: bounded channels for the two inbound lanes and the
/// durable-queue substitute, a broadcast channel for outbound fan-out.
pub fn build() -> (BusHandles, BusInbound) {
    let (move_in_tx, move_in_rx) = mpsc::channel(MOVE_IN_CAPACITY);
    let (game_action_tx, game_action_rx) = mpsc::channel(GAME_ACTION_CAPACITY);
    let (game_create_tx, game_create_rx) = mpsc::channel(GAME_CREATE_CAPACITY);
    let (move_out_tx, _) = broadcast::channel(MOVE_OUT_CAPACITY);

    (
        BusHandles {
            move_in_tx,
            game_action_tx,
            game_create_tx,
            move_out_tx,
        },
        BusInbound {
            move_in_rx,
            game_action_rx,
            game_create_rx,
        },
    )
}
