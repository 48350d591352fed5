//! Game room (C6) and game manager (C7): the two subsystems spec.md leaves
//! to the concrete service, plus the in-process bus substitute, config, and
//! error taxonomy that wire everything the workspace's other crates expose
//! (`chess-core`, `wire`, `matchmaking`, `persistence`) into a runnable
//! service (spec §1 "THE CORE").

pub mod bus;
pub mod config;
pub mod error;
pub mod game_manager;
pub mod room;

pub use config::Config;
pub use error::RoomError;
pub use game_manager::GameManager;
pub use room::{Player, Room, TimeControl};
