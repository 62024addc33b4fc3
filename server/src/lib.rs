//! Billiards engine and local table host.
//!
//! The core (`table` through `match_state`) is synchronous and owns no I/O;
//! the host modules drive one hot-seat table from a tokio game loop.

pub use billiards_shared::vec2;

pub mod aim;
pub mod audio;
pub mod ball;
pub mod config;
pub mod game_loop;
pub mod match_state;
pub mod physics;
pub mod player;
pub mod protocol;
pub mod round;
pub mod rules;
pub mod state;
pub mod store;
pub mod table;
pub mod timestep;
pub mod ws;
