//! Multiplayer game server: chess, ludo and word-search sessions with a
//! cash wallet, plus coin-funded single-player puzzles.

pub mod chess;
pub mod config;
pub mod http;
pub mod ludo;
pub mod puzzle;
pub mod session;
pub mod telemetry;
pub mod util;
pub mod wallet;
pub mod words;
pub mod ws;
