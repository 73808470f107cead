//! Sprint Poker - Real-time collaborative estimation server
//!
//! Rooms, participants, items, voting rounds, and votes, coordinated by a
//! single in-process estimation authority with live WebSocket fan-out.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
