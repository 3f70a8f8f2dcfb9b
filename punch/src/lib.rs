//! Punch machine application logic.
//!
//! Nothing here touches hardware directly, so it all runs in host tests; the
//! `punch` binary wires it to the board.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod controls;
pub mod game;
pub mod idle;
pub mod score;
