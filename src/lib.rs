//! Galleria - backend for an online art marketplace and community
//!
//! Artists list artworks for sale; community members buy them through a
//! hosted payment provider, discuss them, follow artists, exchange direct
//! messages, and attend physical and virtual exhibitions.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
