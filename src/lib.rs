//! A terminal Geoscape: a shaded, rotating orthographic globe with the
//! campaign's bases, craft and alien activity drawn over it.

pub mod app;
pub mod config;
pub mod data;
pub mod geo;
pub mod globe;
pub mod input;
pub mod palette;
pub mod ruleset;
pub mod surface;
pub mod ui;
pub mod world;
