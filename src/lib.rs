//! LitePlots - upload a CSV and build scatter, timeline, histogram, bar and pie charts.

pub mod charts;
pub mod config;
pub mod data;
pub mod error;
pub mod gui;
pub mod request;
