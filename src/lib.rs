//! Surgical editing of the LMKD and Chimera property blocks in Android
//! `.mk` files, plus the Perforce bringup and tuning workflows built on it.

pub mod config;
pub mod editor;
pub mod logging;
pub mod props;
pub mod report;
pub mod vcs;
pub mod workflow;
