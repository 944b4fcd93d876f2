//! Infrastructure layer - repository adapters, services and logging

pub mod logging;
pub mod storage;
pub mod wine;
