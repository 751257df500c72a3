//! Services Module
//!
//! Repository 위의 부가 기능
//!
//! # Services
//! - `export`: CSV 내보내기

pub mod export;

pub use export::{export_filename, render_csv};
