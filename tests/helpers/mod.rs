#![allow(unused_imports, dead_code)]
pub mod clock;
pub mod lead_helpers;
pub mod test_db;

pub use clock::*;
pub use lead_helpers::*;
pub use test_db::*;
