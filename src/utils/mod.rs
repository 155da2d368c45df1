//! Helpers shared by the experiment binary, the demos and the tests.
//!
//! - **`benchmarks`**: synthetic full-order systems with known structure (a
//!   mass–spring–damper chain) or reproducible random data (a seeded random
//!   stable system).

pub mod benchmarks;
