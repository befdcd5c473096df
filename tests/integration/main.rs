//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the simulated header. All tests run on the host with no real
//! GPIO required.

mod layout_tests;
mod mock_yard;
mod yard_tests;
