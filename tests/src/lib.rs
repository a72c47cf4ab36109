//! # Zeebe Bridge Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs           # Publisher → engine → Subscriber round trips
//!     └── property_tests.rs  # Marshalling properties
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p bridge-tests
//!
//! # By category
//! cargo test -p bridge-tests integration::flows
//! cargo test -p bridge-tests integration::property_tests
//! ```

pub mod integration;
