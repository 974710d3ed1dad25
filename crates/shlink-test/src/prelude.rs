//! Prelude module - commonly used types for convenient import.
//!
//! Use `use shlink_test::prelude::*;` in test modules.

pub use crate::{ManualClock, OwnedPackage, TestClient, TestHarness};

pub use crate::fixtures::{
    TEST_EPOCH, TEST_PUBLIC_URL, init_test_tracing, pin_share_body, share_body, test_settings,
};
