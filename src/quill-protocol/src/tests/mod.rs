//! Tests for the protocol crate.
