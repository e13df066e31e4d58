//! Tests for conversions driven end to end.

mod support;
