//! Test suites for the bridge bootstrap, lifecycle, and command surface.

mod support;
