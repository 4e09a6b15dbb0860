//! Flutter-facing FFI surface for the HAYAI Notes core.

pub mod api;
