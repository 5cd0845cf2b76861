//! Clipboard table tests

mod paste;
