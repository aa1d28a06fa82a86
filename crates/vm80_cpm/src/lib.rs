//! Minimal CP/M machine built around the vm80 CPU core.
//!
//! This crate is the host side of the core's bus contract: a flat 64 KiB
//! memory, a console-oriented IO back-end, a `.COM` image loader, and a run
//! loop that shims the two BDOS console calls the classic CPU diagnostic
//! binaries use. It is enough to run TEST.COM, CPUTEST.COM, 8080PRE.COM and
//! the full instruction-set exerciser to completion.

pub mod machine;

pub use machine::{
    CpmMachine, ConsoleIo, FlatMemory, LoadError, RunConfig, RunOutcome, BDOS_ENTRY, TPA_START,
};
