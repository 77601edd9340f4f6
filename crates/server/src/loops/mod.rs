//! Long-lived background roles (§5, §10.5): the garbage collector and the
//! realtime proximity monitor, each run under `spawn_supervised_loop` in
//! `main.rs`.

pub mod gc_loop;
pub mod monitor_loop;
