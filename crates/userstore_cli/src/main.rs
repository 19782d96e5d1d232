//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `userstore_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("userstore_core ping={}", userstore_core::ping());
    println!("userstore_core version={}", userstore_core::core_version());
}
