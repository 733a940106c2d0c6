pub mod manager;
pub mod memory;
pub mod override_store;
pub mod traits;

// Native-only backends
#[cfg(not(target_arch = "wasm32"))]
pub mod file;
