//! # Block Icon Viewer Entry Point
//!
//! Opens a window showing every block of the table as an isometric icon in an
//! inventory grid.
//!
//! For web applications, see the `run_web()` function in the library.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release
//! ```

fn main() {
    #[cfg(not(target_family = "wasm"))]
    block_icons::run();
}
