//! Folio CLI (for testing purposes only)
//! The main interface is the library and its WASM bindings.

fn main() {
    println!("Folio Pagination Core");
    println!("=====================");
    println!();
    println!("This is a library crate. To use it:");
    println!();
    println!("  1. Build WASM: wasm-pack build --target web");
    println!("  2. Drive a PaginatedEditingSession from the host UI");
    println!();
    println!("For testing the core library:");
    println!("  cargo test");
    println!("  cargo test --features parallel-export");
}
