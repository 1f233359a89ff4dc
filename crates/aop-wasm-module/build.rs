use aop_contracts::symbols;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    if std::env::var("CARGO_CFG_TARGET_ARCH").as_deref() != Ok("wasm32") {
        return;
    }
    // The loader calls the constructor hook during instantiation and expects the
    // function table next to `memory`; lld only exports either on request.
    println!(
        "cargo:rustc-cdylib-link-arg=--export={}",
        symbols::WASM_CALL_CTORS
    );
    println!("cargo:rustc-cdylib-link-arg=--export-table");
}
