use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

fn main() {
    let os_target = env::var("CARGO_CFG_TARGET_OS").unwrap();
    let simulation = os_target != "none";

    if !simulation {
        linker_script_plumbing();
    }
}

fn linker_script_plumbing() {
    // Put the memory map somewhere the linker can find it
    let out = &PathBuf::from(env::var_os("OUT_DIR").unwrap());
    File::create(out.join("memory.x"))
        .unwrap()
        .write_all(include_bytes!("memory.x"))
        .unwrap();
    println!("cargo:rustc-link-search={}", out.display());

    println!("cargo:rerun-if-changed=memory.x");
}
