use std::{env, fs, path::PathBuf};

fn main() {
    // Stage the Pico 1 memory map where the linker can find it. Host builds
    // need no linker script, so every other target falls through.
    let target = env::var("TARGET").expect("TARGET is set by cargo");
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));

    if target.starts_with("thumbv6m") {
        let memory_x =
            fs::read_to_string("memory-pico1w.x").expect("Failed to read memory-pico1w.x");
        let dest = out_dir.join("memory.x");
        fs::write(&dest, memory_x).expect("Failed to write memory.x");
        println!("cargo:rustc-link-search={}", out_dir.display());
        println!("cargo:rerun-if-changed=memory-pico1w.x");
    }
}
