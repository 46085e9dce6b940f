use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Otimização de linking para Linux (remove símbolos de debug do binário final).
    // Só em release: os binários de teste precisam dos símbolos para backtraces.
    let release = env::var("PROFILE").map(|p| p == "release").unwrap_or(false);
    let linux = env::var("CARGO_CFG_TARGET_OS").map(|os| os == "linux").unwrap_or(false);

    if release && linux {
        println!("cargo:rustc-link-arg-cdylib=-Wl,--strip-all");
    }
}
