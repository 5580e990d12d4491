//! Build script for mpv-object
//!
//! This script handles:
//! - libmpv library detection when the `libmpv` feature is enabled
//! - Platform-specific link setup

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=MPV_DIR");

    // The mock backend needs nothing from the system
    if env::var_os("CARGO_FEATURE_LIBMPV").is_none() {
        return;
    }

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();

    match configure_libmpv(&target_os) {
        Ok(()) => println!("libmpv configuration successful"),
        Err(e) => {
            println!("cargo:warning=libmpv configuration failed: {}", e);
            println!("cargo:warning=Falling back to linking `mpv` from the default search path");
            println!("cargo:rustc-link-lib=mpv");
        }
    }
}

/// Configure libmpv linkage
fn configure_libmpv(target_os: &str) -> Result<(), Box<dyn std::error::Error>> {
    // Check environment variable first so packagers can pin a build
    if let Ok(mpv_dir) = env::var("MPV_DIR") {
        let lib_path = PathBuf::from(mpv_dir).join("lib");
        if !lib_path.exists() {
            return Err(format!("MPV_DIR has no lib directory: {}", lib_path.display()).into());
        }
        println!("cargo:rustc-link-search=native={}", lib_path.display());
        println!("cargo:rustc-link-lib=mpv");
        if target_os == "windows" {
            // Some Windows builds keep the import library next to libmpv-2.dll
            println!("cargo:rustc-link-search=native={}", lib_path.with_file_name("bin").display());
        }
        return Ok(());
    }

    // Check if libmpv is available via pkg-config
    pkg_config::Config::new()
        .atleast_version("1.101")
        .probe("mpv")?;
    println!("Found libmpv via pkg-config");

    Ok(())
}
