fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Host-side test builds run with `--no-default-features`; only the
    // firmware build needs the ESP-IDF environment exported.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
