fn main() {
    println!("cargo:rerun-if-changed=native/probe.c");

    // The archive is bundled into every build of the library, but only the
    // unit tests reference its symbols
    cc::Build::new()
        .file("native/probe.c")
        .warnings(true)
        .flag_if_supported("-std=c99")
        .compile("native_marshal_probe");
}
