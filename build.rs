use ::std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    const LINK: &str = "kernel.ld";
    const SELF: &str = "build.rs";

    println!("cargo:rerun-if-changed={}", LINK);
    println!("cargo:rerun-if-changed={}", SELF);

    // Host test builds link against the default target spec and must not
    // pick up the kernel's memory layout.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("none") {
        println!("cargo:rustc-link-arg=-T{}", LINK);
    }
    Ok(())
}
