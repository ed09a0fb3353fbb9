// Stamps the version string's `+N` suffix. CI sets AZW_BUILD_NUMBER; local
// builds read the BUILD_NUMBER file, else 0.
fn main() {
    println!("cargo:rerun-if-changed=BUILD_NUMBER");
    println!("cargo:rerun-if-env-changed=AZW_BUILD_NUMBER");

    let build_number = std::env::var("AZW_BUILD_NUMBER")
        .ok()
        .or_else(|| std::fs::read_to_string("BUILD_NUMBER").ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "0".to_string());

    println!("cargo:rustc-env=BUILD_NUMBER={build_number}");
}
