fn main() {
    // option_env!() values are cached by cargo unless it is told to watch them.
    println!("cargo:rerun-if-env-changed=PARITY_BUILD_COMMIT");
    println!("cargo:rerun-if-env-changed=PARITY_DEFAULT_RUNNER_URL");
}
