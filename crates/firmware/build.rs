use std::env;

/// Forward a build-time setting to the crate, or its default.
fn forward(name: &str, default: &str, secret: bool) {
    match env::var(name) {
        Ok(value) => {
            println!("cargo:rustc-env={}={}", name, value);
            if secret {
                println!("cargo:warning=Using {} from environment (hidden)", name);
            } else {
                println!("cargo:warning=Using {} from environment: {}", name, value);
            }
        }
        Err(_) => println!("cargo:rustc-env={}={}", name, default),
    }
    println!("cargo:rerun-if-env-changed={}", name);
}

fn main() {
    // Modem defaults; ModemParams::from_env() parses these with fallbacks
    forward("WIFI_SSID", "", false);
    forward("WIFI_PASSWORD", "", true);
    forward("MODEM_SERVER_PORT", "333", false);
    forward("MODEM_TIMEOUT_MS", "2000", false);
}
