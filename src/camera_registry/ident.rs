//! Derived camera identifiers: path-safe names and generated MACs

use rand::Rng;

/// Derive a filesystem/path-safe identifier from a display name.
///
/// Lowercase letters, digits and underscores only; runs of other
/// characters collapse to a single underscore. Deterministic for a given
/// display name. When the result collides with an already-taken name a
/// numeric suffix is appended.
pub fn derive_path_name(display_name: &str, taken: &[String]) -> String {
    let mut base = String::with_capacity(display_name.len());
    let mut last_underscore = true;
    for c in display_name.chars() {
        if c.is_ascii_alphanumeric() {
            base.push(c.to_ascii_lowercase());
            last_underscore = false;
        } else if !last_underscore {
            base.push('_');
            last_underscore = true;
        }
    }
    let base = base.trim_matches('_').to_string();
    let base = if base.is_empty() {
        "camera".to_string()
    } else {
        base
    };

    if !taken.iter().any(|t| t == &base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", base, n);
        if !taken.iter().any(|t| t == &candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Generate a locally-administered unicast MAC address.
///
/// The `a2` prefix sets the locally-administered bit and clears the
/// multicast bit, so the address never clashes with vendor OUI space.
pub fn generate_mac() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 5] = rng.gen();
    format!(
        "a2:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4]
    )
}
