//! Signing secret strength check
//!
//! Services call this at startup before building a [`crate::TokenCodec`]
//! so a guessable shared secret never reaches production.

const MIN_SECRET_LENGTH: usize = 32; // 256 bits minimum
const RECOMMENDED_SECRET_LENGTH: usize = 64; // 512 bits recommended

/// Secret strength classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretStrength {
    /// Refuse to start
    Weak,
    /// Start, but warn
    Acceptable,
    Strong,
}

impl SecretStrength {
    pub fn is_usable(self) -> bool {
        self != SecretStrength::Weak
    }
}

/// Classify a shared HS256 secret
///
/// **Criteria**:
/// - Minimum 32 bytes (256 bits), 64 recommended
/// - Shannon entropy of at least 4.0 bits/byte
/// - No runs of four repeated or ascending bytes
pub fn validate_secret_strength(secret: &[u8]) -> SecretStrength {
    if secret.len() < MIN_SECRET_LENGTH {
        return SecretStrength::Weak;
    }

    let entropy = shannon_entropy(secret);
    if entropy < 4.0 || has_obvious_patterns(secret) {
        return SecretStrength::Weak;
    }

    if secret.len() >= RECOMMENDED_SECRET_LENGTH && entropy >= 5.0 {
        SecretStrength::Strong
    } else {
        SecretStrength::Acceptable
    }
}

/// Bits per byte (0-8 scale)
fn shannon_entropy(data: &[u8]) -> f64 {
    let mut freq = [0u32; 256];
    for &byte in data {
        freq[byte as usize] += 1;
    }

    let len = data.len() as f64;
    freq.iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = f64::from(count) / len;
            -p * p.log2()
        })
        .sum()
}

fn has_obvious_patterns(data: &[u8]) -> bool {
    let run_of_four = |step: fn(u8, u8) -> bool| {
        let mut run = 1;
        for pair in data.windows(2) {
            if step(pair[0], pair[1]) {
                run += 1;
                if run >= 4 {
                    return true;
                }
            } else {
                run = 1;
            }
        }
        false
    };

    // "aaaa" / "1234"
    run_of_four(|a, b| a == b) || run_of_four(|a, b| b.wrapping_sub(a) == 1 && b > a)
}
