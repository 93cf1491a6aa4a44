//! CAPTCHA challenge text generation.
//!
//! Rendering the text into an image is the transport layer's business.

use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub trait ChallengeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Uniformly random uppercase alphanumeric challenges.
#[derive(Debug, Clone, Copy)]
pub struct RandomChallenge {
    pub length: usize,
}

impl Default for RandomChallenge {
    fn default() -> Self {
        Self { length: 5 }
    }
}

impl ChallengeGenerator for RandomChallenge {
    fn generate(&self) -> String {
        let mut rng = rand::rng();
        (0..self.length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_challenge_shape() {
        let text = RandomChallenge::default().generate();
        assert_eq!(text.len(), 5);
        assert!(text.bytes().all(|b| ALPHABET.contains(&b)));
    }
}
