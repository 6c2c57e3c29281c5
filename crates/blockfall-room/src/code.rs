//! Room code generation.

use blockfall_protocol::{RoomCode, CODE_ALPHABET, CODE_LEN};
use rand::Rng;

/// Draws a fresh four-character room code.
///
/// Each character is drawn independently and uniformly from
/// [`CODE_ALPHABET`]. This performs no collision check against existing
/// codes — the registry regenerates on collision.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    let raw: [u8; CODE_LEN] = std::array::from_fn(|_| {
        CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]
    });
    // Invariant: every byte comes straight from the alphabet.
    let text = std::str::from_utf8(&raw).expect("alphabet is ASCII");
    RoomCode::parse(text).expect("alphabet bytes form a valid code")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_codes_use_the_alphabet() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let code = generate_code(&mut rng);
            assert_eq!(code.as_str().len(), CODE_LEN);
            for b in code.as_str().bytes() {
                assert!(CODE_ALPHABET.contains(&b), "unexpected byte {b}");
            }
        }
    }

    #[test]
    fn test_generation_is_deterministic_per_seed() {
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        assert_eq!(generate_code(&mut a), generate_code(&mut b));
    }
}
