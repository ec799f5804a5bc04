//! Order numbers.

use std::fmt::Debug;

use rand::Rng;

pub const ORDER_NUMBER_PREFIX: &str = "ORD-";

/// Insert attempts before a collision streak becomes an error.
pub const MAX_ORDER_NUMBER_ATTEMPTS: usize = 5;

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
const SUFFIX_LEN: usize = 12;

/// `ORD-` followed by twelve random base-32 characters.
pub fn generate_order_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut number = String::with_capacity(ORDER_NUMBER_PREFIX.len() + SUFFIX_LEN);

    number.push_str(ORDER_NUMBER_PREFIX);

    for _ in 0..SUFFIX_LEN {
        number.push(char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]));
    }

    number
}

/// Where checkout draws candidate order numbers from.
pub trait OrderNumberSource: Debug + Send + Sync {
    fn next_number(&self) -> String;
}

/// Draws from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOrderNumbers;

impl OrderNumberSource for RandomOrderNumbers {
    fn next_number(&self) -> String {
        generate_order_number(&mut rand::thread_rng())
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn numbers_have_prefix_and_base32_suffix() {
        let number = generate_order_number(&mut StdRng::seed_from_u64(7));
        let suffix = number.strip_prefix(ORDER_NUMBER_PREFIX).expect("prefixed");

        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.bytes().all(|byte| ALPHABET.contains(&byte)));
    }

    #[test]
    fn different_draws_differ() {
        let mut rng = StdRng::seed_from_u64(42);

        assert_ne!(generate_order_number(&mut rng), generate_order_number(&mut rng));
    }

    #[test]
    fn random_source_produces_well_formed_numbers() {
        let number = RandomOrderNumbers.next_number();

        assert!(number.starts_with(ORDER_NUMBER_PREFIX));
        assert_eq!(number.len(), ORDER_NUMBER_PREFIX.len() + SUFFIX_LEN);
    }
}
