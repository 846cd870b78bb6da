use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::error;

/// Number of trailing id characters that feed the slot.
pub const SLOT_HEX_DIGITS: usize = 6;
/// Slot width in bits. Six hex digits fill it exactly.
pub const SLOT_BITS: u32 = 24;
pub const SLOT_MASK: u32 = (1 << SLOT_BITS) - 1;

/// Local notification identifier derived from a reminder id.
///
/// The OS addresses pending notifications by this integer; scheduling twice
/// with the same slot replaces the earlier entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slot(pub u32);

impl Slot {
    pub fn get(self) -> u32 {
        self.0
    }

    /// Signed view for platforms whose notification ids are `i32`.
    /// Always non-negative because the slot never exceeds 24 bits.
    pub fn as_i32(self) -> i32 {
        (self.0 & SLOT_MASK) as i32
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Map a server reminder id onto its local notification slot.
///
/// Pure: the result depends on `id` alone, so the same reminder lands on the
/// same slot across calls and restarts. Distinct ids sharing their last six
/// hex digits share a slot.
///
/// Server ids always end in six hex digits. Anything else is a programming
/// error: debug builds panic, release builds log and fold non-hex characters
/// as zero so the call still returns a stable slot.
pub fn slot_of(id: &str) -> Slot {
    let tail_start = id
        .char_indices()
        .rev()
        .nth(SLOT_HEX_DIGITS - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let tail = &id[tail_start..];

    let well_formed =
        tail.chars().count() == SLOT_HEX_DIGITS && tail.chars().all(|c| c.is_ascii_hexdigit());
    if !well_formed {
        error!(reminder_id = %id, "reminder id does not end in {SLOT_HEX_DIGITS} hex digits");
        debug_assert!(well_formed, "malformed reminder id {id:?}");
    }

    let value = tail
        .chars()
        .fold(0u32, |acc, c| (acc << 4) | c.to_digit(16).unwrap_or(0));
    Slot(value & SLOT_MASK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_last_six_hex_digits() {
        // "...456789ab" → tail "6789ab"
        assert_eq!(slot_of("64fae2b1d9a0c123456789ab"), Slot(0x6789ab));
        assert_eq!(slot_of("64fae2b1d9a0c123456789ab").get(), 6_785_451);
    }

    #[test]
    fn stable_across_calls() {
        let id = "65a1b2c3d4e5f60718293a4b";
        let first = slot_of(id);
        for _ in 0..100 {
            assert_eq!(slot_of(id), first);
        }
        assert_eq!(slot_of(&id.to_string()), first);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(slot_of("000000ABCDEF"), slot_of("000000abcdef"));
    }

    #[test]
    fn exactly_six_characters() {
        assert_eq!(slot_of("ffffff"), Slot(0xff_ffff));
        assert_eq!(slot_of("000000"), Slot(0));
    }

    #[test]
    fn fits_in_24_bits_and_i32() {
        let max = slot_of("ffffffffffffffffffffffff");
        assert_eq!(max.get(), SLOT_MASK);
        assert!(max.as_i32() > 0);
        assert_eq!(max.as_i32() as u32, max.get());
    }

    #[test]
    fn distinct_ids_sharing_a_tail_collide() {
        let a = "64fae2b1d9a0c1aaaa123456";
        let b = "7000000000000bbbbb123456";
        assert_ne!(a, b);
        assert_eq!(slot_of(a), slot_of(b));
    }

    #[test]
    fn distinct_tails_do_not_collide() {
        assert_ne!(slot_of("64fae2b1d9a0c123456789ab"), slot_of("64fae2b1d9a0c123456789ac"));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "malformed reminder id")]
    fn short_id_fails_loudly_in_debug() {
        slot_of("abc");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "malformed reminder id")]
    fn non_hex_tail_fails_loudly_in_debug() {
        slot_of("reminder-xyz");
    }
}
