//! Authorization message formats
//!
//! Holders prove wallet control by signing a short text that embeds the
//! current day index. The embedded day is what makes a signature expire:
//! a message signed yesterday no longer matches today's expected text.
//! The formats below are part of the public protocol and must not change,
//! or every client's signing prompt breaks.

use crate::day::EpochDay;

/// Text a holder signs to check in on the given day
pub fn check_in_message(day: EpochDay) -> String {
    format!("Sigil check-in: {day}")
}

/// Text a holder signs to claim accumulated rewards on the given day
pub fn claim_message(day: EpochDay) -> String {
    format!("Sigil claim rewards: {day}")
}
