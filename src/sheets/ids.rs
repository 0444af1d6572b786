// src/sheets/ids.rs

use chrono::{SecondsFormat, Utc};

const ID_PREFIX: &str = "ID_";
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Opaque record id: base-36 millisecond timestamp followed by base-36 random
/// bits. Good enough to tell rows apart; not a secret.
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let noise: u64 = rand::random();
    format!("{}{}{}", ID_PREFIX, to_base36(millis), to_base36(noise))
}

/// UTC timestamp in the `2024-01-31T12:00:00.000Z` form.
pub fn current_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize] as char);
        n /= 36;
    }
    digits.iter().rev().collect()
}
