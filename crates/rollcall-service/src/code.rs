//! Session code generation.

use rand::Rng;

/// Prefix carried by every session code.
pub const CODE_PREFIX: &str = "SES-";

/// Suffix length in base-36 characters. Ten characters carry just over
/// 51 bits of entropy; collisions are still settled by the store's
/// unique insert, never assumed away here.
const CODE_SUFFIX_LEN: usize = 10;

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a fresh session code: `SES-` plus a random upper-case
/// base-36 suffix.
pub fn generate_session_code() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..CODE_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("{CODE_PREFIX}{suffix}")
}
