use rand::Rng;

const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const SUFFIX_LEN: usize = 6;

/// Builds `<PRODUCT>-<COLOR>-<SIZE>-<SUFFIX>`. The suffix mixes the current
/// millisecond clock with random characters; the `sku` column is UNIQUE so a
/// collision fails the surrounding transaction instead of aliasing rows.
pub fn generate_sku(product_id: i32, color_name: &str, size: &str) -> String {
    let mut rng = rand::thread_rng();
    let clock = chrono::Utc::now().timestamp_millis().rem_euclid(36_i64.pow(4));

    let random: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();

    format!(
        "P{}-{}-{}-{}{}",
        product_id,
        code_segment(color_name, 3),
        code_segment(size, 4),
        base36(clock),
        random
    )
}

fn code_segment(value: &str, max_len: usize) -> String {
    let code: String = value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(max_len)
        .collect::<String>()
        .to_ascii_uppercase();

    if code.is_empty() { "X".to_string() } else { code }
}

fn base36(mut value: i64) -> String {
    const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_encodes_product_color_and_size() {
        let sku = generate_sku(17, "Navy Blue", "xl");
        assert!(sku.starts_with("P17-NAV-XL-"), "unexpected sku {}", sku);
    }

    #[test]
    fn non_alphanumeric_labels_fall_back() {
        let sku = generate_sku(1, "★", "");
        assert!(sku.starts_with("P1-X-X-"));
    }

    #[test]
    fn consecutive_skus_differ() {
        let a = generate_sku(3, "Red", "M");
        let b = generate_sku(3, "Red", "M");
        assert_ne!(a, b);
    }

    #[test]
    fn base36_encodes() {
        assert_eq!(base36(0), "0");
        assert_eq!(base36(35), "Z");
        assert_eq!(base36(36), "10");
    }
}
