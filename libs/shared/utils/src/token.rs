use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `len` random lower-case base36 characters.
pub fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// `<prefix>-<unix millis>-<random base36 suffix>`.
///
/// The timestamp keeps tokens ordered and practically unique; the suffix
/// makes them unguessable enough to be typed in as one-time codes.
pub fn timestamped_token(prefix: &str, unix_millis: i64, suffix_len: usize) -> String {
    format!("{}-{}-{}", prefix, unix_millis, random_base36(suffix_len))
}
