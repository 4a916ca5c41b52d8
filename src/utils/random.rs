use rand::{RngCore, rng};

/// Fill a buffer of `len` bytes from the thread-local generator
pub fn generate_random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rng().fill_bytes(&mut bytes);
    bytes
}
