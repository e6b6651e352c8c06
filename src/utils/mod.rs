use rand::{distributions::Alphanumeric, Rng};
use std::ops::Range;

pub fn generate_random_ascii_string(range_size: Range<usize>) -> String {
    let string_size = rand::thread_rng().gen_range(range_size);
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(string_size)
        .map(char::from)
        .collect()
}
