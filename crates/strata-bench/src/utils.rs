//! Benchmark utilities and helpers.

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use strata_exec::{Value, View};

/// Generates random string data for benchmarks.
pub fn random_string(rng: &mut StdRng, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generates a `(k, v)` view with `count` rows and keys drawn from
/// `0..key_range`.
pub fn generate_keyed_view(name: &str, count: usize, key_range: i64, seed: u64) -> View {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = (0..count)
        .map(|_| {
            vec![
                Value::int(rng.gen_range(0..key_range)),
                Value::string(random_string(&mut rng, 8)),
            ]
        })
        .collect();
    // Every row has two cells, matching the header.
    View::from_values(name, &["k", "v"], rows).unwrap_or_default()
}

/// Generates random user rows `(id, name, age)` for cursor benchmarks.
pub fn generate_user_view(count: usize) -> View {
    let mut rng = StdRng::seed_from_u64(42);
    let names = [
        "Alice", "Bob", "Charlie", "Diana", "Eve", "Frank", "Grace", "Henry",
    ];

    let rows = (0..count as i64)
        .map(|i| {
            let name_idx = rng.gen_range(0..names.len());
            let suffix: u32 = rng.gen_range(0..10000);
            vec![
                Value::int(i + 1),
                Value::string(format!("{}_{}", names[name_idx], suffix)),
                Value::int(rng.gen_range(18..80)),
            ]
        })
        .collect();
    View::from_values("users", &["id", "name", "age"], rows).unwrap_or_default()
}
