pub const USER_IDS: [&str; 6] = ["eabara", "jsmith", "sgarcia", "jbernard", "htanaka", "awalther"];
pub const PRODUCTS: [&str; 5] = ["book", "alarm clock", "t-shirts", "gift card", "batteries"];

pub const SOURCE_HEADER: (&str, &str) = ("source", "kafka_oauth");

/// Key and body for the message at `index`. Walks both lists at different strides
/// so consecutive messages pair different users and products.
pub fn sample_record(index: usize) -> (&'static str, &'static str) {
    (
        USER_IDS[index % USER_IDS.len()],
        PRODUCTS[(index * 3 + 1) % PRODUCTS.len()],
    )
}
