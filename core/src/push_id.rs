//! Child ids in the realtime-database push format: 8 characters of timestamp
//! followed by 12 random characters, so ids sort by creation time.

use chrono::Utc;
use rand::Rng;

const ALPHABET: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

#[derive(Debug, Default)]
pub struct PushIdGenerator {
    last_millis: Option<i64>,
    last_random: [u8; RANDOM_CHARS],
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> String {
        self.next_id_at(Utc::now().timestamp_millis())
    }

    /// Ids generated in the same millisecond reuse the random tail plus one, so
    /// they still sort in generation order.
    pub fn next_id_at(&mut self, millis: i64) -> String {
        if self.last_millis == Some(millis) {
            for digit in self.last_random.iter_mut().rev() {
                if *digit == 63 {
                    *digit = 0;
                } else {
                    *digit += 1;
                    break;
                }
            }
        } else {
            let mut rng = rand::thread_rng();
            for digit in self.last_random.iter_mut() {
                *digit = rng.gen_range(0..64);
            }
            self.last_millis = Some(millis);
        }

        let mut out = [0u8; TIME_CHARS + RANDOM_CHARS];
        let mut now = millis.max(0);
        for slot in out[..TIME_CHARS].iter_mut().rev() {
            *slot = ALPHABET[(now % 64) as usize];
            now /= 64;
        }
        for (slot, digit) in out[TIME_CHARS..].iter_mut().zip(self.last_random) {
            *slot = ALPHABET[usize::from(digit)];
        }
        out.iter().map(|&b| char::from(b)).collect()
    }
}
