#![forbid(unsafe_code)]

use lazy_static::lazy_static;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

// ***************************************************************************
//                                Constants
// ***************************************************************************
// Capacity of each memoization cache.  Results are pure functions of the
// input, so a bounded LRU map shared across requests is safe.
const CACHE_CAPACITY: usize = 1000;

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
lazy_static! {
    static ref DIGIT_SUM_CACHE: Mutex<LruCache<i64, u64>> = new_cache();
    static ref ARMSTRONG_CACHE: Mutex<LruCache<i64, bool>> = new_cache();
    static ref PRIME_CACHE: Mutex<LruCache<i64, bool>> = new_cache();
    static ref PERFECT_CACHE: Mutex<LruCache<i64, bool>> = new_cache();
}

fn new_cache<V>() -> Mutex<LruCache<i64, V>> {
    // CACHE_CAPACITY is a non-zero constant.
    let capacity = NonZeroUsize::new(CACHE_CAPACITY)
        .unwrap_or(NonZeroUsize::MIN);
    Mutex::new(LruCache::new(capacity))
}

// ---------------------------------------------------------------------------
// cached:
// ---------------------------------------------------------------------------
/** Front a pure function with one of the LRU caches.  A poisoned lock just
 * means we compute without the cache; these functions are total and never
 * fail on any input.
 */
fn cached<V: Copy>(cache: &Mutex<LruCache<i64, V>>, n: i64, compute: fn(i64) -> V) -> V {
    if let Ok(mut guard) = cache.lock() {
        if let Some(v) = guard.get(&n) {
            return *v;
        }
    }
    let v = compute(n);
    if let Ok(mut guard) = cache.lock() {
        guard.put(n, v);
    }
    v
}

// ***************************************************************************
//                              Public Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// digit_sum:
// ---------------------------------------------------------------------------
/** Sum of the decimal digits of |n|.  The sign is ignored, so
 * digit_sum(-371) == digit_sum(371) == 11.
 */
pub fn digit_sum(n: i64) -> u64 {
    cached(&DIGIT_SUM_CACHE, n, compute_digit_sum)
}

// ---------------------------------------------------------------------------
// is_armstrong:
// ---------------------------------------------------------------------------
/** True iff n equals the sum of the decimal digits of |n| each raised to the
 * power of the digit count.  The power sum is non-negative, so this never
 * holds for negative n.
 */
pub fn is_armstrong(n: i64) -> bool {
    cached(&ARMSTRONG_CACHE, n, compute_is_armstrong)
}

// ---------------------------------------------------------------------------
// is_prime:
// ---------------------------------------------------------------------------
/** Deterministic trial-division primality test.  Candidates of the form
 * 6k±1 are checked up to sqrt(n).  O(sqrt(n)) but exact for every i64,
 * which beats a probabilistic test at the small magnitudes this service
 * actually sees.
 */
pub fn is_prime(n: i64) -> bool {
    cached(&PRIME_CACHE, n, compute_is_prime)
}

// ---------------------------------------------------------------------------
// is_perfect:
// ---------------------------------------------------------------------------
/** True iff n > 1 and n equals the sum of its proper divisors. */
pub fn is_perfect(n: i64) -> bool {
    cached(&PERFECT_CACHE, n, compute_is_perfect)
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// compute_digit_sum:
// ---------------------------------------------------------------------------
fn compute_digit_sum(n: i64) -> u64 {
    let mut m = n.unsigned_abs();
    let mut sum = 0;
    loop {
        sum += m % 10;
        m /= 10;
        if m == 0 {
            break;
        }
    }
    sum
}

// ---------------------------------------------------------------------------
// compute_is_armstrong:
// ---------------------------------------------------------------------------
fn compute_is_armstrong(n: i64) -> bool {
    let digits = decimal_digits(n.unsigned_abs());
    let k = digits.len() as u32;

    // Up to 19 digits each contributing at most 9^19, well within u128.
    let power_sum: u128 = digits.iter().map(|&d| (d as u128).pow(k)).sum();
    n >= 0 && n as u128 == power_sum
}

// ---------------------------------------------------------------------------
// compute_is_prime:
// ---------------------------------------------------------------------------
fn compute_is_prime(n: i64) -> bool {
    if n <= 1 {
        return false;
    }
    if n <= 3 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let m = n as u64;
    let mut i: u64 = 5;
    while i * i <= m {
        if m % i == 0 || m % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

// ---------------------------------------------------------------------------
// compute_is_perfect:
// ---------------------------------------------------------------------------
fn compute_is_perfect(n: i64) -> bool {
    if n <= 1 {
        return false;
    }
    let m = n as u64;

    // 1 is a proper divisor of every n > 1; each divisor pair (i, n/i) found
    // below sqrt(n) contributes both members.  Accumulate wide so the sum
    // cannot wrap for any i64.
    let mut divisor_sum: u128 = 1;
    let mut i: u64 = 2;
    while i * i <= m {
        if m % i == 0 {
            divisor_sum += i as u128;
            let pair = m / i;
            if pair != i {
                divisor_sum += pair as u128;
            }
        }
        i += 1;
    }
    divisor_sum == m as u128
}

// ---------------------------------------------------------------------------
// decimal_digits:
// ---------------------------------------------------------------------------
/** Base-10 digits of m, least significant first.  Order does not matter to
 * the callers; every digit participates symmetrically.
 */
fn decimal_digits(m: u64) -> Vec<u8> {
    let mut m = m;
    let mut digits = Vec::with_capacity(20);
    loop {
        digits.push((m % 10) as u8);
        m /= 10;
        if m == 0 {
            break;
        }
    }
    digits
}
