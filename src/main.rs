use rusty_intmap::IntMap;
use std::time::Instant;

fn main() {
    env_logger::init();

    const CAPACITY: usize = 500000;
    const SAMPLE_SIZE: usize = 1000000;
    const KEY_MAX: isize = 1 << 20;

    let samples: Vec<isize> = (0..SAMPLE_SIZE)
        .map(|_| rand::random::<isize>() % KEY_MAX)
        .collect();

    let mut m: IntMap<isize> = IntMap::new(CAPACITY, 0.875);

    let now: Instant = Instant::now();
    for &k in &samples {
        m.set(k, k);
    }
    let elapsed: u128 = now.elapsed().as_nanos();

    println!("Initial capacity {} actual capacity {}", CAPACITY, m.capacity());
    println!("Sampled keys {} distinct keys {}", SAMPLE_SIZE, m.size());
    println!("Load factor {}", m.size() as f64 / m.capacity() as f64);
    println!("Avg time to set {}", elapsed as f64 / SAMPLE_SIZE as f64);

    let now: Instant = Instant::now();
    for &k in &samples {
        if m.get(k).is_none() {
            panic!("Failed to get key {}", k);
        }
    }
    let elapsed: u128 = now.elapsed().as_nanos();
    println!("Avg time to get {}", elapsed as f64 / SAMPLE_SIZE as f64);

    benchmarking::warm_up();
    let result = benchmarking::measure_function(|measurer| {
        for &k in samples.iter().take(1000) {
            measurer.measure(|| m.get(k).copied());
        }
    });
    match result {
        Ok(r) => println!("Measured get {:?}", r.elapsed()),
        Err(e) => eprintln!("benchmark failed: {:?}", e),
    }

    let now: Instant = Instant::now();
    for &k in &samples {
        m.delete(k);
    }
    let elapsed: u128 = now.elapsed().as_nanos();
    println!("Remaining entries {}", m.size());
    println!("Avg time to delete {}", elapsed as f64 / SAMPLE_SIZE as f64);
}
