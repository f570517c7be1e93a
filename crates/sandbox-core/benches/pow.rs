use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sandbox_core::{block::genesis_block, pow::mine_block, Block, Difficulty, TimestampMode};

fn bench_pow(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let genesis = genesis_block("Genesis Block", 0, TimestampMode::Committed);
    let mut group = c.benchmark_group("mine_block");

    for zeros in 1..=4 {
        let difficulty = Difficulty::new(zeros).expect("supported difficulty");
        let block = Block::new(
            1,
            1_600_000_000,
            format!("alice pays bob {}", rng.gen_range(1..1_000)),
            genesis.hash.clone(),
            TimestampMode::Committed,
        );
        group.bench_with_input(BenchmarkId::from_parameter(zeros), &block, |b, block| {
            b.iter(|| {
                let mut candidate = block.clone();
                mine_block(&mut candidate, difficulty, TimestampMode::Committed)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pow);
criterion_main!(benches);
