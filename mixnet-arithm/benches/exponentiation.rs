use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use mixnet_arithm::arithm::group::{ECPGroup, ModPGroup};
use mixnet_arithm::arithm::{Backing, PGroup};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn setup_groups() -> Vec<(&'static str, PGroup)> {
    let mut rng = StdRng::seed_from_u64(1);
    let modp = ModPGroup::gen_safe_prime(512, &mut rng, 40).expect("generate safe prime group");
    let ec = ECPGroup::named("P-256").expect("named curve");
    vec![("modp-512", PGroup::ModP(modp)), ("P-256", PGroup::Ec(ec))]
}

fn bench_exp_prod(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let mut group = c.benchmark_group("exp_prod");

    for (label, pgroup) in setup_groups() {
        let ring = pgroup.pring();
        for size in [16usize, 256] {
            let bases = (0..size)
                .map(|_| pgroup.random_element(&mut rng, 40).expect("random base"))
                .collect::<Vec<_>>();
            let exponents = (0..size)
                .map(|_| ring.random_element(&mut rng, 40).expect("random exponent"))
                .collect::<Vec<_>>();

            group.bench_with_input(BenchmarkId::new(format!("{label}/simultaneous"), size), &size, |b, _| {
                b.iter(|| black_box(pgroup.exp_prod(&bases, &exponents).expect("exp_prod")))
            });
            group.bench_with_input(BenchmarkId::new(format!("{label}/naive"), size), &size, |b, _| {
                b.iter(|| black_box(pgroup.naive_exp_prod(&bases, &exponents).expect("naive_exp_prod")))
            });
        }
    }
    group.finish();
}

fn bench_fixed_base(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let mut group = c.benchmark_group("fixed_base_exp");

    for (label, pgroup) in setup_groups() {
        let basis = pgroup.random_element(&mut rng, 40).expect("random basis");
        let exponents = pgroup
            .pring()
            .random_element_array(&Backing::Memory, 128, &mut rng, 40)
            .expect("random exponents");
        let singles = exponents.elements().expect("exponents");

        group.bench_function(BenchmarkId::new(label, "table"), |b| {
            b.iter(|| black_box(basis.exp_array(&exponents).expect("exp_array")))
        });
        group.bench_function(BenchmarkId::new(label, "one_by_one"), |b| {
            b.iter(|| {
                for e in &singles {
                    black_box(basis.exp(e).expect("exp"));
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_exp_prod, bench_fixed_base);
criterion_main!(benches);
