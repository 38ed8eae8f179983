// Role registry benchmarks for Atrium.
//
// Covers single membership lookups, single grants, and validate-then-apply
// batch grants at various sizes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use atrium_protocol::access::{Role, RoleRegistry};
use atrium_protocol::Address;

/// An initialized registry and its deployer.
fn setup_registry() -> (RoleRegistry, Address) {
    let deployer = Address::derive("deployer");
    let mut registry = RoleRegistry::new();
    registry.initialize(deployer).unwrap();
    (registry, deployer)
}

fn accounts(n: usize) -> Vec<Address> {
    (0..n).map(|i| Address::derive(&format!("account-{i}"))).collect()
}

fn bench_has_role(c: &mut Criterion) {
    let (mut registry, deployer) = setup_registry();
    for account in accounts(1_000) {
        registry.grant_role(&deployer, Role::Greenlisted, account).unwrap();
    }
    let probe = Address::derive("account-500");

    c.bench_function("registry/has_role", |b| {
        b.iter(|| registry.has_role(Role::Greenlisted, &probe));
    });
}

fn bench_grant_role(c: &mut Criterion) {
    let account = Address::derive("alice");

    c.bench_function("registry/grant_role", |b| {
        b.iter_with_setup(setup_registry, |(mut registry, deployer)| {
            registry.grant_role(&deployer, Role::Greenlisted, account).unwrap();
        });
    });
}

fn bench_grant_role_multiple(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry/grant_role_multiple");

    for batch_size in [1, 10, 100, 1_000] {
        let targets = accounts(batch_size);
        let roles = vec![Role::Greenlisted; batch_size];

        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &batch_size,
            |b, _| {
                b.iter_with_setup(setup_registry, |(mut registry, deployer)| {
                    registry
                        .grant_role_multiple(&deployer, &roles, &targets)
                        .unwrap();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_has_role,
    bench_grant_role,
    bench_grant_role_multiple,
);
criterion_main!(benches);
