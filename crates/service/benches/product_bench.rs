use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use service::product::domain::CreateProductInput;
use service::product::repository::mock::MockProductRepository;
use service::product::ProductService;

fn bench_reduce_stock(c: &mut Criterion) {
    let repo = Arc::new(MockProductRepository::default());
    let svc = ProductService::new(repo);

    // seed outside of the measured loop
    let rt = tokio::runtime::Runtime::new().unwrap();
    let product = rt
        .block_on(svc.create(CreateProductInput {
            name: "Bench".into(),
            description: "Benchmark product".into(),
            price: 1.0,
            stock: i32::MAX,
        }))
        .unwrap();

    c.bench_function("product_reduce_stock", |b| {
        b.iter(|| {
            rt.block_on(svc.reduce_stock(product.id, 1)).unwrap();
        });
    });

    c.bench_function("product_create", |b| {
        b.iter(|| {
            let _ = rt
                .block_on(svc.create(CreateProductInput {
                    name: "Bench".into(),
                    description: "Benchmark product".into(),
                    price: 2.5,
                    stock: 10,
                }))
                .unwrap();
        });
    });
}

criterion_group!(benches, bench_reduce_stock);
criterion_main!(benches);
