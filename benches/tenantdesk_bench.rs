use criterion::{Criterion, criterion_group, criterion_main};
use std::process::Command;

const BINARY: &str = "./target/release/tenantdesk";

fn run(args: &[&str]) -> std::process::Output {
    Command::new(BINARY)
        .arg("--demo")
        .args(args)
        .output()
        .expect("Failed to execute tenantdesk")
}

fn benchmark_tenants_page(c: &mut Criterion) {
    c.bench_function("tenantdesk tenants", |b| b.iter(|| run(&["tenants", "--limit", "50"])));
}

fn benchmark_filtered_invoices(c: &mut Criterion) {
    c.bench_function("tenantdesk invoices filtered", |b| {
        b.iter(|| run(&["invoices", "--status", "overdue", "--sort", "amount", "--desc"]))
    });
}

fn benchmark_deep_page(c: &mut Criterion) {
    c.bench_function("tenantdesk activity deep page", |b| {
        b.iter(|| run(&["activity", "--page", "4", "--limit", "10", "--search", "tenant"]))
    });
}

fn benchmark_metrics(c: &mut Criterion) {
    c.bench_function("tenantdesk metrics", |b| b.iter(|| run(&["metrics"])));
}

criterion_group!(
    benches,
    benchmark_tenants_page,
    benchmark_filtered_invoices,
    benchmark_deep_page,
    benchmark_metrics
);
criterion_main!(benches);
