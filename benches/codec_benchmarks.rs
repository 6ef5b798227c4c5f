use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use wharf::api::*;

fn sample_filters(keys: usize) -> Filters {
    let mut filters = Filters::new();
    for k in 0..keys {
        for v in 0..4 {
            filters.add(format!("label{k}"), format!("com.example.tier=value-{v}"));
        }
    }
    filters
}

fn filters_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");

    for keys in [1, 8, 64].iter() {
        let filters = sample_filters(*keys);
        let encoded = filters.encode();
        group.throughput(Throughput::Bytes(encoded.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", keys), &filters, |b, filters| {
            b.iter(|| black_box(filters.encode()));
        });
        group.bench_with_input(BenchmarkId::new("decode", keys), &encoded, |b, encoded| {
            b.iter(|| black_box(Filters::decode(encoded).unwrap()));
        });
    }
    group.finish();
}

fn request_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    let list = ContainerListOptions {
        all: Some(true),
        limit: Some(20),
        filters: sample_filters(4),
        ..Default::default()
    };
    group.bench_function("container_list", |b| {
        b.iter(|| black_box(list.to_request().unwrap()));
    });

    let mut host = HostConfig::default();
    host.publish(Port::tcp(80), None, 8080);
    let config = ContainerConfig::new("nginx:1.25")
        .with_cmd(vec!["nginx".to_string(), "-g".to_string(), "daemon off;".to_string()])
        .with_env("MODE", "prod")
        .with_exposed_port(Port::tcp(80));
    let create = ContainerCreateOptions::new(
        ContainerCreateConfig::new(config.clone())
            .with_name("web-1")
            .with_host_config(host),
    );
    group.bench_function("container_create", |b| {
        b.iter(|| black_box(create.to_request().unwrap()));
    });

    group.bench_function("config_digest", |b| {
        b.iter(|| black_box(config.digest().unwrap()));
    });
    group.finish();
}

fn credential_encoding(c: &mut Criterion) {
    let auth = AuthConfig::basic("alice", "correct horse battery staple", "registry.example.com");
    c.bench_function("registry_auth_encode", |b| {
        b.iter(|| black_box(auth.encode().unwrap()));
    });
}

criterion_group!(benches, filters_codec, request_rendering, credential_encoding);
criterion_main!(benches);
