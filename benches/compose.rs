//! Benchmark for desired-state composition
//!
//! Covers config resolution alone and the full object set per Suggestion.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use std::sync::Arc;
use suggestion_composer::{
    AlgorithmSpec, Composer, ComposerConfig, ConfigResolver, ResumePolicy, Suggestion,
    SuggestionSpec,
};

const KATIB_CONFIG: &str = r#"{
    "random": {
        "image": "docker.io/kubeflowkatib/suggestion-hyperopt",
        "imagePullPolicy": "Always",
        "resource": {
            "limits": {"cpu": "500m", "memory": "100Mi"},
            "requests": {"cpu": "50m", "memory": "10Mi"}
        }
    },
    "tpe": {
        "image": "docker.io/kubeflowkatib/suggestion-hyperopt"
    }
}"#;

fn store() -> BTreeMap<String, String> {
    BTreeMap::from([("suggestion".to_string(), KATIB_CONFIG.to_string())])
}

fn suggestion(i: u64) -> Suggestion {
    Suggestion {
        metadata: ObjectMeta {
            name: Some(format!("experiment-{}", i)),
            namespace: Some("kubeflow".into()),
            uid: Some(format!("uid-{}", i)),
            ..Default::default()
        },
        spec: SuggestionSpec {
            algorithm: AlgorithmSpec {
                algorithm_name: "random".into(),
                algorithm_settings: vec![],
            },
            requests: 3,
            resume_policy: ResumePolicy::FromVolume,
        },
        status: None,
    }
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    group.throughput(Throughput::Elements(1));

    let resolver = ConfigResolver::new(Arc::new(store()));
    group.bench_function("resolve_config", |b| {
        b.iter(|| {
            let _ = resolver.resolve(black_box("random"));
        });
    });

    group.finish();
}

fn bench_desired_resources(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    group.throughput(Throughput::Elements(1));

    let composer = Composer::new(ComposerConfig::default(), Arc::new(store()));
    group.bench_function("desired_resources", |b| {
        let mut counter = 0u64;
        b.iter(|| {
            counter += 1;
            let _ = composer.desired_resources(black_box(&suggestion(counter)));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_desired_resources);
criterion_main!(benches);
