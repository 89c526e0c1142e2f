use bibgraph_core::{vocab, Graph, Iri, Literal, Term, Triple};
use bibgraph_store::GraphStore;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn fragment(resources: usize) -> Graph {
    let mut graph = Graph::new();
    for n in 0..resources {
        let subject = Term::iri(format!("http://example.org/w/{}", n));
        graph.insert(Triple::new(
            subject.clone(),
            vocab::rdf_type(),
            Term::Iri(vocab::bf_work()),
        ));
        graph.insert(Triple::new(
            subject,
            Iri::new(format!("{}title", vocab::BF)),
            Term::Literal(Literal::plain(format!("Work {}", n))),
        ));
    }
    graph
}

fn bench_merge(c: &mut Criterion) {
    let graph = fragment(1_000);
    c.bench_function("merge_1k_resources", |b| {
        b.iter(|| {
            let mut store = GraphStore::new();
            store.merge(black_box(graph.clone()))
        })
    });
}

fn bench_summary(c: &mut Criterion) {
    let mut store = GraphStore::new();
    store.merge(fragment(1_000));
    c.bench_function("summary_2k_triples", |b| b.iter(|| black_box(store.summary())));
}

criterion_group!(benches, bench_merge, bench_summary);
criterion_main!(benches);
