//! Benchmarks for the graph codec and its wire format.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use asset_kg::codec::{NodeGraph, Target, TripleSet, deserialize, serialize};
use asset_kg::model::{ClassRegistry, Node, NodeClass};

/// An asset with `n` streaming properties sharing one connection.
fn plant_asset(n: usize) -> Node {
    let mut broker = Node::with_uri(NodeClass::Connection, "http://bench.org/broker").unwrap();
    broker.set("type", "MQTT").unwrap();
    broker.set("host", "localhost").unwrap();
    broker.set("port", 1883i64).unwrap();

    let props = (0..n).map(|i| {
        let mut prop =
            Node::with_uri(NodeClass::StreamingProperty, &format!("http://bench.org/p{i}")).unwrap();
        prop.set("streamingTopic", format!("plant/sensor/{i}")).unwrap();
        prop.set("propertyValue", i as f64 * 0.5).unwrap();
        prop.set("propertyConnection", broker.clone()).unwrap();
        prop
    });
    let mut asset = Node::with_uri(NodeClass::AbstractAsset, "http://bench.org/asset").unwrap();
    asset.set_many("assetProperties", props).unwrap();
    asset
}

fn bench_serialize(c: &mut Criterion) {
    let asset = plant_asset(100);
    c.bench_function("serialize_asset_100_props", |bench| {
        bench.iter(|| black_box(serialize(&asset).unwrap()))
    });
}

fn bench_deserialize(c: &mut Criterion) {
    let asset = plant_asset(100);
    let triples = serialize(&asset).unwrap();
    let registry = ClassRegistry::standard();

    c.bench_function("deserialize_asset_100_props", |bench| {
        bench.iter(|| {
            let mut graph = NodeGraph::new();
            let target = Target::Uri {
                uri: asset.uri(),
                class: None,
            };
            deserialize(&triples, &registry, target, &mut graph).unwrap();
            black_box(graph)
        })
    });
}

fn bench_wire(c: &mut Criterion) {
    let triples = serialize(&plant_asset(100)).unwrap();
    let turtle = triples.to_turtle().unwrap();

    c.bench_function("ntriples_encode_100_props", |bench| {
        bench.iter(|| black_box(triples.to_ntriples().unwrap()))
    });
    c.bench_function("turtle_parse_100_props", |bench| {
        bench.iter(|| black_box(TripleSet::parse_turtle(&turtle).unwrap()))
    });
}

criterion_group!(benches, bench_serialize, bench_deserialize, bench_wire);
criterion_main!(benches);
