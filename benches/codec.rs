use chanwire::dclass::Struct;
use chanwire::{
    Datagram, DistributedType, MessageType, Value, format_value, pack_value, unpack_value,
};
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

fn avatar_type() -> DistributedType {
    DistributedType::from(
        Struct::new("Avatar")
            .with_field("name", DistributedType::VarString)
            .with_field("hp", DistributedType::Int16)
            .with_field("pos", DistributedType::array(DistributedType::Float32, 3))
            .with_field("inventory", DistributedType::var_array(DistributedType::UInt32)),
    )
}

fn avatar_value() -> Value {
    Value::Struct(vec![
        Value::string("Flippy"),
        Value::Int(100),
        Value::Array(vec![Value::Float(1.5), Value::Float(-3.0), Value::Float(0.25)]),
        Value::Array((0..64).map(Value::UInt).collect()),
    ])
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("datagram");

    group.throughput(Throughput::Bytes(64));
    group.bench_function("build_server_64b", |b| {
        b.iter(|| {
            let mut dg =
                Datagram::with_server_header(5, 3, MessageType::STATESERVER_OBJECT_SET_FIELD)
                    .unwrap();
            dg.add_data(black_box(&[0u8; 64])).unwrap();
            black_box(dg);
        });
    });

    let recipients: Vec<u64> = (0..32).rev().collect();
    group.bench_function("build_multi_32", |b| {
        b.iter(|| {
            black_box(
                Datagram::with_multi_header(
                    recipients.iter().copied(),
                    3,
                    MessageType::STATESERVER_OBJECT_SET_FIELD,
                )
                .unwrap(),
            );
        });
    });

    let blob = vec![0u8; 1024];
    group.throughput(Throughput::Bytes(1024));
    group.bench_function("add_blob_1kb", |b| {
        b.iter(|| {
            let mut dg = Datagram::new();
            dg.add_blob(black_box(&blob)).unwrap();
            black_box(dg);
        });
    });

    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("datagram");

    let dg = Datagram::with_multi_header([9, 3, 5], 1, MessageType::STATESERVER_OBJECT_SET_FIELD)
        .unwrap();
    group.bench_function("read_envelope_multi", |b| {
        b.iter(|| {
            let mut it = dg.iter();
            black_box(it.read_envelope().unwrap());
        });
    });

    group.finish();
}

fn bench_values(c: &mut Criterion) {
    let mut group = c.benchmark_group("value");

    let dtype = avatar_type();
    let value = avatar_value();
    let mut packed = Datagram::new();
    pack_value(&dtype, &value, &mut packed).unwrap();
    group.throughput(Throughput::Bytes(packed.len() as u64));

    group.bench_function("pack_avatar", |b| {
        b.iter(|| {
            let mut dg = Datagram::new();
            pack_value(&dtype, black_box(&value), &mut dg).unwrap();
            black_box(dg);
        });
    });

    group.bench_function("unpack_avatar", |b| {
        b.iter(|| {
            black_box(unpack_value(&dtype, black_box(packed.as_slice())).unwrap());
        });
    });

    group.bench_function("format_avatar", |b| {
        b.iter(|| {
            black_box(format_value(&dtype, black_box(packed.as_slice())).unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_build, bench_read, bench_values);
criterion_main!(benches);
