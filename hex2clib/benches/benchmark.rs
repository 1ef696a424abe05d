use criterion::{Criterion, criterion_group, criterion_main};
use hex2clib::{ADDRESS_SPACE, Decoder, Encoder, EncoderOptions, Image, OutputFormat};
use rand::Rng;
use std::hint::black_box;

fn random_image() -> Image {
    let bytes = rand::rng()
        .sample_iter(rand::distr::StandardUniform)
        .take(ADDRESS_SPACE)
        .collect();
    Image::from_binary(bytes)
}

#[allow(clippy::expect_used)]
fn encode(image: &Image, format: OutputFormat) -> Vec<u8> {
    let encoder = Encoder::new(EncoderOptions {
        format,
        ..EncoderOptions::default()
    });
    let mut out = Vec::new();
    encoder.encode(image, &mut out).expect("Failed to encode image");
    out
}

fn bench_decode(c: &mut Criterion) {
    let hex_bytes = encode(&random_image(), OutputFormat::Hex);

    c.bench_function("decode_bytes_64k", |b| {
        b.iter(|| {
            let decoded = Decoder::default().decode_bytes(black_box(&hex_bytes));
            black_box(decoded);
        });
    });

    c.bench_function("decode_reader_64k", |b| {
        b.iter(|| {
            let decoded = Decoder::default().decode(black_box(hex_bytes.as_slice()));
            black_box(decoded.ok());
        });
    });
}

fn bench_encode(c: &mut Criterion) {
    let image = random_image();

    c.bench_function("encode_hex_64k", |b| {
        b.iter(|| black_box(encode(black_box(&image), OutputFormat::Hex)));
    });

    c.bench_function("encode_listing_64k", |b| {
        b.iter(|| black_box(encode(black_box(&image), OutputFormat::CListing)));
    });
}

criterion_group!(
    name = hex2clib_benches;
    config = Criterion::default().sample_size(20);
    targets = bench_decode, bench_encode
);
criterion_main!(hex2clib_benches);
