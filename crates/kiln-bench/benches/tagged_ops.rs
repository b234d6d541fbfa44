//! Criterion micro-benchmarks for `TaggedPtr` dispatch strategies against
//! trait objects.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use kiln_bench::tag_sequence;
use kiln_tagged::{type_set, TaggedPtr, Visit, Visitor};

struct Sphere {
    r: f32,
}
struct Disk {
    r: f32,
}
struct Quad {
    w: f32,
    h: f32,
}

type_set! {
    enum Shape { Sphere, Disk, Quad }
}

trait Area {
    fn area(&self) -> f32;
}

impl Area for Sphere {
    fn area(&self) -> f32 {
        4.0 * std::f32::consts::PI * self.r * self.r
    }
}
impl Area for Disk {
    fn area(&self) -> f32 {
        std::f32::consts::PI * self.r * self.r
    }
}
impl Area for Quad {
    fn area(&self) -> f32 {
        self.w * self.h
    }
}

struct AreaOf;

impl Visitor for AreaOf {
    type Output = f32;
}
impl<'a, T: Area + 'a> Visit<'a, T> for AreaOf {
    fn visit(self, value: &'a T) -> f32 {
        value.area()
    }
}

const SHAPES: usize = 4096;

/// Benchmark: sum areas through each dispatch path over the same shuffled
/// scene.
fn bench_dispatch(c: &mut Criterion) {
    let picks = tag_sequence(SHAPES, 3, 11);
    let spheres: Vec<Sphere> = (0..SHAPES).map(|i| Sphere { r: i as f32 }).collect();
    let disks: Vec<Disk> = (0..SHAPES).map(|i| Disk { r: i as f32 }).collect();
    let quads: Vec<Quad> = (0..SHAPES).map(|i| Quad { w: i as f32, h: 2.0 }).collect();

    let tagged: Vec<TaggedPtr<'_, Shape>> = picks
        .iter()
        .enumerate()
        .map(|(i, &pick)| match pick {
            0 => TaggedPtr::new(&spheres[i]),
            1 => TaggedPtr::new(&disks[i]),
            _ => TaggedPtr::new(&quads[i]),
        })
        .collect();
    let dynamic: Vec<&dyn Area> = picks
        .iter()
        .enumerate()
        .map(|(i, &pick)| -> &dyn Area {
            match pick {
                0 => &spheres[i],
                1 => &disks[i],
                _ => &quads[i],
            }
        })
        .collect();

    let mut group = c.benchmark_group("area_sum_4k");
    group.bench_function("tagged_dispatch", |b| {
        b.iter(|| black_box(tagged.iter().map(|s| s.dispatch(AreaOf)).sum::<f32>()));
    });
    group.bench_function("tagged_dispatch_cpu", |b| {
        b.iter(|| black_box(tagged.iter().map(|s| s.dispatch_cpu(AreaOf)).sum::<f32>()));
    });
    group.bench_function("trait_object", |b| {
        b.iter(|| black_box(dynamic.iter().map(|s| s.area()).sum::<f32>()));
    });
    group.finish();
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
