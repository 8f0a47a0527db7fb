use criterion::{Criterion, black_box, criterion_group, criterion_main};

use glimt_core::math::{self, Vec3};
use glimt_core::mesh::parse_obj;
use glimt_core::Camera;

fn obj_text(triangles: usize) -> String {
    let mut text = String::from("v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nvn 0 0 1\nvn 0 0 1\nvn 0 0 1\n");
    for _ in 0..triangles {
        text.push_str("f 1/1/1 2/2/2 3/3/3\n");
    }
    text
}

fn bench_obj_parse(c: &mut Criterion) {
    let small = obj_text(12);
    let large = obj_text(4096);

    c.bench_function("obj_parse_12_triangles", |b| {
        b.iter(|| black_box(parse_obj(black_box(&small), "bench.obj")));
    });
    c.bench_function("obj_parse_4096_triangles", |b| {
        b.iter(|| black_box(parse_obj(black_box(&large), "bench.obj")));
    });
}

fn bench_wvp_update(c: &mut Criterion) {
    let camera = Camera::new(1920, 1080);
    c.bench_function("wvp_update_single_object", |b| {
        b.iter(|| {
            let world = math::scaling(Vec3::new(10.0, 10.0, 10.0))
                * math::rotation_y(black_box(0.01))
                * math::translation(Vec3::new(2.0, 0.0, 0.0));
            let wvp = (world * camera.view_projection()).transpose();
            black_box(math::to_row_major_array(&wvp))
        });
    });
}

criterion_group!(benches, bench_obj_parse, bench_wvp_update);
criterion_main!(benches);
