use criterion::{Criterion, black_box, criterion_group, criterion_main};
use gabarito::utils::binarization::{adaptive_binarize, otsu_binarize};
use gabarito::{ScanConfig, scan};

const W: usize = 480;
const H: usize = 600;

fn set_dark(rgb: &mut [u8], x: usize, y: usize) {
    let idx = (y * W + x) * 3;
    rgb[idx..idx + 3].copy_from_slice(&[0, 0, 0]);
}

fn draw_square(rgb: &mut [u8], x0: usize, y0: usize, side: usize) {
    for y in y0..y0 + side {
        for x in x0..x0 + side {
            set_dark(rgb, x, y);
        }
    }
}

fn draw_ring(rgb: &mut [u8], cx: usize, cy: usize, outer: usize, inner: usize) {
    for y in cy - outer..=cy + outer {
        for x in cx - outer..=cx + outer {
            let dx = x as isize - cx as isize;
            let dy = y as isize - cy as isize;
            let d2 = dx * dx + dy * dy;
            if d2 <= (outer * outer) as isize && d2 >= (inner * inner) as isize {
                set_dark(rgb, x, y);
            }
        }
    }
}

/// 5-question sheet with option A filled on every row
fn render_sheet() -> Vec<u8> {
    let mut rgb = vec![255u8; W * H * 3];
    draw_square(&mut rgb, 10, 10, 30);
    draw_square(&mut rgb, W - 40, 10, 30);
    draw_square(&mut rgb, 10, H - 40, 30);
    draw_square(&mut rgb, W - 40, H - 40, 30);
    for row in 0..5 {
        for col in 0..5 {
            let (cx, cy) = (90 + col * 60, 120 + row * 60);
            if col == 0 {
                draw_ring(&mut rgb, cx, cy, 12, 0);
            } else {
                draw_ring(&mut rgb, cx, cy, 12, 10);
            }
        }
    }
    rgb
}

fn bench_otsu_binarize(c: &mut Criterion) {
    let gray = vec![128u8; 640 * 480];
    c.bench_function("otsu_binarize_640x480", |b| {
        b.iter(|| otsu_binarize(black_box(&gray), black_box(640), black_box(480)))
    });
}

fn bench_adaptive_binarize(c: &mut Criterion) {
    let gray = vec![128u8; 640 * 480];
    c.bench_function("adaptive_binarize_640x480", |b| {
        b.iter(|| {
            adaptive_binarize(
                black_box(&gray),
                black_box(640),
                black_box(480),
                black_box(25),
                black_box(5),
            )
        })
    });
}

fn bench_full_scan(c: &mut Criterion) {
    let rgb = render_sheet();
    let config = ScanConfig::default();
    c.bench_function("scan_5_questions_480x600", |b| {
        b.iter(|| {
            scan(
                black_box(&rgb),
                black_box(W),
                black_box(H),
                black_box(5),
                black_box(&config),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_otsu_binarize,
    bench_adaptive_binarize,
    bench_full_scan
);
criterion_main!(benches);
