#![cfg(test)]

use crate::Dataset;

const OFFSETS: [(f64, f64); 10] = [
    (0.0, 0.0),
    (0.4, 0.1),
    (-0.3, 0.2),
    (0.1, -0.4),
    (-0.2, -0.1),
    (0.3, 0.3),
    (-0.4, 0.4),
    (0.2, -0.2),
    (0.0, 0.5),
    (-0.5, 0.0),
];

fn around(centers: &[((f64, f64), usize)]) -> Dataset {
    let mut data = Vec::new();
    let mut labels = Vec::new();
    for &((cx, cy), label) in centers {
        for (dx, dy) in OFFSETS {
            data.extend([cx + dx, cy + dy]);
            labels.push(label);
        }
    }
    Dataset::from_rows(data, 2, labels).unwrap()
}

/// Two well separated clusters labeled 0 and 1.
pub(crate) fn blobs() -> Dataset {
    around(&[((-3.0, -3.0), 0), ((3.0, 3.0), 1)])
}

/// Three well separated clusters with sparse labels 1, 4 and 9.
pub(crate) fn three_blobs() -> Dataset {
    around(&[((-4.0, -2.0), 1), ((4.0, -2.0), 4), ((0.0, 4.0), 9)])
}
