//! Scribble annotation processing.
//!
//! Decoded scribbles arrive as per-pixel class ids with `255` for
//! unannotated pixels. [`thicken`] widens the thin strokes so they reliably
//! overlap the superpixels they are meant to seed, and [`to_seed_map`] turns
//! the strokes into per-pixel instance-encoded seed labels.

use ndarray::Array2;
use sp_types::{ClassTable, VOID_LABEL};

pub use sp_types::UNSEEDED;

use crate::{DataError, DataResult};

/// Dilates every stroke by `radius` pixels (Chebyshev distance).
///
/// Annotated pixels keep their label; grown pixels take the label of the
/// first stroke pixel in scan order that reaches them, so overlapping
/// growth from different strokes resolves deterministically.
pub fn thicken(labels: &Array2<u8>, radius: usize) -> Array2<u8> {
    if radius == 0 {
        return labels.clone();
    }

    let (h, w) = labels.dim();
    let mut out = labels.clone();
    for ((y, x), &label) in labels.indexed_iter() {
        if label == VOID_LABEL {
            continue;
        }
        let y1 = (y + radius).min(h - 1);
        let x1 = (x + radius).min(w - 1);
        for yy in y.saturating_sub(radius)..=y1 {
            for xx in x.saturating_sub(radius)..=x1 {
                if out[(yy, xx)] == VOID_LABEL {
                    out[(yy, xx)] = label;
                }
            }
        }
    }
    out
}

/// Converts a scribble label map into instance-encoded seeds.
///
/// Each 4-connected stroke of one class becomes its own instance; instance
/// indices count up per class in scan order, so the encoding is stable for
/// a given annotation. Unannotated pixels map to [`UNSEEDED`].
pub fn to_seed_map(labels: &Array2<u8>, table: &ClassTable) -> DataResult<Array2<u16>> {
    let (h, w) = labels.dim();
    let mut seeds = Array2::from_elem((h, w), UNSEEDED);
    let mut next_index = vec![0_u16; table.num_classes()];
    let mut stack = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let class = labels[(y, x)];
            if class == VOID_LABEL || seeds[(y, x)] != UNSEEDED {
                continue;
            }

            let index = next_index[class as usize];
            if index as usize * table.num_classes() + class as usize >= usize::from(UNSEEDED) {
                return Err(DataError::SeedOverflow { class });
            }
            let encoded = table.encode_instance(class, index);
            next_index[class as usize] = index + 1;

            seeds[(y, x)] = encoded;
            stack.push((y, x));
            while let Some((cy, cx)) = stack.pop() {
                let mut visit = |ny: usize, nx: usize, stack: &mut Vec<(usize, usize)>| {
                    if labels[(ny, nx)] == class && seeds[(ny, nx)] == UNSEEDED {
                        seeds[(ny, nx)] = encoded;
                        stack.push((ny, nx));
                    }
                };
                if cy > 0 {
                    visit(cy - 1, cx, &mut stack);
                }
                if cy + 1 < h {
                    visit(cy + 1, cx, &mut stack);
                }
                if cx > 0 {
                    visit(cy, cx - 1, &mut stack);
                }
                if cx + 1 < w {
                    visit(cy, cx + 1, &mut stack);
                }
            }
        }
    }

    Ok(seeds)
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    const V: u8 = VOID_LABEL;
    const U: u16 = UNSEEDED;

    #[test]
    fn thicken_grows_a_point_into_a_block() {
        let mut labels = Array2::from_elem((5, 5), V);
        labels[(2, 2)] = 3;

        let thick = thicken(&labels, 1);
        for y in 0..5 {
            for x in 0..5 {
                let inside = (1..=3).contains(&y) && (1..=3).contains(&x);
                assert_eq!(thick[(y, x)], if inside { 3 } else { V });
            }
        }
    }

    #[test]
    fn thicken_clips_at_the_border() {
        let mut labels = Array2::from_elem((3, 3), V);
        labels[(0, 0)] = 7;

        let thick = thicken(&labels, 2);
        assert_eq!(thick[(2, 2)], 7);
    }

    #[test]
    fn thicken_never_overwrites_annotations() {
        let labels = array![[1u8, V, 2]];
        let thick = thicken(&labels, 1);
        assert_eq!(thick[(0, 0)], 1);
        assert_eq!(thick[(0, 2)], 2);
        // the contested middle pixel goes to the stroke seen first
        assert_eq!(thick[(0, 1)], 1);
    }

    #[test]
    fn seed_map_separates_strokes_of_one_class() {
        let table = ClassTable::cityscapes();
        // two class-0 strokes, disconnected, plus one class-1 stroke
        let labels = array![
            [0u8, 0, V, 1],
            [V, V, V, 1],
            [0, V, V, V],
        ];

        let seeds = to_seed_map(&labels, &table).unwrap();
        let first = table.encode_instance(0, 0);
        let second = table.encode_instance(0, 1);
        let other = table.encode_instance(1, 0);

        assert_eq!(seeds[(0, 0)], first);
        assert_eq!(seeds[(0, 1)], first);
        assert_eq!(seeds[(2, 0)], second);
        assert_eq!(seeds[(0, 3)], other);
        assert_eq!(seeds[(1, 3)], other);
        assert_eq!(seeds[(1, 1)], U);
    }

    #[test]
    fn diagonal_pixels_are_separate_instances() {
        let table = ClassTable::cityscapes();
        let labels = array![[5u8, V], [V, 5]];

        let seeds = to_seed_map(&labels, &table).unwrap();
        assert_ne!(seeds[(0, 0)], seeds[(1, 1)]);
        assert_eq!(
            table.class_of_encoded(seeds[(1, 1)]),
            table.class_of_encoded(seeds[(0, 0)])
        );
    }

    #[test]
    fn empty_scribble_yields_no_seeds() {
        let table = ClassTable::cityscapes();
        let labels = Array2::from_elem((4, 4), V);
        let seeds = to_seed_map(&labels, &table).unwrap();
        assert!(seeds.iter().all(|&s| s == U));
    }

    #[test]
    fn too_many_instances_of_one_class_is_an_error() {
        let table = ClassTable::cityscapes();
        // 3451 isolated single-pixel strokes, one per even column
        let labels = Array2::from_shape_fn((1, 6901), |(_, x)| if x % 2 == 0 { 0 } else { V });
        let err = to_seed_map(&labels, &table).unwrap_err();
        assert!(matches!(err, DataError::SeedOverflow { class: 0 }));
    }
}
