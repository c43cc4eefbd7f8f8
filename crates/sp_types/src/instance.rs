use ndarray::Array2;

use crate::ClassTable;

/// Marker for pixels and regions that carry no seed.
///
/// Seed extraction refuses instance encodings that would collide with it.
pub const UNSEEDED: u16 = u16::MAX;

/// A formatted prediction, ready for export: the semantic-label map and the
/// instance-id map the experiment writes per sample.
pub struct Prediction {
    /// Semantic class per pixel.
    pub labels: Array2<u8>,
    /// Cityscapes-style instance ids: `class * 1000 + instance_index`.
    pub instances: Array2<u16>,
}

/// Instance-encoded labels.
///
/// The propagation works on whole scribbled instances, not bare classes: the
/// `k`-th scribbled instance of class `c` gets the label `c + k * N` where
/// `N` is the class count. `label % N` recovers the class, so all instances
/// of a class compete with the same probability channel.
impl ClassTable {
    #[inline]
    pub fn encode_instance(&self, class: u8, index: u16) -> u16 {
        debug_assert!((class as usize) < self.num_classes());
        class as u16 + index * self.num_classes() as u16
    }

    #[inline]
    pub fn class_of_encoded(&self, encoded: u16) -> u8 {
        (encoded % self.num_classes() as u16) as u8
    }

    #[inline]
    pub fn instance_index(&self, encoded: u16) -> u16 {
        encoded / self.num_classes() as u16
    }

    /// The id written to `*_instanceIds.png`, following the Cityscapes
    /// ground-truth convention. Instance indices are assumed `< 1000`.
    #[inline]
    pub fn cityscapes_instance_id(&self, encoded: u16) -> u16 {
        self.class_of_encoded(encoded) as u16 * 1000 + self.instance_index(encoded)
    }
}

/// Split an instance-encoded prediction into the two exported maps.
pub fn format_prediction(table: &ClassTable, encoded: &Array2<u16>) -> Prediction {
    Prediction {
        labels: encoded.mapv(|e| table.class_of_encoded(e)),
        instances: encoded.mapv(|e| table.cityscapes_instance_id(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_roundtrips() {
        let table = ClassTable::cityscapes();
        for class in [0u8, 7, 18] {
            for index in [0u16, 1, 41] {
                let encoded = table.encode_instance(class, index);
                assert_eq!(table.class_of_encoded(encoded), class);
                assert_eq!(table.instance_index(encoded), index);
            }
        }
    }

    #[test]
    fn cityscapes_ids_follow_the_convention() {
        let table = ClassTable::cityscapes();
        let encoded = table.encode_instance(13, 2); // third car
        assert_eq!(table.cityscapes_instance_id(encoded), 13_002);
    }

    #[test]
    fn format_splits_labels_and_instances() {
        let table = ClassTable::cityscapes();
        let encoded = Array2::from_shape_vec(
            (1, 3),
            vec![
                table.encode_instance(0, 0),
                table.encode_instance(13, 0),
                table.encode_instance(13, 1),
            ],
        )
        .unwrap();

        let prediction = format_prediction(&table, &encoded);
        assert_eq!(prediction.labels.as_slice().unwrap(), &[0, 13, 13]);
        assert_eq!(
            prediction.instances.as_slice().unwrap(),
            &[0, 13_000, 13_001]
        );
    }
}
