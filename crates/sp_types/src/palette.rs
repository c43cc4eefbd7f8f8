use std::collections::HashMap;

/// Label value for pixels that belong to no class: unannotated scribble
/// pixels and void ground truth. Never a valid index into a [`ClassTable`].
pub const VOID_LABEL: u8 = 255;

/// One entry of the class-color table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassDef {
    pub id: u8,
    pub name: &'static str,
    /// Display color, RGB.
    pub color: [u8; 3],
}

/// Fixed mapping between semantic class ids, names and display colors.
///
/// Ids are dense (`0..num_classes()`), colors are pairwise distinct and never
/// black, which is reserved for [`VOID_LABEL`]. Both invariants are checked
/// on construction, so color→id and id→color are exact inverses.
pub struct ClassTable {
    classes: Vec<ClassDef>,
    by_color: HashMap<[u8; 3], u8>,
}

impl ClassTable {
    /// The 19 Cityscapes train classes with the official palette.
    #[rustfmt::skip]
    pub fn cityscapes() -> Self {
        Self::new(vec![
            ClassDef { id: 0, name: "road", color: [128, 64, 128] },
            ClassDef { id: 1, name: "sidewalk", color: [244, 35, 232] },
            ClassDef { id: 2, name: "building", color: [70, 70, 70] },
            ClassDef { id: 3, name: "wall", color: [102, 102, 156] },
            ClassDef { id: 4, name: "fence", color: [190, 153, 153] },
            ClassDef { id: 5, name: "pole", color: [153, 153, 153] },
            ClassDef { id: 6, name: "traffic light", color: [250, 170, 30] },
            ClassDef { id: 7, name: "traffic sign", color: [220, 220, 0] },
            ClassDef { id: 8, name: "vegetation", color: [107, 142, 35] },
            ClassDef { id: 9, name: "terrain", color: [152, 251, 152] },
            ClassDef { id: 10, name: "sky", color: [70, 130, 180] },
            ClassDef { id: 11, name: "person", color: [220, 20, 60] },
            ClassDef { id: 12, name: "rider", color: [255, 0, 0] },
            ClassDef { id: 13, name: "car", color: [0, 0, 142] },
            ClassDef { id: 14, name: "truck", color: [0, 0, 70] },
            ClassDef { id: 15, name: "bus", color: [0, 60, 100] },
            ClassDef { id: 16, name: "train", color: [0, 80, 100] },
            ClassDef { id: 17, name: "motorcycle", color: [0, 0, 230] },
            ClassDef { id: 18, name: "bicycle", color: [119, 11, 32] },
        ])
    }

    /// Panics when ids are not dense, a color repeats, or a color is black.
    pub fn new(classes: Vec<ClassDef>) -> Self {
        let mut by_color = HashMap::with_capacity(classes.len());
        for (i, class) in classes.iter().enumerate() {
            assert_eq!(class.id as usize, i, "class ids must be dense");
            assert_ne!(class.color, [0, 0, 0], "black is reserved for void");
            let previous = by_color.insert(class.color, class.id);
            assert!(previous.is_none(), "duplicate class color {:?}", class.color);
        }
        Self { classes, by_color }
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    #[inline]
    pub fn get(&self, id: u8) -> Option<&ClassDef> {
        self.classes.get(id as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes.iter()
    }

    /// Display color of a class id; [`VOID_LABEL`] renders as black.
    pub fn color_of(&self, id: u8) -> Option<[u8; 3]> {
        if id == VOID_LABEL {
            Some([0, 0, 0])
        } else {
            self.get(id).map(|class| class.color)
        }
    }

    /// Class id of a display color; black decodes to [`VOID_LABEL`].
    pub fn class_of_color(&self, color: [u8; 3]) -> Option<u8> {
        if color == [0, 0, 0] {
            Some(VOID_LABEL)
        } else {
            self.by_color.get(&color).copied()
        }
    }

    pub fn name_of(&self, id: u8) -> Option<&'static str> {
        if id == VOID_LABEL {
            Some("void")
        } else {
            self.get(id).map(|class| class.name)
        }
    }
}
