//! Shared vocabulary of the segprop pipeline: the class-color table, dense
//! label maps, the instance-label encoding, and the codecs between them.

mod codec;
mod instance;
mod palette;

pub use self::codec::{labels_to_mask, mask_to_labels, CodecError};
pub use self::instance::{format_prediction, Prediction, UNSEEDED};
pub use self::palette::{ClassDef, ClassTable, VOID_LABEL};
