//! Stem files: location, decoding and the loaded `StemSet`

mod decode;
mod error;
mod loader;
mod resample;
mod source;
mod stem_set;

pub use decode::{decode_file, DecodedAudio};
pub use error::{LoadError, LoadResult, SkippedStem};
pub use loader::{LoadedStems, StemLoader};
pub use resample::resample_stereo;
pub use source::{
    song_id_for, SeparatedDirSource, StemLocation, StemSource, StemSourceConfig, INPUT_PLACEHOLDER,
};
pub use stem_set::{Provenance, StemSet};
