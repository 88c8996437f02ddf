// Audio module - file detection and duration probing

pub mod detection;
pub mod metadata;

pub use detection::{discover_inputs, is_input_audio_file, manifest_type};
pub use metadata::{round_to_millis, DurationProbe, SymphoniaProbe};
