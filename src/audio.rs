mod decode;
mod normalize;
mod resample;

/// Fixed sample rate of every prepared clip.
pub const TARGET_SAMPLE_RATE: u32 = 22_050;
/// Fixed duration of every prepared clip.
pub const TARGET_DURATION_SECONDS: u32 = 10;
/// Exact sample count of every prepared clip.
pub const TARGET_SAMPLE_LEN: usize =
    (TARGET_SAMPLE_RATE as usize) * (TARGET_DURATION_SECONDS as usize);

pub use decode::DecodeError;
pub use normalize::{NormalizedAudio, normalize};
