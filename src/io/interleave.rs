/// Copy a mono block to every channel of an interleaved buffer.
///
/// `dst` must hold `src.len() * channels` samples.
#[inline]
pub fn copy_mono_to_channels(src: &[f32], dst: &mut [f32], channels: usize) {
    for (frame, &sample) in dst.chunks_exact_mut(channels).zip(src.iter()) {
        frame.fill(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_each_sample() {
        let src = [0.1, -0.2, 0.3];
        let mut dst = [0.0; 6];
        copy_mono_to_channels(&src, &mut dst, 2);
        assert_eq!(dst, [0.1, 0.1, -0.2, -0.2, 0.3, 0.3]);
    }

    #[test]
    fn mono_is_a_plain_copy() {
        let src = [0.5, 0.25];
        let mut dst = [0.0; 2];
        copy_mono_to_channels(&src, &mut dst, 1);
        assert_eq!(dst, src);
    }
}
