use crate::CodexError;

/// Merges per-channel buffers frame by frame: every channel's sample `i`,
/// then every channel's sample `i + 1`.
///
/// A single channel comes back unchanged. All channels must have the same
/// length; the first one that differs from channel 0 is reported.
pub fn interleave(channels: &[Vec<f32>]) -> Result<Vec<f32>, CodexError> {
    let Some(first) = channels.first() else {
        return Err(CodexError::ChannelCountUnsupported(0));
    };
    let frames = first.len();

    if let Some((channel, data)) = channels
        .iter()
        .enumerate()
        .find(|(_, data)| data.len() != frames)
    {
        return Err(CodexError::ChannelLengthMismatch {
            channel,
            expected: frames,
            found: data.len(),
        });
    }

    match channels {
        [mono] => Ok(mono.clone()),
        [left, right] => Ok(left
            .iter()
            .zip(right)
            .flat_map(|(&l, &r)| [l, r])
            .collect()),
        _ => {
            let mut output = Vec::with_capacity(frames * channels.len());
            for i in 0..frames {
                output.extend(channels.iter().map(|ch| ch[i]));
            }
            Ok(output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_alternates_left_right() {
        let left = vec![1.0, 2.0, 3.0];
        let right = vec![10.0, 20.0, 30.0];
        let result = interleave(&[left, right]).unwrap();
        assert_eq!(result, vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0]);
    }

    #[test]
    fn test_mono_is_identity() {
        let mono = vec![0.1, -0.2, 0.3];
        assert_eq!(interleave(&[mono.clone()]).unwrap(), mono);
    }

    #[test]
    fn test_surround_round_robin() {
        let channels: Vec<Vec<f32>> = (0..6)
            .map(|ch| (0..4).map(|i| (ch * 10 + i) as f32).collect())
            .collect();
        let result = interleave(&channels).unwrap();
        assert_eq!(result.len(), 24);
        assert_eq!(&result[0..6], &[0.0, 10.0, 20.0, 30.0, 40.0, 50.0]);
        assert_eq!(&result[18..24], &[3.0, 13.0, 23.0, 33.0, 43.0, 53.0]);
    }

    #[test]
    fn test_empty_channels() {
        let result = interleave(&[Vec::new(), Vec::new()]).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_length_mismatch() {
        let err = interleave(&[vec![0.0; 10], vec![0.0; 9]]).unwrap_err();
        assert!(matches!(
            err,
            CodexError::ChannelLengthMismatch {
                channel: 1,
                expected: 10,
                found: 9
            }
        ));
    }

    #[test]
    fn test_no_channels() {
        assert!(matches!(
            interleave(&[]),
            Err(CodexError::ChannelCountUnsupported(0))
        ));
    }
}
