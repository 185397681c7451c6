use crate::types::LogCandidate;

/// First header line of every recording in a blackbox file
pub const LOG_START_MARKER: &[u8] = b"H Product:Blackbox flight data recorder by Nicholas Sherlock";

/// Split a raw buffer into candidate recordings.
///
/// Each occurrence of [`LOG_START_MARKER`] opens a candidate running to the
/// next marker or the end of the buffer; bytes before the first marker are
/// ignored. Without any marker the whole buffer is a single candidate. A
/// marker that happens to appear inside frame payload also splits; decoding
/// such a fragment simply fails or yields a short recording.
pub fn split_recordings(data: &[u8]) -> Vec<LogCandidate> {
    if data.is_empty() {
        return Vec::new();
    }

    let starts = marker_positions(data);
    if starts.is_empty() {
        return vec![LogCandidate {
            index: 0,
            range: 0..data.len(),
        }];
    }

    starts
        .iter()
        .enumerate()
        .map(|(index, &start)| {
            let end = starts.get(index + 1).copied().unwrap_or(data.len());
            LogCandidate {
                index,
                range: start..end,
            }
        })
        .collect()
}

fn marker_positions(data: &[u8]) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut offset = 0;
    while let Some(found) = find(&data[offset..], LOG_START_MARKER) {
        positions.push(offset + found);
        offset += found + LOG_START_MARKER.len();
    }
    positions
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(body: &[u8]) -> Vec<u8> {
        let mut data = LOG_START_MARKER.to_vec();
        data.push(b'\n');
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn test_empty_buffer_has_no_candidates() {
        assert!(split_recordings(&[]).is_empty());
    }

    #[test]
    fn test_no_marker_is_one_candidate() {
        let candidates = split_recordings(b"not a blackbox log");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].range, 0..18);
    }

    #[test]
    fn test_multiple_recordings() {
        let mut data = b"junk".to_vec();
        let first = recording(b"one");
        let second = recording(b"two-two");
        data.extend_from_slice(&first);
        data.extend_from_slice(&second);

        let candidates = split_recordings(&data);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].range, 4..4 + first.len());
        assert_eq!(candidates[1].range, 4 + first.len()..data.len());
        assert_eq!(candidates[1].bytes(&data), &second[..]);
        assert_eq!(candidates[1].index, 1);
    }
}
