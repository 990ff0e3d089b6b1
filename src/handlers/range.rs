/// A `Range` request header interpreted against an object of known size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// Serve the whole object
    Full,
    /// Serve `len` bytes starting at `start`
    Partial { start: u64, len: u64 },
    /// No byte of the requested range exists
    Unsatisfiable,
}

/// Interpret a single-range `bytes=` header.
///
/// Multi-range and malformed headers fall back to [`ByteRange::Full`], as
/// ignoring `Range` is always allowed.
pub fn parse_range(header: Option<&str>, size: u64) -> ByteRange {
    let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return ByteRange::Full;
    };
    if spec.contains(',') {
        return ByteRange::Full;
    }
    let Some((first, last)) = spec.trim().split_once('-') else {
        return ByteRange::Full;
    };

    match (first.trim(), last.trim()) {
        ("", "") => ByteRange::Full,
        // Suffix range: the final `n` bytes
        ("", suffix) => match suffix.parse::<u64>() {
            Ok(0) => ByteRange::Unsatisfiable,
            Ok(_) if size == 0 => ByteRange::Unsatisfiable,
            Ok(n) => {
                let len = n.min(size);
                ByteRange::Partial {
                    start: size - len,
                    len,
                }
            }
            Err(_) => ByteRange::Full,
        },
        (start, end) => {
            let Ok(start) = start.parse::<u64>() else {
                return ByteRange::Full;
            };
            let end = if end.is_empty() {
                None
            } else {
                match end.parse::<u64>() {
                    Ok(end) if end >= start => Some(end),
                    _ => return ByteRange::Full,
                }
            };

            if start >= size {
                return ByteRange::Unsatisfiable;
            }
            let last = end.map_or(size - 1, |end| end.min(size - 1));
            ByteRange::Partial {
                start,
                len: last - start + 1,
            }
        }
    }
}
