//! Five-stage progress code of an in-flight request, mirrored from the transport.

/// Transport progress code (0–4), following the standard request lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ReadyState {
    /// No request started.
    Uninitialized = 0,
    /// Request opened, not yet sent.
    Loading = 1,
    /// Request sent; headers/status not yet available.
    Loaded = 2,
    /// Partial response available.
    Interactive = 3,
    /// Response fully received.
    Complete = 4,
}

impl ReadyState {
    /// Parses a transport progress code; codes outside 0..=4 yield `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ReadyState::Uninitialized),
            1 => Some(ReadyState::Loading),
            2 => Some(ReadyState::Loaded),
            3 => Some(ReadyState::Interactive),
            4 => Some(ReadyState::Complete),
            _ => None,
        }
    }

    /// Numeric code of this state.
    #[inline]
    pub fn as_code(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for ReadyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReadyState::Uninitialized => "uninitialized",
            ReadyState::Loading => "loading",
            ReadyState::Loaded => "loaded",
            ReadyState::Interactive => "interactive",
            ReadyState::Complete => "complete",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for code in 0..=4u8 {
            let rs = ReadyState::from_code(code).unwrap();
            assert_eq!(rs.as_code(), code);
        }
        assert!(ReadyState::from_code(5).is_none());
    }

    #[test]
    fn test_ordering_follows_progress() {
        assert!(ReadyState::Uninitialized < ReadyState::Loading);
        assert!(ReadyState::Interactive < ReadyState::Complete);
    }
}
