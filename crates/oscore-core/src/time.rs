//! NTP timestamps as carried in OSC timetags and bundles
//!
//! A timetag is 64 bits of fixed point: the upper 32 bits count whole seconds
//! since 1900-01-01, the lower 32 bits are the fractional part. Both halves
//! travel big-endian.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds between the NTP epoch (1900) and the Unix epoch (1970)
pub const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

const FRACTION_SCALE: f64 = 4_294_967_296.0; // 2^32

/// OSC / NTP timestamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// Whole seconds since the NTP epoch
    pub seconds: u32,
    /// Fractional seconds in units of 1/2^32
    pub fraction: u32,
}

impl Timestamp {
    /// The special "execute immediately" timetag
    pub const IMMEDIATELY: Timestamp = Timestamp {
        seconds: 0,
        fraction: 1,
    };

    pub const fn new(seconds: u32, fraction: u32) -> Self {
        Self { seconds, fraction }
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Decode from 8 big-endian bytes starting at `offset`.
    ///
    /// Returns `None` if the buffer does not hold 8 bytes at `offset`.
    pub fn from_be_bytes(buffer: &[u8], offset: usize) -> Option<Self> {
        let bytes = buffer.get(offset..offset.checked_add(8)?)?;
        let seconds = load_be(u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
        let fraction = load_be(u32::from_ne_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]));
        Some(Self::new(seconds, fraction))
    }

    /// Encode as 8 big-endian bytes
    pub fn to_be_bytes(self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[..4].copy_from_slice(&self.seconds.to_be_bytes());
        out[4..].copy_from_slice(&self.fraction.to_be_bytes());
        out
    }

    /// Time elapsed since the NTP epoch
    pub fn to_duration(self) -> Duration {
        let nanos = (self.fraction as f64 / FRACTION_SCALE * 1e9) as u32;
        Duration::new(self.seconds as u64, nanos.min(999_999_999))
    }

    /// Build from a duration since the NTP epoch, wrapping at the 2036 era boundary
    pub fn from_duration(since_ntp_epoch: Duration) -> Self {
        let fraction = (since_ntp_epoch.subsec_nanos() as f64 / 1e9 * FRACTION_SCALE) as u32;
        Self::new(since_ntp_epoch.as_secs() as u32, fraction)
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        let since_unix = time.duration_since(UNIX_EPOCH).unwrap_or_default();
        Self::from_duration(since_unix + Duration::from_secs(NTP_UNIX_OFFSET))
    }

    /// Convert to `SystemTime`; timestamps before 1970 clamp to the Unix epoch
    pub fn to_system_time(self) -> SystemTime {
        let since_ntp = self.to_duration();
        let unix = since_ntp.saturating_sub(Duration::from_secs(NTP_UNIX_OFFSET));
        UNIX_EPOCH + unix
    }

    pub fn is_immediately(self) -> bool {
        self == Self::IMMEDIATELY
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        Self::from_system_time(time)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:08x}", self.seconds, self.fraction)
    }
}

/// Reverse the byte order of a 32-bit word: output byte `i` is input byte `3 - i`
#[inline]
pub const fn swap_u32(value: u32) -> u32 {
    (value & 0x0000_00FF) << 24
        | (value & 0x0000_FF00) << 8
        | (value & 0x00FF_0000) >> 8
        | (value & 0xFF00_0000) >> 24
}

/// Turn a native-order load of a big-endian word into its value
#[inline]
pub(crate) const fn load_be(raw: u32) -> u32 {
    if cfg!(target_endian = "little") {
        swap_u32(raw)
    } else {
        raw
    }
}
