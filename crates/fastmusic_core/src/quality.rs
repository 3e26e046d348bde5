use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Target bitrate for the converted audio.
///
/// Serialized as the wire string (`"320"`). Deserializes from that string,
/// any spelling [`FromStr`] accepts, or a bare integer such as `320`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioQuality {
    Kbps128,
    Kbps192,
    #[default]
    Kbps256,
    Kbps320,
}

impl AudioQuality {
    pub const ALL: [AudioQuality; 4] = [
        AudioQuality::Kbps128,
        AudioQuality::Kbps192,
        AudioQuality::Kbps256,
        AudioQuality::Kbps320,
    ];

    pub fn kbps(self) -> u16 {
        match self {
            AudioQuality::Kbps128 => 128,
            AudioQuality::Kbps192 => 192,
            AudioQuality::Kbps256 => 256,
            AudioQuality::Kbps320 => 320,
        }
    }

    /// Value sent in the `quality` field of a download request.
    pub fn as_wire(self) -> &'static str {
        match self {
            AudioQuality::Kbps128 => "128",
            AudioQuality::Kbps192 => "192",
            AudioQuality::Kbps256 => "256",
            AudioQuality::Kbps320 => "320",
        }
    }
}

impl fmt::Display for AudioQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kbps", self.kbps())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported quality {0:?}; expected one of 128, 192, 256, 320")]
pub struct ParseQualityError(pub String);

impl FromStr for AudioQuality {
    type Err = ParseQualityError;

    /// Accepts `320`, `320k` and `320kbps`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let digits = lowered
            .strip_suffix("kbps")
            .or_else(|| lowered.strip_suffix('k'))
            .unwrap_or(&lowered)
            .trim();
        AudioQuality::ALL
            .into_iter()
            .find(|quality| quality.as_wire() == digits)
            .ok_or_else(|| ParseQualityError(s.to_string()))
    }
}

impl Serialize for AudioQuality {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for AudioQuality {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(QualityVisitor)
    }
}

struct QualityVisitor;

impl Visitor<'_> for QualityVisitor {
    type Value = AudioQuality;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("one of 128, 192, 256, 320 as a string or integer")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        value.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        self.visit_str(&value.to_string())
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        self.visit_str(&value.to_string())
    }
}
