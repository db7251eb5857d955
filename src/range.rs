use crate::error::ScanError;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Inclusive TCP port range with `1 <= start <= end <= 65535`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "RawRange")]
pub struct PortRange {
    start: u16,
    end: u16,
}

/// Unchecked wire form; deserialization goes through `PortRange::new`.
#[derive(Deserialize)]
struct RawRange {
    start: u32,
    end: u32,
}

impl TryFrom<RawRange> for PortRange {
    type Error = ScanError;

    fn try_from(raw: RawRange) -> Result<Self, ScanError> {
        PortRange::new(raw.start, raw.end)
    }
}

impl PortRange {
    /// Validate unchecked bounds. Values outside `u16` are rejected, not truncated.
    pub fn new(start: u32, end: u32) -> Result<Self, ScanError> {
        let valid = |p: u32| (1..=u32::from(u16::MAX)).contains(&p);
        if !valid(start) || !valid(end) || start > end {
            return Err(ScanError::InvalidRange { start, end });
        }
        Ok(Self {
            start: start as u16,
            end: end as u16,
        })
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    /// Number of ports in the range; never zero.
    pub fn len(&self) -> usize {
        usize::from(self.end - self.start) + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, port: u16) -> bool {
        (self.start..=self.end).contains(&port)
    }

    pub fn iter(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Accepts a single port (`80`) or an inclusive range (`8000-8010`).
impl FromStr for PortRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            bail!("empty port range");
        }
        let (start, end) = match s.split_once('-') {
            Some((a, b)) => (
                parse_port_str(a.trim()).with_context(|| format!("invalid start in range: {a}"))?,
                parse_port_str(b.trim()).with_context(|| format!("invalid end in range: {b}"))?,
            ),
            None => {
                let p = parse_port_str(s).with_context(|| format!("invalid port value: {s}"))?;
                (p, p)
            }
        };
        Ok(PortRange::new(start, end)?)
    }
}

/// Parse a port number without range checks; `PortRange::new` owns those.
pub fn parse_port_str(s: &str) -> Result<u32> {
    s.parse::<u32>().map_err(|e| anyhow::anyhow!(e))
}
