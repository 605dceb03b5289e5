/// Bar interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Timeframe {
    /// 1 minute
    M1,
    /// 3 minutes
    M3,
    /// 5 minutes
    M5,
    /// 15 minutes
    M15,
    /// 30 minutes
    M30,
    /// 1 hour
    H1,
    /// 2 hours
    H2,
    /// 4 hours
    H4,
    /// 6 hours
    H6,
    /// 8 hours
    H8,
    /// 12 hours
    H12,
    /// 1 day
    D1,
    /// 3 days
    D3,
    /// 1 week
    W1,
    /// 1 month (counted as 30 days)
    MN1,
}

/// Error parsing timeframe
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timeframe: {0:?}")]
pub struct ParseTimeframeError(pub String);

impl std::str::FromStr for Timeframe {
    type Err = ParseTimeframeError;

    /// Accepts the canonical names (`"H1"`, case-insensitive) and exchange
    /// interval strings (`"1h"`, `"15m"`, `"1d"`, `"1M"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // `1M` (month) and `1m` (minute) only differ by case.
        if s == "1M" {
            return Ok(Timeframe::MN1);
        }
        match s.to_uppercase().as_str() {
            "M1" | "1M" => Ok(Timeframe::M1),
            "M3" | "3M" => Ok(Timeframe::M3),
            "M5" | "5M" => Ok(Timeframe::M5),
            "M15" | "15M" => Ok(Timeframe::M15),
            "M30" | "30M" => Ok(Timeframe::M30),
            "H1" | "1H" => Ok(Timeframe::H1),
            "H2" | "2H" => Ok(Timeframe::H2),
            "H4" | "4H" => Ok(Timeframe::H4),
            "H6" | "6H" => Ok(Timeframe::H6),
            "H8" | "8H" => Ok(Timeframe::H8),
            "H12" | "12H" => Ok(Timeframe::H12),
            "D1" | "1D" => Ok(Timeframe::D1),
            "D3" | "3D" => Ok(Timeframe::D3),
            "W1" | "1W" => Ok(Timeframe::W1),
            "MN1" => Ok(Timeframe::MN1),
            _ => Err(ParseTimeframeError(s.to_string())),
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Timeframe {
    /// Returns duration in seconds
    #[must_use]
    pub fn to_seconds(&self) -> u64 {
        match self {
            Timeframe::M1 => 60,
            Timeframe::M3 => 180,
            Timeframe::M5 => 300,
            Timeframe::M15 => 900,
            Timeframe::M30 => 1800,
            Timeframe::H1 => 3600,
            Timeframe::H2 => 7200,
            Timeframe::H4 => 14_400,
            Timeframe::H6 => 21_600,
            Timeframe::H8 => 28_800,
            Timeframe::H12 => 43_200,
            Timeframe::D1 => 86_400,
            Timeframe::D3 => 259_200,
            Timeframe::W1 => 604_800,
            Timeframe::MN1 => 2_592_000,
        }
    }

    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M3 => "M3",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H2 => "H2",
            Timeframe::H4 => "H4",
            Timeframe::H6 => "H6",
            Timeframe::H8 => "H8",
            Timeframe::H12 => "H12",
            Timeframe::D1 => "D1",
            Timeframe::D3 => "D3",
            Timeframe::W1 => "W1",
            Timeframe::MN1 => "MN1",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_timeframe_to_seconds() {
        assert_eq!(Timeframe::M1.to_seconds(), 60);
        assert_eq!(Timeframe::M15.to_seconds(), 900);
        assert_eq!(Timeframe::H4.to_seconds(), 14_400);
        assert_eq!(Timeframe::D1.to_seconds(), 86_400);
        assert_eq!(Timeframe::W1.to_seconds(), 604_800);
    }

    #[test]
    fn test_timeframe_from_canonical() {
        assert_eq!(Timeframe::from_str("M1"), Ok(Timeframe::M1));
        assert_eq!(Timeframe::from_str("h1"), Ok(Timeframe::H1));
        assert_eq!(Timeframe::from_str("MN1"), Ok(Timeframe::MN1));
    }

    #[test]
    fn test_timeframe_from_exchange_interval() {
        assert_eq!(Timeframe::from_str("1m"), Ok(Timeframe::M1));
        assert_eq!(Timeframe::from_str("15m"), Ok(Timeframe::M15));
        assert_eq!(Timeframe::from_str("4h"), Ok(Timeframe::H4));
        assert_eq!(Timeframe::from_str("1d"), Ok(Timeframe::D1));
        assert_eq!(Timeframe::from_str("1w"), Ok(Timeframe::W1));
        assert_eq!(Timeframe::from_str("1M"), Ok(Timeframe::MN1));
    }

    #[test]
    fn test_timeframe_from_invalid() {
        assert_eq!(
            Timeframe::from_str("7x"),
            Err(ParseTimeframeError("7x".to_string()))
        );
    }

    #[test]
    fn test_timeframe_display_matches_as_str() {
        assert_eq!(Timeframe::H12.to_string(), "H12");
    }
}
