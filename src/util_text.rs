/// Base units per whole coin (6 decimals)
const COIN: u64 = 1_000_000;

/// Format a coin amount in human-readable format
/// Examples: "12.50 LIBRA", "0 LIBRA", "250 units"
pub fn format_coin(units: u64) -> String {
    if units == 0 {
        "0 LIBRA".to_string()
    } else if units >= COIN {
        let whole = units / COIN;
        let frac = (units % COIN) * 100 / COIN;
        if frac == 0 {
            format!("{whole} LIBRA")
        } else {
            format!("{whole}.{frac:02} LIBRA")
        }
    } else {
        format!("{units} units")
    }
}

/// Format coin amount with compact suffix for status lines (e.g., "1.2M")
pub fn format_coin_compact(units: u64) -> String {
    const BILLION: u64 = 1_000_000_000;
    const MILLION: u64 = 1_000_000;
    const THOUSAND: u64 = 1_000;

    let whole = units / COIN;
    if whole >= BILLION {
        format!("{:.1}B", whole as f64 / BILLION as f64)
    } else if whole >= MILLION {
        format!("{:.1}M", whole as f64 / MILLION as f64)
    } else if whole >= THOUSAND {
        format!("{:.1}K", whole as f64 / THOUSAND as f64)
    } else {
        whole.to_string()
    }
}

/// Render a ledger timestamp (microseconds since the unix epoch, as the node
/// sends it) in UTC. The raw string is returned when it does not parse.
pub fn format_ledger_timestamp(micros: &str) -> String {
    let Ok(us) = micros.trim().parse::<i64>() else {
        return micros.to_string();
    };
    match chrono::DateTime::from_timestamp_micros(us) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => micros.to_string(),
    }
}

/// "0x1234…cdef" for long addresses
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 14 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

/// "2h 05m", "4m 10s", "12s"
pub fn format_secs(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h {m:02}m")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_coin() {
        assert_eq!(format_coin(0), "0 LIBRA");
        assert_eq!(format_coin(12_500_000), "12.50 LIBRA");
        assert_eq!(format_coin(3_000_000), "3 LIBRA");
        assert_eq!(format_coin(250), "250 units");
        assert_eq!(format_coin_compact(1_500_000 * COIN), "1.5M");
    }

    #[test]
    fn test_ledger_timestamp() {
        assert_eq!(
            format_ledger_timestamp("1700000000000000"),
            "2023-11-14 22:13:20 UTC"
        );
        assert_eq!(format_ledger_timestamp("soon"), "soon");
    }

    #[test]
    fn test_short_address() {
        assert_eq!(short_address("0x1"), "0x1");
        assert_eq!(
            short_address("0x87515d94a244235a1433d7117bc0cb154c613c2f4b1e67ca8d98a542ee3f59f5"),
            "0x8751…59f5"
        );
        assert_eq!(format_secs(7_500), "2h 05m");
        assert_eq!(format_secs(250), "4m 10s");
    }
}
