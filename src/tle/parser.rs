//! TLE parsing utilities

use chrono::{DateTime, Utc};

/// Parse TLE epoch from line 1 to UTC DateTime
pub fn parse_tle_epoch_to_utc(line1: &str) -> Option<DateTime<Utc>> {
    // TLE line1 epoch fields (columns 19–32, 1-based; 18..32 0-based)
    let s = line1.get(18..32)?;
    let mut parts = s.trim().split('.');
    let yyddd = parts.next()?;
    let frac = parts.next().unwrap_or("0");
    if yyddd.len() < 3 {
        return None;
    }
    let (yy_str, ddd_str) = yyddd.split_at(2);
    let yy: i32 = yy_str.parse().ok()?;
    let ddd: i64 = ddd_str.parse().ok()?;
    let year = if yy >= 57 { 1900 + yy } else { 2000 + yy };
    let jan1 = chrono::NaiveDate::from_ymd_opt(year, 1, 1)?;
    let date = jan1.checked_add_signed(chrono::Duration::days(ddd - 1))?;
    let frac_sec = format!("0.{}", frac).parse::<f64>().ok()? * 86400.0;
    let secs = frac_sec.trunc() as i64;
    let nanos = ((frac_sec - (secs as f64)) * 1e9).round() as i64;
    let ndt = date.and_hms_opt(0, 0, 0)?
        + chrono::Duration::seconds(secs)
        + chrono::Duration::nanoseconds(nanos);
    Some(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
}

/// Scan arbitrary text for a line 1 / line 2 pair, optionally restricted to a
/// catalog number. Returns `(name, line1, line2)`; the name is the non-TLE
/// line immediately preceding line 1, if any.
pub fn extract_tle_block(body: &str, requested_sat: Option<u32>) -> Option<(Option<String>, String, String)> {
    // trim BOM/CRLF/space
    let lines: Vec<&str> = body
        .lines()
        .map(|raw| raw.trim_matches(|c| c == '\u{feff}' || c == '\r' || c == '\n' || c == ' '))
        .filter(|line| !line.is_empty())
        .collect();

    let sat_fmt = requested_sat.map(|sat| format!("{:05}", sat));
    for i in 0..lines.len().saturating_sub(1) {
        let (l1, l2) = (lines[i], lines[i + 1]);
        if !l1.starts_with("1 ") || !l2.starts_with("2 ") {
            continue;
        }
        let sat_ok = match &sat_fmt {
            Some(sat) => l1.get(2..7) == Some(sat.as_str()) && l2.get(2..7) == Some(sat.as_str()),
            None => true,
        };
        if sat_ok {
            let name = i
                .checked_sub(1)
                .map(|p| lines[p])
                .filter(|p| !p.starts_with("1 ") && !p.starts_with("2 "))
                .map(|p| p.trim_start_matches("0 ").to_string());
            return Some((name, l1.to_string(), l2.to_string()));
        }
    }
    None
}
