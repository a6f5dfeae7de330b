const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

const MONTH_NAMES: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus", "September",
    "Oktober", "November", "Desember",
];

fn group_digits(val: u64) -> String {
    let digits = val.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped.chars().rev().collect()
}

/// Group digits in threes with dots: 1250000 -> 1.250.000
pub fn number(val: i64) -> String {
    let grouped = group_digits(val.unsigned_abs());
    if val < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Format a whole-rupiah amount: Rp 1.250.000
pub fn rupiah(val: i64) -> String {
    if val < 0 {
        format!("-Rp {}", group_digits(val.unsigned_abs()))
    } else {
        format!("Rp {}", group_digits(val.unsigned_abs()))
    }
}

/// Short axis label: 2,5jt / 750rb / 900
pub fn compact(val: i64) -> String {
    if val.unsigned_abs() >= 1_000_000 {
        format!("{:.1}jt", val as f64 / 1_000_000.0)
            .replace('.', ",")
            .replace(",0jt", "jt")
    } else if val.unsigned_abs() >= 1_000 {
        format!("{}rb", val / 1_000)
    } else {
        val.to_string()
    }
}

/// `month` is 1-based; out-of-range values come back as `"?"`.
pub fn month_abbr(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_ABBR.get(i as usize))
        .copied()
        .unwrap_or("?")
}

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
        .unwrap_or("?")
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rupiah_formatting() {
        assert_eq!(rupiah(1_250_000), "Rp 1.250.000");
        assert_eq!(rupiah(-50_000), "-Rp 50.000");
        assert_eq!(rupiah(0), "Rp 0");
        assert_eq!(rupiah(999), "Rp 999");
        assert_eq!(rupiah(1_000), "Rp 1.000");
        assert_eq!(rupiah(i64::MIN), "-Rp 9.223.372.036.854.775.808");
        assert_eq!(number(i64::MIN), "-9.223.372.036.854.775.808");
    }

    #[test]
    fn test_number_grouping() {
        assert_eq!(number(12), "12");
        assert_eq!(number(123_456_789), "123.456.789");
        assert_eq!(number(-1_000_000), "-1.000.000");
    }

    #[test]
    fn test_compact_labels() {
        assert_eq!(compact(2_500_000), "2,5jt");
        assert_eq!(compact(1_000_000), "1jt");
        assert_eq!(compact(750_000), "750rb");
        assert_eq!(compact(900), "900");
    }

    #[test]
    fn test_month_names() {
        assert_eq!(month_abbr(1), "Jan");
        assert_eq!(month_abbr(8), "Agu");
        assert_eq!(month_abbr(0), "?");
        assert_eq!(month_abbr(13), "?");
        assert_eq!(month_name(5), "Mei");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1_048_576), "3.0 MB");
    }
}
