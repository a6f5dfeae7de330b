use rusqlite::Connection;

use crate::error::{Result, WargaError};
use crate::funds::FundSet;
use crate::models::{FundType, MAX_AMOUNT};

fn setting_key(fund: FundType) -> &'static str {
    match fund {
        FundType::Housing => "housing_dues",
        FundType::Social => "social_dues",
        FundType::Rt => "rt_dues",
    }
}

/// Monthly dues per fund, in rupiah.
pub type DuesRates = FundSet<i64>;

pub fn monthly_total(rates: &DuesRates) -> i64 {
    FundType::ALL.iter().map(|f| *rates.get(*f)).sum()
}

/// Missing or unreadable values count as zero.
pub fn get_rates(conn: &Connection) -> Result<DuesRates> {
    let mut stmt = conn.prepare("SELECT key, value FROM settings WHERE key LIKE '%_dues'")?;
    let rows: Vec<(String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut rates = DuesRates::default();
    for fund in FundType::ALL {
        let key = setting_key(fund);
        let Some((_, raw)) = rows.iter().find(|(k, _)| k == key) else {
            continue;
        };
        match raw.trim().parse::<i64>() {
            Ok(v) if (0..=MAX_AMOUNT).contains(&v) => *rates.get_mut(fund) = v,
            _ => tracing::warn!(key, value = %raw, "ignoring malformed dues setting"),
        }
    }
    Ok(rates)
}

pub fn update_rates(conn: &Connection, rates: &DuesRates) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for fund in FundType::ALL {
        let value = *rates.get(fund);
        if !(0..=MAX_AMOUNT).contains(&value) {
            return Err(WargaError::InvalidAmount(value.to_string()));
        }
        tx.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![setting_key(fund), value.to_string()],
        )?;
    }
    tx.commit()?;
    tracing::info!(
        housing = rates.housing,
        social = rates.social,
        rt = rates.rt,
        "updated dues rates"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    #[test]
    fn test_seeded_rates() {
        let (_dir, conn) = test_db();
        let rates = get_rates(&conn).unwrap();
        assert_eq!(rates.housing, 50_000);
        assert_eq!(rates.social, 20_000);
        assert_eq!(rates.rt, 10_000);
        assert_eq!(monthly_total(&rates), 80_000);
    }

    #[test]
    fn test_update_rates() {
        let (_dir, conn) = test_db();
        let rates = DuesRates {
            housing: 60_000,
            social: 25_000,
            rt: 0,
        };
        update_rates(&conn, &rates).unwrap();
        assert_eq!(get_rates(&conn).unwrap(), rates);
    }

    #[test]
    fn test_negative_rate_rejected_and_nothing_written() {
        let (_dir, conn) = test_db();
        let rates = DuesRates {
            housing: 1,
            social: -1,
            rt: 1,
        };
        assert!(update_rates(&conn, &rates).is_err());
        assert_eq!(get_rates(&conn).unwrap().housing, 50_000);
    }

    #[test]
    fn test_rate_above_max_amount_rejected() {
        let (_dir, conn) = test_db();
        let rates = DuesRates {
            housing: MAX_AMOUNT + 1,
            social: 0,
            rt: 0,
        };
        assert!(matches!(update_rates(&conn, &rates), Err(WargaError::InvalidAmount(_))));
        conn.execute("UPDATE settings SET value = '9223372036854775807' WHERE key = 'rt_dues'", [])
            .unwrap();
        let stored = get_rates(&conn).unwrap();
        assert_eq!(stored.housing, 50_000);
        assert_eq!(stored.rt, 0);
    }

    #[test]
    fn test_malformed_setting_reads_as_zero() {
        let (_dir, conn) = test_db();
        conn.execute("UPDATE settings SET value = 'lima puluh' WHERE key = 'housing_dues'", [])
            .unwrap();
        let rates = get_rates(&conn).unwrap();
        assert_eq!(rates.housing, 0);
        assert_eq!(rates.social, 20_000);
    }
}
