use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::admins::{add_admin, count_admins};
use crate::announcements::create_announcement;
use crate::arrears::YearMonth;
use crate::db::{get_metadata, init_db, set_metadata};
use crate::error::Result;
use crate::ledger::add_mutation;
use crate::models::{FundType, MutationKind, NewMutation};
use crate::payments::{approve_payment_at, submit_payment};
use crate::residents::{add_resident, count_residents, ResidentForm};
use crate::settings::get_data_dir;

use super::{open_db, today};

struct DemoResident {
    username: &'static str,
    full_name: &'static str,
    house: &'static str,
    phone: &'static str,
    occupancy: &'static str,
}

const RESIDENTS: &[DemoResident] = &[
    DemoResident { username: "budi", full_name: "Budi Santoso", house: "A-01", phone: "0812-1111-2001", occupancy: "dihuni" },
    DemoResident { username: "sari", full_name: "Sari Wulandari", house: "A-02", phone: "0812-1111-2002", occupancy: "dihuni" },
    DemoResident { username: "agus", full_name: "Agus Prasetyo", house: "A-03", phone: "0813-2222-3003", occupancy: "kontrak" },
    DemoResident { username: "dewi", full_name: "Dewi Lestari", house: "A-04", phone: "0813-2222-3004", occupancy: "dihuni" },
    DemoResident { username: "hendra", full_name: "Hendra Gunawan", house: "B-01", phone: "0815-3333-4001", occupancy: "dihuni" },
    DemoResident { username: "rina", full_name: "Rina Marlina", house: "B-02", phone: "0815-3333-4002", occupancy: "kontrak" },
    DemoResident { username: "yusuf", full_name: "Yusuf Hidayat", house: "B-03", phone: "0817-4444-5003", occupancy: "dihuni" },
    DemoResident { username: "wati", full_name: "Wati Susilawati", house: "B-04", phone: "0817-4444-5004", occupancy: "kosong" },
];

/// (day, fund, description, category, amount)
const MONTHLY_EXPENSES: &[(u32, FundType, &str, &str, i64)] = &[
    (10, FundType::Housing, "Perawatan taman dan lampu jalan", "Pemeliharaan", 120_000),
    (25, FundType::Housing, "Honor petugas keamanan", "Keamanan", 200_000),
    (15, FundType::Rt, "Konsumsi rapat RT", "Kegiatan", 45_000),
];

const OPENING_BALANCES: &[(FundType, i64)] = &[
    (FundType::Housing, 2_500_000),
    (FundType::Social, 750_000),
    (FundType::Rt, 400_000),
];

fn at(year: i32, month: u32, day: u32, hour: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day).and_then(|d| d.and_hms_opt(hour, 0, 0))
}

/// Months of the current year resident `idx` has paid, giving a spread of
/// paid-up, unpaid and in-arrears households.
fn paid_months(idx: usize, today: NaiveDate) -> Vec<YearMonth> {
    let current = today.month();
    let year = today.year();
    let months: Vec<u32> = match idx % 4 {
        0 => (1..=current).collect(),
        1 => (1..current).collect(),
        2 => (1..=current).filter(|m| *m != 2 || current <= 2).collect(),
        _ => (1..current.saturating_sub(1)).collect(),
    };
    months
        .into_iter()
        .filter_map(|m| YearMonth::new(year, m))
        .collect()
}

pub struct DemoCounts {
    pub residents: usize,
    pub payments: usize,
    pub mutations: usize,
}

pub(crate) fn insert_demo_data(conn: &Connection, today: NaiveDate) -> Result<DemoCounts> {
    let year = today.year();
    let mut counts = DemoCounts {
        residents: 0,
        payments: 0,
        mutations: 0,
    };

    if count_admins(conn)? == 0 {
        add_admin(conn, "admin", "Administrator")?;
    }
    if get_metadata(conn, "community_name").is_none() {
        set_metadata(conn, "community_name", "Perumahan Griya Asri RT 05")?;
    }

    for (fund, amount) in OPENING_BALANCES {
        add_mutation(
            conn,
            &NewMutation {
                kind: MutationKind::In,
                amount: *amount,
                description: format!("Saldo awal {}", fund.label()),
                category: Some("Saldo Awal".to_string()),
                fund: Some(*fund),
                date: at(year - 1, 12, 31, 12),
                proof_image: None,
            },
        )?;
        counts.mutations += 1;
    }

    for (idx, r) in RESIDENTS.iter().enumerate() {
        let user_id = add_resident(
            conn,
            &ResidentForm {
                username: r.username.to_string(),
                full_name: r.full_name.to_string(),
                house_number: Some(r.house.to_string()),
                phone: Some(r.phone.to_string()),
                occupancy_status: Some(r.occupancy.to_string()),
            },
        )?;
        counts.residents += 1;

        for ym in paid_months(idx, today) {
            let payment_id = submit_payment(conn, user_id, &[ym], None)?;
            if let Some(approved_at) = at(ym.year, ym.month, 5, 9) {
                counts.mutations += approve_payment_at(conn, payment_id, approved_at)?.len();
            }
            counts.payments += 1;
        }
        // Households behind on the current month have a transfer waiting for review.
        if idx % 4 == 1 {
            submit_payment(conn, user_id, &[YearMonth::of(today)], None)?;
            counts.payments += 1;
        }
    }

    for month in 1..=today.month() {
        for (day, fund, description, category, amount) in MONTHLY_EXPENSES {
            if *fund == FundType::Rt && month % 2 == 0 {
                continue;
            }
            add_mutation(
                conn,
                &NewMutation {
                    kind: MutationKind::Out,
                    amount: *amount,
                    description: description.to_string(),
                    category: Some(category.to_string()),
                    fund: Some(*fund),
                    date: at(year, month, *day, 10),
                    proof_image: None,
                },
            )?;
            counts.mutations += 1;
        }
    }
    add_mutation(
        conn,
        &NewMutation {
            kind: MutationKind::Out,
            amount: 300_000,
            description: "Santunan warga sakit".to_string(),
            category: Some("Sosial".to_string()),
            fund: Some(FundType::Social),
            date: at(year, 1, 20, 16),
            proof_image: None,
        },
    )?;
    counts.mutations += 1;

    create_announcement(
        conn,
        "Kerja bakti bulanan",
        "Kerja bakti membersihkan saluran air dilaksanakan Minggu pertama setiap bulan pukul 07.00. Mohon kehadiran seluruh warga.",
        "kegiatan",
    )?;
    create_announcement(
        conn,
        "Pembayaran iuran",
        "Iuran bulanan dibayarkan paling lambat tanggal 10. Unggah bukti transfer melalui `warga payments submit`.",
        "keuangan",
    )?;

    Ok(counts)
}

pub fn run() -> Result<()> {
    let conn = open_db(&get_data_dir())?;
    init_db(&conn)?;

    // Idempotency guard
    if count_residents(&conn)? > 0 {
        println!("Residents already registered; demo data not loaded.");
        return Ok(());
    }

    let counts = insert_demo_data(&conn, today())?;

    println!("Demo data loaded!");
    println!("  Residents:  {}", counts.residents);
    println!("  Payments:   {}", counts.payments);
    println!("  Mutations:  {}", counts.mutations);
    println!();
    println!("Try these next:");
    println!("  warga report");
    println!("  warga matrix");
    println!("  warga payments list --status pending");
    println!("  warga --as budi payments mine");
    Ok(())
}
