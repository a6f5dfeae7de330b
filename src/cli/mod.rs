pub mod admins;
pub mod announcements;
pub mod backup;
pub mod dashboard;
pub mod demo;
pub mod dues;
pub mod init;
pub mod load;
pub mod login;
pub mod matrix;
pub mod mutations;
pub mod payments;
pub mod report;
pub mod residents;
pub mod status;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::auth::{find_principal, require_admin, Principal};
use crate::db::get_connection;
use crate::error::{Result, WargaError};
use crate::funds::Period;
use crate::settings::{db_path, load_settings};

// ---------------------------------------------------------------------------
// Command boundary
// ---------------------------------------------------------------------------

pub(crate) fn open_db(data_dir: &std::path::Path) -> Result<Connection> {
    let path = db_path(data_dir);
    if !path.exists() {
        return Err(WargaError::Settings(format!(
            "No database found at {}. Run `warga init` first.",
            path.display()
        )));
    }
    get_connection(&path)
}

/// An open database plus the user the command acts for.
pub(crate) struct Session {
    pub conn: Connection,
    pub principal: Principal,
    pub data_dir: PathBuf,
}

impl Session {
    pub fn open(as_user: Option<&str>) -> Result<Self> {
        let settings = load_settings();
        let data_dir = PathBuf::from(&settings.data_dir);
        let conn = open_db(&data_dir)?;
        let username = as_user
            .map(str::to_string)
            .or_else(|| Some(settings.user_name).filter(|u| !u.is_empty()))
            .ok_or(WargaError::NoPrincipal)?;
        let principal = find_principal(&conn, &username)?;
        tracing::debug!(user = %principal.username, role = principal.role.as_str(), "session opened");
        Ok(Self {
            conn,
            principal,
            data_dir,
        })
    }

    pub fn admin(as_user: Option<&str>) -> Result<Self> {
        let session = Self::open(as_user)?;
        require_admin(&session.principal)?;
        Ok(session)
    }
}

/// `--month` takes `YYYY-MM` or a bare `MM`; `--year` fills in a bare month.
pub(crate) fn parse_period(
    month: Option<&str>,
    year: Option<i32>,
    before: Option<&str>,
    today: NaiveDate,
) -> Result<Period> {
    if let Some(raw) = before {
        let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|_| WargaError::Other(format!("Invalid date: {raw} (expected YYYY-MM-DD)")))?;
        return Ok(Period::Before(date));
    }
    let (year, month) = match month.map(str::trim) {
        Some(raw) if raw.contains('-') => {
            let ym: crate::arrears::YearMonth = raw.parse()?;
            (Some(ym.year), Some(ym.month))
        }
        Some(raw) => {
            let m = raw
                .parse::<u32>()
                .map_err(|_| WargaError::InvalidMonth(raw.to_string()))?;
            (year, Some(m))
        }
        None => (year, None),
    };
    Period::from_filters(year, month, today)
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "warga",
    version,
    about = "Dues, fund ledger and resident bookkeeping for residential communities."
)]
pub struct Cli {
    /// Act as this user instead of the one saved by `warga login`
    #[arg(long = "as", global = true, value_name = "USERNAME")]
    pub as_user: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up warga: choose a data directory and initialize the database.
    Init {
        /// Path for warga data (default: ~/Documents/warga)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Community name shown on the dashboard and reports
        #[arg(long)]
        community: Option<String>,
    },
    /// Choose which user later commands act as.
    Login {
        username: String,
    },
    /// Switch to an existing warga data directory.
    Load {
        /// Path to data directory containing warga.db
        path: String,
    },
    /// Back up the database.
    Backup {
        /// Output path (default: <data_dir>/backups/warga-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show current database and summary statistics.
    Status,
    /// Load sample residents, payments and expenses.
    Demo,
    /// Interactive dashboard (the default when no command is given).
    Dashboard,
    /// Fund balances and the grouped mutation list for a period.
    Report {
        /// Month filter: YYYY-MM, or MM together with --year
        #[arg(long)]
        month: Option<String>,
        /// Year filter: YYYY
        #[arg(long)]
        year: Option<i32>,
        /// Everything dated before this day: YYYY-MM-DD
        #[arg(long, conflicts_with_all = ["month", "year"])]
        before: Option<String>,
    },
    /// Fund mutation ledger.
    Mutations {
        #[command(subcommand)]
        command: MutationsCommands,
    },
    /// Residents x months grid of paid dues.
    Matrix {
        /// Year to show (default: current year)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Dues payments.
    Payments {
        #[command(subcommand)]
        command: PaymentsCommands,
    },
    /// Resident registry.
    Residents {
        #[command(subcommand)]
        command: ResidentsCommands,
    },
    /// Administrator accounts.
    Admins {
        #[command(subcommand)]
        command: AdminsCommands,
    },
    /// Community announcements.
    Announcements {
        #[command(subcommand)]
        command: AnnouncementsCommands,
    },
    /// Monthly dues per fund.
    Dues {
        #[command(subcommand)]
        command: DuesCommands,
    },
}

#[derive(Subcommand)]
pub enum MutationsCommands {
    /// List mutations, payment fan-outs collapsed into one row.
    List {
        #[arg(long)]
        month: Option<String>,
        #[arg(long)]
        year: Option<i32>,
    },
    /// Record a manual mutation.
    Add {
        /// Direction: in or out
        #[arg(long = "type")]
        kind: String,
        /// Amount in rupiah, e.g. 150000 or 150.000
        #[arg(long)]
        amount: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: Option<String>,
        /// Fund: housing, social or rt
        #[arg(long)]
        fund: Option<String>,
        /// Date: YYYY-MM-DD (default: now)
        #[arg(long)]
        date: Option<String>,
        /// Path to a proof image to attach
        #[arg(long)]
        proof: Option<String>,
    },
    /// Delete a mutation by ID.
    Delete {
        id: i64,
    },
    /// Export the grouped ledger to CSV.
    Export {
        #[arg(long)]
        month: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        /// Output file (default: <data_dir>/exports/mutations-YYYYMMDD-HHMMSS.csv)
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PaymentsCommands {
    /// Submit dues for one or more months.
    Submit {
        /// Comma-separated months: 2024-01,2024-02
        months: String,
        /// Path to a transfer receipt image
        #[arg(long)]
        proof: Option<String>,
    },
    /// List your own payments.
    Mine,
    /// List all payments.
    List {
        /// pending, approved or rejected
        #[arg(long)]
        status: Option<String>,
    },
    /// Approve a pending payment and post it to the funds.
    Approve {
        id: i64,
    },
    /// Reject a pending payment.
    Reject {
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ResidentsCommands {
    /// List residents ordered by house number.
    List {
        /// Match against name or house number
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Register a resident.
    Add {
        username: String,
        #[arg(long = "name")]
        full_name: String,
        #[arg(long)]
        house: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Occupancy status (default: dihuni)
        #[arg(long)]
        occupancy: Option<String>,
    },
    /// Show one resident with their dues status.
    Show {
        /// Resident ID or username
        resident: String,
    },
    /// Update a resident; omitted fields keep their value.
    Update {
        id: i64,
        #[arg(long)]
        username: Option<String>,
        #[arg(long = "name")]
        full_name: Option<String>,
        #[arg(long)]
        house: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        occupancy: Option<String>,
    },
    /// Delete a resident and their payments.
    Delete {
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum AdminsCommands {
    List,
    Add {
        username: String,
        #[arg(long = "name")]
        full_name: String,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum AnnouncementsCommands {
    List {
        /// Category filter, or "all"
        #[arg(long, default_value = crate::announcements::ALL_CATEGORIES)]
        category: String,
    },
    Add {
        title: String,
        content: String,
        #[arg(long, default_value = "umum")]
        category: String,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum DuesCommands {
    Show,
    /// Change monthly dues; omitted funds keep their rate.
    Set {
        #[arg(long)]
        housing: Option<String>,
        #[arg(long)]
        social: Option<String>,
        #[arg(long)]
        rt: Option<String>,
    },
}
