mod admins;
mod announcements;
mod arrears;
mod auth;
mod cli;
mod db;
mod dues;
mod error;
mod fmt;
mod funds;
mod grouping;
mod ledger;
mod models;
mod payments;
mod reports;
mod residents;
mod settings;
mod storage;
mod tui;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{
    AdminsCommands, AnnouncementsCommands, Cli, Commands, DuesCommands, MutationsCommands,
    PaymentsCommands, ResidentsCommands,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_env("WARGA_LOG").unwrap_or_else(|_| EnvFilter::new("warga=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let as_user = cli.as_user.as_deref();

    let result = match cli.command {
        None | Some(Commands::Dashboard) => cli::dashboard::run(as_user),
        Some(Commands::Init { data_dir, community }) => cli::init::run(data_dir, community),
        Some(Commands::Login { username }) => cli::login::run(&username),
        Some(Commands::Load { path }) => cli::load::run(&path),
        Some(Commands::Backup { output }) => cli::backup::run(output),
        Some(Commands::Status) => cli::status::run(as_user),
        Some(Commands::Demo) => cli::demo::run(),
        Some(Commands::Report {
            month,
            year,
            before,
        }) => cli::report::run(as_user, month.as_deref(), year, before.as_deref()),
        Some(Commands::Mutations { command }) => match command {
            MutationsCommands::List { month, year } => {
                cli::mutations::list(as_user, month.as_deref(), year)
            }
            MutationsCommands::Add {
                kind,
                amount,
                description,
                category,
                fund,
                date,
                proof,
            } => cli::mutations::add(
                as_user,
                cli::mutations::AddArgs {
                    kind,
                    amount,
                    description,
                    category,
                    fund,
                    date,
                    proof,
                },
            ),
            MutationsCommands::Delete { id } => cli::mutations::delete(as_user, id),
            MutationsCommands::Export {
                month,
                year,
                output,
            } => cli::mutations::export(as_user, month.as_deref(), year, output),
        },
        Some(Commands::Matrix { year }) => cli::matrix::run(as_user, year),
        Some(Commands::Payments { command }) => match command {
            PaymentsCommands::Submit { months, proof } => {
                cli::payments::submit(as_user, &months, proof.as_deref())
            }
            PaymentsCommands::Mine => cli::payments::mine(as_user),
            PaymentsCommands::List { status } => cli::payments::list(as_user, status.as_deref()),
            PaymentsCommands::Approve { id } => cli::payments::approve(as_user, id),
            PaymentsCommands::Reject { id } => cli::payments::reject(as_user, id),
        },
        Some(Commands::Residents { command }) => match command {
            ResidentsCommands::List { search } => cli::residents::list(as_user, &search),
            ResidentsCommands::Add {
                username,
                full_name,
                house,
                phone,
                occupancy,
            } => cli::residents::add(
                as_user,
                crate::residents::ResidentForm {
                    username,
                    full_name,
                    house_number: house,
                    phone,
                    occupancy_status: occupancy,
                },
            ),
            ResidentsCommands::Show { resident } => cli::residents::show(as_user, &resident),
            ResidentsCommands::Update {
                id,
                username,
                full_name,
                house,
                phone,
                occupancy,
            } => cli::residents::update(
                as_user,
                id,
                cli::residents::ResidentChanges {
                    username,
                    full_name,
                    house_number: house,
                    phone,
                    occupancy_status: occupancy,
                },
            ),
            ResidentsCommands::Delete { id } => cli::residents::delete(as_user, id),
        },
        Some(Commands::Admins { command }) => match command {
            AdminsCommands::List => cli::admins::list(as_user),
            AdminsCommands::Add {
                username,
                full_name,
            } => cli::admins::add(as_user, &username, &full_name),
            AdminsCommands::Delete { id } => cli::admins::delete(as_user, id),
        },
        Some(Commands::Announcements { command }) => match command {
            AnnouncementsCommands::List { category } => {
                cli::announcements::list(as_user, &category)
            }
            AnnouncementsCommands::Add {
                title,
                content,
                category,
            } => cli::announcements::add(as_user, &title, &content, &category),
            AnnouncementsCommands::Delete { id } => cli::announcements::delete(as_user, id),
        },
        Some(Commands::Dues { command }) => match command {
            DuesCommands::Show => cli::dues::show(as_user),
            DuesCommands::Set { housing, social, rt } => {
                cli::dues::set(as_user, housing.as_deref(), social.as_deref(), rt.as_deref())
            }
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
