use std::io::{self, Write};

use clinic_scheduler::display::format_report;
use clinic_scheduler::store::write_report_json;
use clinic_scheduler::{Clinic, ClinicConfig, Console, CsvStore};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "clinic_scheduler=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = ClinicConfig::from_env();
    let store = CsvStore::from_config(&config);

    let mut clinic = Clinic::from_config(&config);
    store.load_into(&mut clinic)?;
    clinic.bootstrap(&config.admin_password);
    info!(
        accounts = clinic.directory().len(),
        data_dir = %config.data_dir.display(),
        "clinic ready"
    );

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "report" {
        let report = clinic.report()?;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if args.get(2).map(String::as_str) == Some("--json") {
            write_report_json(&mut out, &report)?;
            writeln!(out)?;
        } else {
            write!(out, "{}", format_report(&report))?;
        }
        return Ok(());
    }

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout(), clinic)
        .with_store(store)
        .with_screen_clearing(true);
    console.run()?;
    Ok(())
}
