use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use staff_directory::departments;
use staff_directory::export_sheets;
use staff_directory::Config;
use staff_directory::DirectoryBuilder;
use staff_directory::DirectorySnapshot;
use staff_directory::Entry;
use staff_directory::Field;
use staff_directory::Query;
use staff_directory::SnapshotStore;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Extract and search the staff phone directory of a spreadsheet workbook.")]
struct Args {
    /// TOML file overriding the data directory and record schemas.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract both record lists from a workbook and save them.
    Load {
        workbook: PathBuf,

        /// Directory for osfr.json and ks.json (default: from config).
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Search the saved records.
    Search {
        #[arg(long, value_enum, default_value_t = Kind::Staff)]
        kind: Kind,

        /// Case-insensitive text to look for.
        #[arg(long, default_value = "")]
        query: String,

        /// Exact department name.
        #[arg(long)]
        department: Option<String>,

        /// Fields searched by --query (repeatable; default: names and phones).
        #[arg(long = "field", value_enum)]
        fields: Vec<Field>,

        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },

    /// List the departments of the saved records.
    Departments {
        #[arg(long, value_enum, default_value_t = Kind::Staff)]
        kind: Kind,

        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Write every sheet of a workbook to its own JSON file.
    Dump {
        workbook: PathBuf,

        #[arg(long, value_name = "DIR", default_value = "output")]
        output_dir: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Staff,
    Client,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => Config::default(),
    };
    let store = |data_dir: Option<PathBuf>| SnapshotStore::new(data_dir.unwrap_or_else(|| config.data_dir.clone()));

    match args.command {
        Command::Load { workbook, data_dir } => {
            let outcome = DirectoryBuilder::from_config(&config)
                .build(&workbook)
                .with_context(|| format!("Failed to load '{}'", workbook.display()))?;
            for mismatch in &outcome.mismatches {
                eprintln!("warning: {mismatch}");
            }
            let snapshot = outcome.snapshot;
            let store = store(data_dir);
            store.save(&snapshot).context("Failed to save snapshot")?;
            println!(
                "{} staff and {} client service records saved to {}",
                snapshot.staff.len(),
                snapshot.client_service.len(),
                store.dir().display()
            );
        }
        Command::Search { kind, query, department, fields, data_dir } => {
            let snapshot = load_snapshot(&store(data_dir))?;
            let mut query = Query::text(&query);
            query.department = department;
            if !fields.is_empty() {
                query.fields = fields;
            }
            match kind {
                Kind::Staff => print_rows(query.apply(&snapshot.staff)),
                Kind::Client => print_rows(query.apply(&snapshot.client_service)),
            }
        }
        Command::Departments { kind, data_dir } => {
            let snapshot = load_snapshot(&store(data_dir))?;
            let names = match kind {
                Kind::Staff => departments(&snapshot.staff),
                Kind::Client => departments(&snapshot.client_service),
            };
            for name in names {
                println!("{name}");
            }
        }
        Command::Dump { workbook, output_dir } => {
            let stats = export_sheets(&workbook, &output_dir)
                .with_context(|| format!("Failed to export '{}'", workbook.display()))?;
            for sheet in &stats.sheets {
                println!("{}: {}/{} rows", sheet.json_file, sheet.filtered_rows, sheet.original_rows);
            }
        }
    }
    Ok(())
}

fn load_snapshot(store: &SnapshotStore) -> Result<DirectorySnapshot> {
    store
        .load()
        .with_context(|| format!("Failed to read snapshot from '{}'", store.dir().display()))
}

const COLUMNS: [Field; 8] = [
    Field::LastName,
    Field::FirstName,
    Field::Patronymic,
    Field::ExternalPhone,
    Field::InternalPhone,
    Field::Position,
    Field::Department,
    Field::Location,
];

fn print_rows<E: Entry>(records: Vec<&E>) {
    for record in records {
        let values: Vec<&str> = COLUMNS.iter().map(|field| record.field(*field)).collect();
        println!("{}", values.join("\t"));
    }
}
