use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use folio::build::build_site;
use folio::config::Config;
use std::path::PathBuf;

fn main() {
    tracing_subscriber::fmt::init();

    let matches = App::new("folio")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Indexes the content and writes the site data")
                .arg(
                    Arg::with_name("project")
                        .long("project")
                        .short("p")
                        .takes_value(true)
                        .help("The directory to search for `folio.yaml` (default: the current directory)"),
                )
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .help("The output directory (default: `_output` next to the project)"),
                )
                .arg(
                    Arg::with_name("threads")
                        .long("threads")
                        .short("t")
                        .takes_value(true)
                        .help("The number of threads used to load documents (default: one per CPU)"),
                ),
        )
        .get_matches();

    if let ("build", Some(matches)) = matches.subcommand() {
        if let Err(e) = build(matches) {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    }
}

fn build(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let project = match matches.value_of("project") {
        Some(project) => std::fs::canonicalize(project)?,
        None => std::env::current_dir()?,
    };
    let output = match matches.value_of("output") {
        Some(output) => PathBuf::from(output),
        None => project.join("_output"),
    };
    let threads = match matches.value_of("threads") {
        Some(threads) => Some(threads.parse::<usize>().map_err(|e| {
            format!("invalid value for `--threads`: {}", e)
        })?),
        None => None,
    };

    let config = Config::from_directory(&project, &output, threads)?;
    let report = build_site(&config, chrono::Utc::now())?;

    for (collection, documents) in &report.collections {
        println!("{}: {} documents", collection, documents);
    }
    if !report.invalid.is_empty() {
        eprintln!("{} documents were excluded:", report.invalid.len());
        for invalid in &report.invalid {
            eprintln!("  {}", invalid);
        }
    }
    if !report.is_success() {
        let collisions = report
            .collisions
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        return Err(collisions.into());
    }
    Ok(())
}
