use clap::{Arg, ArgAction, ArgMatches, Command};
use crossbeam_channel::bounded;
use line_laser_launch::line_laser_data::{DeviceVersion, LaunchDescription, ResolvedLaunch};
use line_laser_launch::{
    available_ports, launch, line_laser_description, resolve, warn_missing_ports,
    LaunchError, LaunchOverrides, LaunchSettings,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn command() -> Command {
    Command::new("line-laser-launch")
        .about("Starts the line-laser serial publisher and the LiDAR processor.")
        .disable_version_flag(true)
        .arg(
            Arg::new("overrides")
                .help("Launch arguments written as <name>:=<value>")
                .value_name("NAME:=VALUE")
                .num_args(0..)
                .use_value_delimiter(false),
        )
        .arg(
            Arg::new("overrides-file")
                .long("overrides-file")
                .help("JSON object mapping launch arguments to values")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("prefix")
                .long("prefix")
                .help("Install prefix searched for executables, before AMENT_PREFIX_PATH")
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .help("Directory of per-node log files")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("show-args")
                .long("show-args")
                .help("Show the launch arguments and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("print")
                .long("print")
                .help("Print the resolved launch as JSON and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-ports")
                .long("list-ports")
                .help("List the serial ports of this machine and exit")
                .action(ArgAction::SetTrue),
        )
}

fn args_text(description: &LaunchDescription) -> String {
    let mut text = String::from("Arguments (pass arguments as '<name>:=<value>'):\n");
    for arg in &description.arguments {
        text.push_str(&format!("\n    '{}':\n", arg.name));
        text.push_str(&format!("        {}\n", arg.description));
        if !arg.choices.is_empty() {
            text.push_str(&format!(
                "        Valid choices are: {}\n",
                arg.choices.join(", ")
            ));
        }
        text.push_str(&format!("        (default: '{}')\n", arg.default_value));
    }
    text
}

fn resolved_json(resolved: &ResolvedLaunch) -> Result<String, LaunchError> {
    serde_json::to_string_pretty(resolved).map_err(|e| LaunchError::IoError(e.into()))
}

fn overrides(matches: &ArgMatches) -> Result<LaunchOverrides, LaunchError> {
    let from_cli = LaunchOverrides::parse(
        matches
            .get_many::<String>("overrides")
            .unwrap_or_default(),
    )?;
    match matches.get_one::<PathBuf>("overrides-file") {
        Some(path) => Ok(LaunchOverrides::from_json_file(path)?.merge(from_cli)),
        None => Ok(from_cli),
    }
}

fn run(matches: &ArgMatches) -> Result<bool, LaunchError> {
    if matches.get_flag("list-ports") {
        for port in available_ports()? {
            println!("{}", port);
        }
        return Ok(true);
    }

    let description = line_laser_description()?;
    if matches.get_flag("show-args") {
        print!("{}", args_text(&description));
        return Ok(true);
    }

    let resolved = resolve(&description, &overrides(matches)?)?;
    if matches.get_flag("print") {
        println!("{}", resolved_json(&resolved)?);
        return Ok(true);
    }

    if let Some(version) = resolved
        .argument("version_num")
        .and_then(|a| a.value.trim().parse::<u8>().ok())
        .and_then(|n| DeviceVersion::try_from(n).ok())
    {
        match version.angular_resolution_degree() {
            Some(step) => info!("device version: {:?} ({} deg per sample)", version, step),
            None => info!("device version: {:?}", version),
        }
    }
    warn_missing_ports(&resolved);

    let prefixes = matches
        .get_many::<PathBuf>("prefix")
        .unwrap_or_default()
        .cloned()
        .collect();
    let settings = LaunchSettings::from_env(prefixes, matches.get_one::<PathBuf>("log-dir").cloned());

    // Nodes run in their own process groups, so a signal to the launcher
    // has to be passed on.
    let (stop_tx, stop_rx) = bounded(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })?;

    let mut supervisor = launch(&resolved, &settings)?;
    let exits = supervisor.wait_until(&stop_rx);
    Ok(exits.iter().all(|e| e.success()))
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "line_laser_launch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let matches = command().get_matches();
    match run(&matches) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
