//! pack-deploy CLI entrypoint.
//!
//! This is the main entrypoint for the pack-deploy command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use pack_deploy::cli::{Cli, Commands, OutputFormat, OutputFormatter, TerminalUi};
use pack_deploy::cluster::{ClusterClient, HttpClusterClient};
use pack_deploy::config::{ConfigParser, ConfigValidator, DriverConfig, find_config_file};
use pack_deploy::deploy::{DeployerError, DeploymentDriver, list_deployments};
use pack_deploy::error::{PackError, Result};
use pack_deploy::templates::Templates;
use pack_deploy::ui::Ui;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.output == OutputFormat::Json);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
///
/// `RUST_LOG` wins over `--verbose` when set. JSON output switches log lines
/// to JSON as well.
fn init_logging(verbose: bool, json: bool) {
    let subscriber = log_subscriber(verbose, json, std::io::stderr);
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialize logging: {e}");
    }
}

/// Builds the log subscriber writing to `writer`.
fn log_subscriber<W>(
    verbose: bool,
    json: bool,
    writer: W,
) -> Box<dyn tracing::Subscriber + Send + Sync>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(writer);

    if json {
        Box::new(builder.json().finish())
    } else {
        Box::new(builder.finish())
    }
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let ui = TerminalUi::new(cli.output);
    let session = Session::load(cli.config.as_ref())?;

    match cli.command {
        Commands::Validate { templates } => {
            cmd_validate(&session, templates.as_deref(), &ui, &formatter).await
        }
        Commands::Plan { templates } => {
            cmd_plan(&session, templates.as_deref(), &ui, &formatter).await
        }
        Commands::Run { templates, yes } => {
            cmd_run(&session, templates.as_deref(), yes, &ui, &formatter).await
        }
        Commands::Destroy { yes } => cmd_destroy(&session, yes, &ui, &formatter).await,
        Commands::Status => cmd_status(&session, &formatter).await,
    }
}

/// Validate templates against the cluster.
async fn cmd_validate(
    session: &Session,
    templates: Option<&Path>,
    ui: &TerminalUi,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut driver = session.driver(templates, ui, formatter)?;
    validate(&mut driver, ui, formatter).await?;

    ui.success(&format!(
        "Templates for deployment '{}' are valid",
        driver.config().deployment_name()
    ));
    Ok(())
}

/// Show the deployment plan.
async fn cmd_plan(
    session: &Session,
    templates: Option<&Path>,
    ui: &TerminalUi,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut driver = session.driver(templates, ui, formatter)?;
    validate(&mut driver, ui, formatter).await?;
    plan(&mut driver, ui, formatter).await?;
    Ok(())
}

/// Deploy the rendered templates.
async fn cmd_run(
    session: &Session,
    templates: Option<&Path>,
    auto_approve: bool,
    ui: &TerminalUi,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut driver = session.driver(templates, ui, formatter)?;
    validate(&mut driver, ui, formatter).await?;
    let changes = plan(&mut driver, ui, formatter).await?;

    if !changes {
        eprintln!("No changes to apply.");
        return Ok(());
    }

    // Confirm
    if !auto_approve && !confirm("Do you want to deploy these changes? [y/N]: ", "y")? {
        eprintln!("Deploy cancelled.");
        return Ok(());
    }

    let context = driver.error_context();
    if let Err(e) = driver.deploy(ui, &context).await {
        report(ui, formatter, std::slice::from_ref(&e));
        return Err(e.error);
    }

    ui.success(&format!(
        "Deployment '{}' is running",
        driver.config().deployment_name()
    ));
    Ok(())
}

/// Destroy the deployment.
async fn cmd_destroy(
    session: &Session,
    auto_approve: bool,
    ui: &TerminalUi,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = session.config.deployment_config()?;
    let name = config.deployment_name().to_string();

    if !auto_approve {
        eprintln!("Every object tagged with deployment '{name}' will be removed.");
        if !confirm("This action is IRREVERSIBLE. Type 'destroy' to confirm: ", "destroy")? {
            eprintln!("Destruction cancelled.");
            return Ok(());
        }
    }

    let mut driver = DeploymentDriver::new(config, Arc::clone(&session.client));
    report_errors(ui, formatter, driver.bind_all_kinds())?;
    report_errors(ui, formatter, driver.destroy(ui).await)?;

    ui.success(&format!("Deployment '{name}' destroyed"));
    Ok(())
}

/// List deployments in the cluster.
async fn cmd_status(session: &Session, formatter: &OutputFormatter) -> Result<()> {
    let deployments = list_deployments(session.client.as_ref()).await?;
    eprintln!("{}", formatter.format_status(&deployments));
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Loaded configuration and cluster client.
struct Session {
    config: DriverConfig,
    client: Arc<dyn ClusterClient>,
}

impl Session {
    /// Loads and validates the driver configuration, then connects.
    fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let config_file = resolve_config_path(config_path)?;
        debug!("Loading configuration from: {}", config_file.display());

        let parser =
            ConfigParser::new().with_base_path(config_file.parent().unwrap_or_else(|| Path::new(".")));
        parser.load_dotenv()?;

        let config = parser.load_with_env(&config_file)?;

        // Validate
        let result = ConfigValidator::new().validate(&config)?;
        for warning in &result.warnings {
            warn!("{warning}");
        }

        let token = ConfigParser::cluster_token();
        let client = HttpClusterClient::with_timeout(
            &config.cluster.address,
            token.as_deref(),
            config.cluster.timeout_secs,
        )?;
        info!("Using cluster at {}", config.cluster.address);

        Ok(Self {
            config,
            client: Arc::new(client),
        })
    }

    /// Builds a driver loaded with the rendered templates.
    fn driver(
        &self,
        templates: Option<&Path>,
        ui: &TerminalUi,
        formatter: &OutputFormatter,
    ) -> Result<DeploymentDriver> {
        let dir = templates.unwrap_or(&self.config.templates);
        let templates = Templates::load_dir(dir)?;
        info!("Loaded {} rendered template(s) from {}", templates.len(), dir.display());

        let mut driver =
            DeploymentDriver::new(self.config.deployment_config()?, Arc::clone(&self.client));
        report_errors(ui, formatter, driver.load(templates))?;
        Ok(driver)
    }
}

/// Runs every validation stage, failing on the first stage with errors.
async fn validate(
    driver: &mut DeploymentDriver,
    ui: &TerminalUi,
    formatter: &OutputFormatter,
) -> Result<()> {
    let context = driver.error_context();
    report_errors(ui, formatter, driver.validate(&context).await)
}

/// Plans every deployer. Returns true if anything would change.
async fn plan(
    driver: &mut DeploymentDriver,
    ui: &TerminalUi,
    formatter: &OutputFormatter,
) -> Result<bool> {
    report_errors(ui, formatter, driver.plan(ui).await)?;

    let plans = driver.plans();
    if formatter_is_json(formatter) {
        eprintln!("{}", formatter.format_plans(&plans));
    }
    Ok(plans.iter().any(|p| !p.is_noop()))
}

fn formatter_is_json(formatter: &OutputFormatter) -> bool {
    formatter.format() == OutputFormat::Json
}

/// Prints every error and fails if there were any.
fn report_errors(
    ui: &TerminalUi,
    formatter: &OutputFormatter,
    errors: Vec<DeployerError>,
) -> Result<()> {
    if errors.is_empty() {
        return Ok(());
    }

    report(ui, formatter, &errors);
    let count = errors.len();
    match errors.into_iter().next() {
        Some(only) if count == 1 => Err(only.error),
        _ => Err(PackError::internal(format!("{count} errors reported"))),
    }
}

fn report(ui: &TerminalUi, formatter: &OutputFormatter, errors: &[DeployerError]) {
    if formatter_is_json(formatter) {
        eprintln!("{}", formatter.format_errors(errors));
        return;
    }
    for error in errors {
        ui.error_with_context(error);
    }
}

/// Asks on stderr and compares the answer with `expected`.
fn confirm(prompt: &str, expected: &str) -> Result<bool> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case(expected))
}

/// Resolves the configuration file path.
fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    config_path.map_or_else(|| find_config_file("."), |path| Ok(path.clone()))
}
