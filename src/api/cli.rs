use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::client::{HttpCalculator, Session, SubmissionOutcome, Submitter};
use crate::core::{
    CanonicalProjection, ScenarioForm, ScenarioParameters, normalize, normalize_str,
    project_report, summarize, to_csv, to_json, validate,
};

#[derive(Debug, Parser)]
#[command(name = "dc-projection", about = "Defined-contribution pension projections")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the reference calculation service.
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        bind: IpAddr,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Project a scenario locally.
    Project {
        #[command(flatten)]
        scenario: ScenarioArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Send a scenario to a calculation service, falling back to a local
    /// projection if it cannot answer.
    Submit {
        #[command(flatten)]
        scenario: ScenarioArgs,
        #[arg(long, env = "CALC_BASE_URL", default_value = "http://127.0.0.1:8080")]
        calc_base: String,
        #[arg(long, env = "CALC_TOKEN", hide_env_values = true)]
        token: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Normalize a saved calculator response.
    Normalize {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

/// Scenario inputs as typed. Validated before use.
#[derive(Debug, Args)]
struct ScenarioArgs {
    #[arg(long, default_value = "1000.00")]
    current_balance: String,
    #[arg(long, default_value = "50000.00")]
    annual_salary: String,
    #[arg(long, default_value = "10")]
    years: String,
    #[arg(long, default_value = "0.10")]
    contribution_rate: String,
    #[arg(long, default_value = "0.03")]
    salary_growth: String,
    #[arg(long, default_value = "0.05")]
    rate_of_return: String,
}

impl From<ScenarioArgs> for ScenarioForm {
    fn from(args: ScenarioArgs) -> Self {
        ScenarioForm {
            current_balance: args.current_balance,
            annual_salary: args.annual_salary,
            years: args.years,
            contribution_rate: args.contribution_rate,
            salary_growth: args.salary_growth,
            rate_of_return: args.rate_of_return,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
}

pub async fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve { bind, port } => {
            super::run_http_server(SocketAddr::new(bind, port))
                .await
                .context("server error")?;
        }
        Command::Project { scenario, format } => {
            let form = ScenarioForm::from(scenario);
            validate(&form).into_result()?;
            let report = project_report(&ScenarioParameters::from_form(&form));
            let payload = serde_json::to_value(&report)?;
            let projection = normalize(&payload).context("projection produced no rows")?;
            print_projection(&projection, format)?;
        }
        Command::Submit {
            scenario,
            calc_base,
            token,
            format,
        } => {
            let session = token.map(Session::with_token).unwrap_or_default();
            let calculator = HttpCalculator::new(calc_base)?;
            let submitter = Submitter::new(calculator, session);
            match submitter.submit(&ScenarioForm::from(scenario)).await? {
                SubmissionOutcome::Remote(projection) => print_projection(&projection, format)?,
                SubmissionOutcome::Fallback {
                    projection,
                    warning,
                } => {
                    eprintln!("{warning}");
                    print_projection(&projection, format)?;
                }
                SubmissionOutcome::Empty => bail!("calculation service returned no projection"),
                SubmissionOutcome::Stale { sequence } => {
                    bail!("submission {sequence} was superseded")
                }
            }
        }
        Command::Normalize { file, format } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let projection = normalize_str(&text)
                .with_context(|| format!("{} is not a recognised projection", file.display()))?;
            print_projection(&projection, format)?;
        }
    }
    Ok(())
}

fn print_projection(projection: &CanonicalProjection, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Csv => println!("{}", to_csv(projection)),
        OutputFormat::Json => println!("{}", to_json(projection)?),
        OutputFormat::Table => print_table(projection),
    }
    Ok(())
}

fn print_table(projection: &CanonicalProjection) {
    println!(
        "{:>5}  {:>14}  {:>12}  {:>12}  {:>14}",
        "Year", "Salary", "Contribution", "Growth", "Balance"
    );
    for row in &projection.annual_balances {
        println!(
            "{:>5}  {:>14}  {:>12}  {:>12}  {:>14}",
            row.year, row.salary, row.contribution, row.growth, row.balance
        );
    }

    let summary = summarize(projection);
    println!();
    println!("Initial balance:      {}", summary.initial_balance);
    println!("Final balance:        {}", summary.final_balance);
    println!("Total contributions:  {}", summary.total_contributions);
    println!("Growth rate (CAGR):   {:.2}%", summary.cagr_percent);
}
