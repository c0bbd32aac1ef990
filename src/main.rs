use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use chd_predict::batch;
use chd_predict::{
    Assessment, Assessor, ChdError, Config, EncodingPolicy, PatientForm, SmartcoreModel,
};
use clap::{ArgAction, Parser, Subcommand};
use env_logger::{Builder, Env};
use log::{debug, error, info, LevelFilter};

#[derive(Parser, Debug)]
#[command(name = "chd-predict", author, version)]
#[command(about = "Coronary Heart Disease prediction from patient vitals", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model artifact, overrides the config file
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Reject categorical answers outside their choices instead of encoding them as 0
    #[arg(long)]
    strict: bool,

    /// Verbose level (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Predict one patient from flags
    Predict {
        #[arg(long, default_value_t = 30)]
        age: u32,
        /// Male or Female
        #[arg(long, default_value = "Male")]
        sex: String,
        /// Smoker or Non-Smoker
        #[arg(long, default_value = "Smoker")]
        smoking: String,
        /// Yes or No
        #[arg(long, default_value = "Yes")]
        diabetes: String,
        #[arg(long, default_value_t = 200.0)]
        tot_chol: f64,
        #[arg(long, default_value_t = 25.0)]
        bmi: f64,
        #[arg(long, default_value_t = 75.0)]
        heart_rate: f64,
        /// Print the assessment as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask for each field on the terminal
    Interactive {
        /// Print the assessment as JSON
        #[arg(long)]
        json: bool,
    },
    /// Score a CSV or Parquet file of patients
    Batch {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let env = Env::new().filter("CHD_LOG");
    Builder::new()
        .filter(Some("chd_predict"), log_level)
        .parse_env(env)
        .init();

    debug!("Arguments {:#?}", cli);

    if let Err(e) = run(cli) {
        error!("{}", e);
        process::exit(1);
    }
}

/// Model path and encoding policy, with flags taking precedence over the config file.
fn resolve(cli: &Cli, config: &Config) -> (PathBuf, EncodingPolicy) {
    let model_path = cli
        .model
        .clone()
        .unwrap_or_else(|| config.model.path.clone());
    let policy = if cli.strict {
        EncodingPolicy::Strict
    } else {
        config.encoding.policy
    };
    (model_path, policy)
}

fn run(cli: Cli) -> Result<(), ChdError> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let (model_path, policy) = resolve(&cli, &config);

    // The process cannot serve anything without a model.
    let model = SmartcoreModel::load(&model_path)?;
    info!(
        "Using {} model {:?} with {:?} encoding",
        model.kind(),
        model.name(),
        policy
    );
    let assessor = Assessor::new(model, policy);

    match cli.command {
        Commands::Predict {
            age,
            sex,
            smoking,
            diabetes,
            tot_chol,
            bmi,
            heart_rate,
            json,
        } => {
            let form = PatientForm {
                age,
                sex,
                is_smoking: smoking,
                diabetes,
                tot_chol,
                bmi,
                heart_rate,
            };
            let assessment = assessor.assess(&form)?;
            report(&mut io::stdout(), &assessment, &config, json)
        }
        Commands::Interactive { json } => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut output = io::stdout();
            let form = PatientForm::prompt(&mut input, &mut output)?;
            let assessment = assessor.assess(&form)?;
            report(&mut io::stdout(), &assessment, &config, json)
        }
        Commands::Batch { input, output } => {
            let summary = batch::score_file(&assessor, &input, &output)?;
            println!(
                "{} patients scored, {} with predicted Coronary Heart Disease -> {}",
                summary.rows,
                summary.positives,
                output.display()
            );
            Ok(())
        }
    }
}

fn report<W: Write>(
    out: &mut W,
    assessment: &Assessment,
    config: &Config,
    json: bool,
) -> Result<(), ChdError> {
    let variant = assessment.display(&config.display);
    if json {
        let value = serde_json::json!({
            "features": assessment.row,
            "prediction": assessment.label,
            "display": variant,
        });
        writeln!(out, "{}", value)?;
    } else {
        writeln!(out, "{}", variant)?;
    }
    Ok(())
}
