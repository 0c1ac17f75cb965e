use clap::{Args, Parser, Subcommand};
use cot_agents::{
    agent::Orchestrator,
    config::AgentConfig,
    features::extract_features,
    llm::{build_model, LanguageModel},
    models::{AdvisoryCase, FraudCase, ReasoningRun},
    recommendation::{ProductRecommender, ShopperCase},
    report::{parse_fraud_report, FraudReport},
    tasks::{fraud::DEFAULT_GOAL, FinancialAdvisorTask, FraudAnalysisTask},
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEMO_PROFILE: &str = include_str!("../../demos/financial_profile.json");
const DEMO_FRAUD_CASE: &str = include_str!("../../demos/fraud_case.json");
const DEMO_SHOPPER: &str = include_str!("../../demos/recommendation_case.json");

#[derive(Debug, Parser)]
#[command(name = "reasoner", about = "Chain-of-thought reasoning agents")]
struct Cli {
    #[command(flatten)]
    model: ModelArgs,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct ModelArgs {
    /// openai, ollama, gemini or mock
    #[arg(long, global = true)]
    backend: Option<String>,
    #[arg(long, global = true)]
    model: Option<String>,
    #[arg(long, global = true)]
    temperature: Option<f32>,
    #[arg(long, global = true)]
    max_retries: Option<u32>,
    /// Steps reasoned about at once
    #[arg(long, global = true)]
    concurrency: Option<usize>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Investment advice for a client profile
    Advise(TaskArgs),
    /// Fraud risk assessment for a transaction
    Fraud(FraudArgs),
    /// Personalized product recommendations
    Recommend(InputArgs),
    /// Explain why one product suits the shopper
    Explain(ExplainArgs),
}

#[derive(Debug, Args)]
struct InputArgs {
    /// JSON case file; the bundled demo case is used when omitted
    #[arg(long)]
    input: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct TaskArgs {
    #[command(flatten)]
    input: InputArgs,
    /// One call with a fixed reasoning checklist instead of plan and steps
    #[arg(long)]
    direct: bool,
}

#[derive(Debug, Args)]
struct FraudArgs {
    #[command(flatten)]
    task: TaskArgs,
    #[arg(long, default_value = DEFAULT_GOAL)]
    goal: String,
}

#[derive(Debug, Args)]
struct ExplainArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Product id; defaults to the first product in the case
    #[arg(long)]
    product: Option<String>,
    /// What was recommended; defaults to the product's name and description
    #[arg(long)]
    context: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.model)?;
    info!(?config, "Chain-of-thought reasoner starting");

    let model = build_model(&config)?;
    let orchestrator = Orchestrator::new(model.clone(), &config);

    match cli.command {
        Command::Advise(args) => {
            let case: AdvisoryCase = load_case(&args.input, DEMO_PROFILE)?;
            if args.direct {
                let context = FinancialAdvisorTask::context(&case.user_profile);
                let answer = orchestrator
                    .run_direct(&FinancialAdvisorTask, &context, &case.investment_goals)
                    .await?;
                print_answer("FINAL ADVICE", &answer, cli.json)?;
            } else {
                let run = orchestrator.advise(&case).await?;
                print_run(&run, "FINAL ADVICE", cli.json)?;
            }
        }
        Command::Fraud(args) => {
            let case: FraudCase = load_case(&args.task.input, DEMO_FRAUD_CASE)?;
            let (document, answer) = if args.task.direct {
                let features = extract_features(&case.transaction, &case.history);
                let context = FraudAnalysisTask::context(&case.transaction, &features)?;
                let answer = orchestrator
                    .run_direct(&FraudAnalysisTask, &context, &args.goal)
                    .await?;
                if !cli.json {
                    print_answer("FRAUD ASSESSMENT", &answer, false)?;
                }
                (json!({ "answer": answer }), answer)
            } else {
                let analysis = orchestrator.analyze_transaction(&case, &args.goal).await?;
                if !cli.json {
                    println!("USER HISTORY SUMMARY:");
                    println!("{}", serde_json::to_string_pretty(&analysis.features)?);
                    print_run(&analysis.run, "FRAUD ASSESSMENT", false)?;
                }
                let answer = analysis.run.final_answer.clone();
                (serde_json::to_value(&analysis)?, answer)
            };

            let report = parse_fraud_report(&answer);
            if let Err(e) = &report {
                warn!(error = %e, "Model answer is not a well-formed fraud report");
            }

            if cli.json {
                let document = with_report(document, report.ok().as_ref())?;
                println!("{}", serde_json::to_string_pretty(&document)?);
            } else if let Ok(report) = report {
                println!(
                    "\nRisk: {} ({}/100)\n{}",
                    report.risk_level, report.fraud_risk_score, report.explanation
                );
            }
        }
        Command::Recommend(args) => {
            let case: ShopperCase = load_case(&args, DEMO_SHOPPER)?;
            let recommender = ProductRecommender::new(model, config.temperature);
            let result = recommender.generate_recommendations(&case).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("USER ANALYSIS:\n{}", result.user_analysis);
                println!("\nRECOMMENDATIONS:\n{}", result.recommendations);
            }
        }
        Command::Explain(args) => {
            let case: ShopperCase = load_case(&args.input, DEMO_SHOPPER)?;
            let explanation = explain(model, config.temperature, &case, &args).await?;
            print_answer("PERSONALIZED PRODUCT EXPLANATION", &explanation, cli.json)?;
        }
    }

    Ok(())
}

/// Environment first, command-line flags on top.
fn load_config(args: &ModelArgs) -> cot_agents::Result<AgentConfig> {
    let backend = args.backend.clone();
    let mut config = AgentConfig::from_lookup(|key| match (key, &backend) {
        ("REASONER_BACKEND", Some(name)) => Some(name.clone()),
        _ => std::env::var(key).ok(),
    })?;

    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(temperature) = args.temperature {
        config.temperature = temperature;
    }
    if let Some(max_retries) = args.max_retries {
        config.retry.max_retries = max_retries;
    }
    if let Some(concurrency) = args.concurrency {
        config.step_concurrency = concurrency;
    }

    config.validate()?;
    Ok(config)
}

fn load_case<T: DeserializeOwned>(args: &InputArgs, demo: &str) -> cot_agents::Result<T> {
    let raw = match &args.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => demo.to_string(),
    };
    Ok(serde_json::from_str(&raw)?)
}

/// Attach the parsed report (or null) to a JSON output document.
fn with_report(document: Value, report: Option<&FraudReport>) -> cot_agents::Result<Value> {
    let report = match report {
        Some(report) => serde_json::to_value(report)?,
        None => Value::Null,
    };

    Ok(match document {
        Value::Object(mut fields) => {
            fields.insert("report".to_string(), report);
            Value::Object(fields)
        }
        other => json!({ "result": other, "report": report }),
    })
}

async fn explain(
    model: Arc<dyn LanguageModel>,
    temperature: f32,
    case: &ShopperCase,
    args: &ExplainArgs,
) -> Result<String, Box<dyn std::error::Error>> {
    let product = match &args.product {
        Some(id) => case.available_products.iter().find(|p| &p.id == id),
        None => case.available_products.first(),
    };

    let product_id = args
        .product
        .clone()
        .or_else(|| product.map(|p| p.id.clone()))
        .ok_or("no product given and the case lists no products")?;

    let context = match (&args.context, product) {
        (Some(context), _) => context.clone(),
        (None, Some(p)) => format!("{} - {}", p.name, p.description),
        (None, None) => return Err(format!("unknown product {}", product_id).into()),
    };

    let recommender = ProductRecommender::new(model, temperature);
    Ok(recommender
        .generate_explanation(&product_id, &case.user_profile, &context)
        .await?)
}

fn print_run(run: &ReasoningRun, heading: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(run)?);
        return Ok(());
    }

    println!("PLAN:");
    for step in &run.plan {
        println!(" - {}", step);
    }

    println!("\nSTEP-BY-STEP THOUGHTS:");
    for (i, result) in run.step_results.iter().enumerate() {
        println!("\nStep {}: {}\n{}", i + 1, result.step, result.reasoning);
    }

    println!("\n***** {} *****", heading);
    println!("{}", run.final_answer);
    Ok(())
}

fn print_answer(heading: &str, answer: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(&json!({ "answer": answer }))?);
    } else {
        println!("***** {} *****\n{}", heading, answer);
    }
    Ok(())
}
