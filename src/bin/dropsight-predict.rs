//! Scores one student payload against an exported model artifact.

use std::collections::BTreeMap;
use std::path::PathBuf;

use dropsight::explain::{self, DETAILED_DRIVER_COUNT};
use dropsight::report::{self, ReportInput};
use dropsight::schema;
use dropsight::service::InferenceService;

fn main() {
    if let Err(err) = dropsight::logging::init() {
        eprintln!("Logging unavailable: {err}");
    }
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let service = InferenceService::open(&options.model).map_err(|err| err.to_string())?;
    let payload = read_payload(&options.input)?;
    let vector = schema::validate(&payload).map_err(|err| err.to_string())?;
    let result = service.predict_vector(&vector);
    tracing::info!(
        student = %options.student_id,
        label = %result.label,
        risk = %result.risk_level,
        "Prediction complete"
    );

    println!("predicted outcome: {}", result.label);
    for (class, probability) in service
        .artifact()
        .classes
        .iter()
        .zip(result.probabilities.iter())
    {
        println!("  {class:<10} {probability:.4}");
    }
    println!(
        "risk: {:.1}% attrition probability ({})",
        result.risk_score, result.risk_level
    );

    let drivers = if options.detailed {
        explain::attribute(&service.artifact().model, &vector, DETAILED_DRIVER_COUNT)
    } else {
        result.drivers.clone()
    };
    if drivers.is_empty() {
        println!("drivers: statistical attribution unavailable");
    } else {
        println!("drivers:");
        for driver in &drivers {
            println!(
                "  {:<40} value={:<10} contribution={:.4} ({})",
                driver.field,
                driver.value,
                driver.contribution,
                driver.direction.as_str()
            );
        }
    }
    for rule in &result.rule_drivers {
        println!("  flag: {rule}");
    }

    if options.report {
        let rendered = report::render_now(&ReportInput {
            student_id: &options.student_id,
            risk_score: result.risk_score,
            risk_level: result.risk_level,
            drivers: &result.drivers,
            rule_drivers: &result.rule_drivers,
        });
        println!();
        println!("{rendered}");
    }

    Ok(())
}

fn read_payload(path: &PathBuf) -> Result<BTreeMap<String, f64>, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;
    serde_json::from_str(&text).map_err(|err| format!("Invalid payload {}: {err}", path.display()))
}

#[derive(Debug, Clone)]
struct CliOptions {
    model: PathBuf,
    input: PathBuf,
    student_id: String,
    detailed: bool,
    report: bool,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut model = PathBuf::from("dropout_model.json");
    let mut input: Option<PathBuf> = None;
    let mut student_id = String::from("unknown");
    let mut detailed = false;
    let mut report = false;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--model" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--model requires a value".to_string())?;
                model = PathBuf::from(value);
            }
            "--input" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--input requires a value".to_string())?;
                input = Some(PathBuf::from(value));
            }
            "--student-id" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--student-id requires a value".to_string())?;
                student_id = value.clone();
            }
            "--detailed" => detailed = true,
            "--report" => report = true,
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let input = input.ok_or_else(help_text)?;
    Ok(CliOptions {
        model,
        input,
        student_id,
        detailed,
        report,
    })
}

fn help_text() -> String {
    [
        "dropsight-predict",
        "",
        "Scores a single student feature payload and explains the result.",
        "",
        "Usage:",
        "  dropsight-predict --input <payload.json> [--model dropout_model.json] [options]",
        "",
        "Options:",
        "  --input <file>      JSON object mapping feature names to numeric values (required).",
        "  --model <file>      Model artifact path (default: dropout_model.json).",
        "  --student-id <id>   Identifier printed in output and reports (default: unknown).",
        "  --detailed          Show the top 5 drivers instead of the top 3.",
        "  --report            Render the counselor report after the prediction.",
    ]
    .join("\n")
}
