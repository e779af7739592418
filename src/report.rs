//! Counselor-facing retention report rendering.
//!
//! Fixed-structure text block: delimiter lines, generation timestamp, student
//! identifier, risk score and status, the driver lists, and a static
//! recommendation checklist.

use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

use crate::explain::ExplanationDriver;
use crate::risk::RiskLevel;

const HEAVY_RULE: &str = "==================================================";
const LIGHT_RULE: &str = "--------------------------------------------------";

const TIMESTAMP_FORMAT: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// Everything the formatter needs for one report.
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    /// Institutional student identifier.
    pub student_id: &'a str,
    /// Risk percentage in `[0, 100]`.
    pub risk_score: f64,
    /// Discrete risk band.
    pub risk_level: RiskLevel,
    /// Ranked heuristic drivers.
    pub drivers: &'a [ExplanationDriver],
    /// Rule-based driver strings, appended after the heuristic list.
    pub rule_drivers: &'a [String],
}

/// Render the report with the current UTC time.
pub fn render_now(input: &ReportInput<'_>) -> String {
    render(input, OffsetDateTime::now_utc())
}

/// Render the report against a fixed generation time.
pub fn render(input: &ReportInput<'_>, generated_at: OffsetDateTime) -> String {
    let timestamp = generated_at
        .format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| String::from("unknown"));
    let status = if input.risk_score > 70.0 {
        "HIGH RISK - URGENT ACTION"
    } else {
        "ELEVATED RISK"
    };

    let mut out = String::new();
    out.push_str(HEAVY_RULE);
    out.push('\n');
    out.push_str("STUDENT RETENTION INTELLIGENCE REPORT\n");
    out.push_str(&format!("Generated: {timestamp}\n"));
    out.push_str(HEAVY_RULE);
    out.push('\n');
    out.push_str(&format!("STUDENT ID: {}\n", input.student_id));
    out.push_str(&format!(
        "RISK SCORE: {:.1}% Attrition Probability ({})\n",
        input.risk_score, input.risk_level
    ));
    out.push_str(&format!("STATUS: {status}\n"));
    out.push_str(LIGHT_RULE);
    out.push('\n');
    out.push_str("TOP ATTRITION DRIVERS:\n");
    if input.drivers.is_empty() && input.rule_drivers.is_empty() {
        out.push_str(" - statistical attribution unavailable\n");
    }
    for driver in input.drivers {
        out.push_str(&format!(
            " - {}: {:.2} ({})\n",
            humanize(&driver.field),
            driver.value,
            driver.direction.as_str()
        ));
    }
    for driver in input.rule_drivers {
        out.push_str(&format!(" - {driver}\n"));
    }
    out.push_str(LIGHT_RULE);
    out.push('\n');
    out.push_str("STRATEGIC RECOMMENDATION:\n");
    out.push_str("[ ] Financial Aid Review Required (Tuition Delinquency)\n");
    out.push_str("[ ] Academic Counseling (GPA Volatility)\n");
    out.push_str("[ ] Socio-economic Outreach (Demographic Shift)\n");
    out.push_str(HEAVY_RULE);
    out.push('\n');
    out
}

/// Turn a snake_case field name into a title-cased label.
fn humanize(field: &str) -> String {
    field
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::Direction;

    fn fixed_time() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    fn sample_drivers() -> Vec<ExplanationDriver> {
        vec![ExplanationDriver {
            field: "tuition_fees_up_to_date".into(),
            value: 0.0,
            contribution: 0.0,
            direction: Direction::SupportsRetention,
        }]
    }

    #[test]
    fn renders_fixed_structure() {
        let drivers = sample_drivers();
        let rules = vec!["Tuition Fees Unpaid".to_string()];
        let input = ReportInput {
            student_id: "STU-2025-001",
            risk_score: 87.5,
            risk_level: RiskLevel::Critical,
            drivers: &drivers,
            rule_drivers: &rules,
        };
        let report = render(&input, fixed_time());
        assert!(report.starts_with(HEAVY_RULE));
        assert!(report.ends_with(&format!("{HEAVY_RULE}\n")));
        assert!(report.contains("Generated: 2023-11-14 22:13"));
        assert!(report.contains("STUDENT ID: STU-2025-001"));
        assert!(report.contains("RISK SCORE: 87.5% Attrition Probability (Critical)"));
        assert!(report.contains("STATUS: HIGH RISK - URGENT ACTION"));
        assert!(report.contains(" - Tuition Fees Up To Date: 0.00 (supports retention)"));
        assert!(report.contains(" - Tuition Fees Unpaid"));
        assert!(report.contains("[ ] Financial Aid Review Required (Tuition Delinquency)"));
    }

    #[test]
    fn status_flips_at_seventy_percent() {
        let input = ReportInput {
            student_id: "S1",
            risk_score: 70.0,
            risk_level: RiskLevel::High,
            drivers: &[],
            rule_drivers: &[],
        };
        let report = render(&input, fixed_time());
        assert!(report.contains("STATUS: ELEVATED RISK"));
        assert!(report.contains(" - statistical attribution unavailable"));
    }

    #[test]
    fn humanize_title_cases_fields() {
        assert_eq!(humanize("mother_s_occupation"), "Mother S Occupation");
        assert_eq!(humanize("gdp"), "Gdp");
    }
}
