use std::{
    fs,
    io::{self, Write},
    process::ExitCode,
};

use clap::{Parser, ValueEnum};
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use finance_tracker::{
    DashboardSummary, DayBucket, Error, MonthBucket, MonthDetail, Totals, UserPreferences,
    WeeklySummary, bucket_by_month, build_dashboard, build_weekly_summary, month_details,
    parse_transactions,
    preferences::{CURRENCY_KEY, DATE_FORMAT_KEY, WEEK_START_KEY},
    resolve_local_zone,
};

/// Summarise a list of income and expense transactions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to a JSON array of transactions, or `-` to read standard input.
    #[arg(long, env = "TRANSACTIONS_PATH")]
    transactions: String,

    /// The summary to produce.
    #[arg(long, value_enum, default_value_t = View::Dashboard)]
    view: View,

    /// The week to summarise for the weekly view, 0 for the current week, -1 for last week.
    #[arg(
        long,
        default_value_t = 0,
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(i32).range(..=0)
    )]
    week_offset: i32,

    /// The instant to treat as "now" in RFC 3339 format. Defaults to the current time.
    #[arg(long, env = "REPORT_REFERENCE")]
    reference: Option<String>,

    /// The canonical timezone name, e.g. "Pacific/Auckland". Defaults to the system offset.
    #[arg(long, env = "LOCAL_TIMEZONE")]
    timezone: Option<String>,

    /// The currency code amounts are shown in, e.g. "USD".
    #[arg(long, env = "REPORT_CURRENCY")]
    currency: Option<String>,

    /// The date layout: MM/DD/YYYY, DD/MM/YYYY or YYYY-MM-DD.
    #[arg(long, env = "REPORT_DATE_FORMAT")]
    date_format: Option<String>,

    /// The first day of the week: Sunday, Monday or Saturday.
    #[arg(long, env = "REPORT_STARTING_DAY")]
    starting_day: Option<String>,

    /// How to write the summary to standard output.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum View {
    /// All-time totals, categories and monthly history.
    Dashboard,
    /// One week broken down by day.
    Weekly,
    /// Each month broken down by category.
    Months,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, thiserror::Error)]
enum ReportError {
    #[error("could not read transactions from {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("invalid reference instant {0:?}, expected RFC 3339")]
    InvalidReference(String),

    #[error(transparent)]
    Aggregation(#[from] Error),

    #[error("could not write JSON output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not write CSV output: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not write output: {0}")]
    Io(#[from] io::Error),
}

fn main() -> ExitCode {
    setup_logging();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging() {
    let stderr_log = tracing_subscriber::fmt::layer().with_writer(io::stderr);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(filter))
        .init();
}

fn run(args: &Args) -> Result<(), ReportError> {
    let json = read_input(&args.transactions)?;

    write_report(args, &json, io::stdout().lock())
}

fn write_report(args: &Args, json: &str, writer: impl Write) -> Result<(), ReportError> {
    let transactions = parse_transactions(json)?;
    tracing::info!(
        "read {} transactions from {}",
        transactions.len(),
        args.transactions
    );

    // Captured once so that every period in this run agrees on "now".
    let reference = match &args.reference {
        Some(reference) => OffsetDateTime::parse(reference, &Rfc3339)
            .map_err(|_| ReportError::InvalidReference(reference.clone()))?,
        None => OffsetDateTime::now_utc(),
    };
    let zone = resolve_local_zone(args.timezone.as_deref(), reference)?;

    let preferences = read_preferences(args);
    tracing::debug!("using {preferences:?} in {zone:?} at {reference}");

    match args.view {
        View::Dashboard => {
            let summary = build_dashboard(&transactions, zone);
            match args.format {
                OutputFormat::Json => {
                    write_json(writer, &DashboardReport::new(&summary, &preferences))?
                }
                OutputFormat::Csv => write_month_rows(writer, &summary.months)?,
            }
        }
        View::Weekly => {
            let summary = build_weekly_summary(
                &transactions,
                reference,
                args.week_offset,
                preferences.week_start,
                zone,
            )?;
            match args.format {
                OutputFormat::Json => {
                    write_json(writer, &WeeklyReport::new(&summary, &preferences))?
                }
                OutputFormat::Csv => write_day_rows(writer, &summary.days, &preferences)?,
            }
        }
        View::Months => match args.format {
            OutputFormat::Json => {
                let details = month_details(&transactions, zone)?;
                let months: Vec<_> = details
                    .iter()
                    .map(|detail| MonthReport::new(detail, &preferences))
                    .collect();
                write_json(writer, &months)?
            }
            OutputFormat::Csv => write_month_rows(writer, &bucket_by_month(&transactions, zone))?,
        },
    }

    Ok(())
}

fn read_input(path: &str) -> Result<String, ReportError> {
    let read = if path == "-" {
        io::read_to_string(io::stdin())
    } else {
        fs::read_to_string(path)
    };

    read.map_err(|source| ReportError::Read {
        path: path.to_owned(),
        source,
    })
}

fn read_preferences(args: &Args) -> UserPreferences {
    let pairs = [
        (CURRENCY_KEY, args.currency.as_deref()),
        (DATE_FORMAT_KEY, args.date_format.as_deref()),
        (WEEK_START_KEY, args.starting_day.as_deref()),
    ];

    UserPreferences::from_key_values(
        pairs
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key, value))),
    )
}

fn write_json(mut writer: impl Write, report: &impl Serialize) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    Ok(())
}

/// Totals rendered in the preferred currency.
#[derive(Debug, Serialize)]
struct FormattedTotals {
    income: String,
    expenses: String,
    balance: String,
}

impl FormattedTotals {
    fn new(totals: &Totals, preferences: &UserPreferences) -> Self {
        Self {
            income: preferences.format_currency(totals.income),
            expenses: preferences.format_currency(totals.expenses),
            balance: preferences.format_currency(totals.balance),
        }
    }
}

#[derive(Debug, Serialize)]
struct DashboardReport<'a> {
    preferences: &'a UserPreferences,
    formatted_totals: FormattedTotals,
    summary: &'a DashboardSummary,
}

impl<'a> DashboardReport<'a> {
    fn new(summary: &'a DashboardSummary, preferences: &'a UserPreferences) -> Self {
        Self {
            preferences,
            formatted_totals: FormattedTotals::new(&summary.totals, preferences),
            summary,
        }
    }
}

#[derive(Debug, Serialize)]
struct WeeklyReport<'a> {
    preferences: &'a UserPreferences,
    period_label: String,
    formatted_totals: FormattedTotals,
    previous_week_offset: i32,
    next_week_offset: Option<i32>,
    summary: &'a WeeklySummary,
}

impl<'a> WeeklyReport<'a> {
    fn new(summary: &'a WeeklySummary, preferences: &'a UserPreferences) -> Self {
        Self {
            preferences,
            period_label: preferences.format_period(&summary.week),
            formatted_totals: FormattedTotals::new(&summary.totals, preferences),
            previous_week_offset: summary.previous_offset(),
            next_week_offset: summary.next_offset(),
            summary,
        }
    }
}

#[derive(Debug, Serialize)]
struct MonthReport<'a> {
    period_label: String,
    formatted_totals: FormattedTotals,
    detail: &'a MonthDetail,
}

impl<'a> MonthReport<'a> {
    fn new(detail: &'a MonthDetail, preferences: &UserPreferences) -> Self {
        Self {
            period_label: preferences.format_period(&detail.period),
            formatted_totals: FormattedTotals::new(&detail.totals, preferences),
            detail,
        }
    }
}

#[derive(Debug, Serialize)]
struct MonthRow<'a> {
    month: &'a str,
    income: f64,
    expenses: f64,
    balance: f64,
    running_balance: f64,
}

fn write_month_rows(writer: impl Write, months: &[MonthBucket]) -> Result<(), ReportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for month in months {
        csv_writer.serialize(MonthRow {
            month: &month.label,
            income: month.income,
            expenses: month.expenses,
            balance: month.balance,
            running_balance: month.running_balance,
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct DayRow<'a> {
    day: &'a str,
    date: String,
    income: f64,
    expenses: f64,
    balance: f64,
}

fn write_day_rows(
    writer: impl Write,
    days: &[DayBucket],
    preferences: &UserPreferences,
) -> Result<(), ReportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for day in days {
        csv_writer.serialize(DayRow {
            day: day.day_name,
            date: preferences.format_date(day.date),
            income: day.income,
            expenses: day.expenses,
            balance: day.balance,
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use finance_tracker::{
        Error, LocalZone, UserPreferences, WeekStart, bucket_by_month, build_weekly_summary,
        parse_transactions, preferences::DateFormat,
    };
    use time::macros::datetime;

    use super::{
        Args, ReportError, WeeklyReport, run, write_day_rows, write_month_rows, write_report,
    };

    const TRANSACTIONS: &str = r#"[
        {"_id": "1", "type": "income", "category": "Salary", "amount": 1000, "date": "2024-01-15T00:00:00Z"},
        {"_id": "2", "type": "expense", "category": "Rent", "amount": 400, "date": "2024-01-20T00:00:00Z"},
        {"_id": "3", "type": "income", "category": "Salary", "amount": 1200, "date": "2024-02-10T00:00:00Z"},
        {"_id": "4", "type": "expense", "category": "Rent", "amount": 500, "date": "2024-02-15T00:00:00Z"}
    ]"#;

    /// Parse `extra` plus defaults for any of the input options it does not set.
    fn parse_args(extra: &[&str]) -> Args {
        let defaults = [
            ("--transactions", "transactions.json"),
            ("--timezone", "UTC"),
            ("--reference", "2024-02-14T12:00:00Z"),
        ];
        let mut argv = vec!["report"];
        argv.extend_from_slice(extra);
        for (flag, value) in defaults {
            if !extra.contains(&flag) {
                argv.extend([flag, value]);
            }
        }

        Args::try_parse_from(argv).unwrap()
    }

    fn report_output(args: &Args) -> String {
        let mut output = Vec::new();
        write_report(args, TRANSACTIONS, &mut output).unwrap();

        String::from_utf8(output).unwrap()
    }

    #[test]
    fn writes_one_csv_row_per_month() {
        let transactions = parse_transactions(TRANSACTIONS).unwrap();
        let months = bucket_by_month(&transactions, LocalZone::UTC);
        let mut output = Vec::new();

        write_month_rows(&mut output, &months).unwrap();

        let output = String::from_utf8(output).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "month,income,expenses,balance,running_balance",
                "Jan 2024,1000.0,400.0,600.0,600.0",
                "Feb 2024,1200.0,500.0,700.0,1300.0",
            ]
        );
    }

    #[test]
    fn writes_one_csv_row_per_day_with_formatted_dates() {
        let transactions = parse_transactions(TRANSACTIONS).unwrap();
        let summary = build_weekly_summary(
            &transactions,
            datetime!(2024-02-14 12:00 UTC),
            0,
            WeekStart::Monday,
            LocalZone::UTC,
        )
        .unwrap();
        let preferences = UserPreferences {
            date_format: DateFormat::YearMonthDay,
            ..Default::default()
        };
        let mut output = Vec::new();

        write_day_rows(&mut output, &summary.days, &preferences).unwrap();

        let output = String::from_utf8(output).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "day,date,income,expenses,balance");
        assert_eq!(lines[1], "Monday,2024-02-12,0.0,0.0,0.0");
        assert_eq!(lines[4], "Thursday,2024-02-15,0.0,500.0,-500.0");
        assert_eq!(lines[7], "Sunday,2024-02-18,0.0,0.0,0.0");
    }

    #[test]
    fn weekly_report_has_period_label_and_navigation() {
        let transactions = parse_transactions(TRANSACTIONS).unwrap();
        let summary = build_weekly_summary(
            &transactions,
            datetime!(2024-02-14 12:00 UTC),
            -1,
            WeekStart::Monday,
            LocalZone::UTC,
        )
        .unwrap();
        let preferences = UserPreferences::default();

        let report = WeeklyReport::new(&summary, &preferences);

        assert_eq!(report.period_label, "02/05/2024 - 02/11/2024");
        assert_eq!(report.previous_week_offset, -2);
        assert_eq!(report.next_week_offset, Some(0));
        assert_eq!(report.formatted_totals.expenses, "$0.00");
        assert!(report.formatted_totals.income.starts_with("$1"));
    }

    #[test]
    fn weekly_json_includes_formatted_strings() {
        let args = parse_args(&["--view", "weekly", "--currency", "GBP"]);

        let output = report_output(&args);

        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["period_label"], "02/12/2024 - 02/18/2024");
        assert_eq!(json["formatted_totals"]["expenses"], "£500.00");
        assert_eq!(json["next_week_offset"], serde_json::Value::Null);
        assert_eq!(json["previous_week_offset"], -1);
        assert_eq!(json["summary"]["days"].as_array().map(Vec::len), Some(7));
    }

    #[test]
    fn dashboard_csv_lists_months() {
        let args = parse_args(&["--view", "dashboard", "--format", "csv"]);

        let output = report_output(&args);

        assert_eq!(output.lines().count(), 3);
        assert!(output.lines().nth(2).is_some_and(|line| line.starts_with("Feb 2024,")));
    }

    #[test]
    fn months_json_is_newest_first() {
        let args = parse_args(&["--view", "months"]);

        let output = report_output(&args);

        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json[0]["detail"]["label"], "February 2024");
        assert_eq!(json[0]["period_label"], "02/01/2024 - 02/29/2024");
        assert_eq!(json[1]["detail"]["label"], "January 2024");
    }

    #[test]
    fn payload_that_is_not_an_array_is_an_error() {
        let args = parse_args(&[]);

        let result = write_report(&args, r#"{"transactions": []}"#, Vec::new());

        assert!(
            matches!(result, Err(ReportError::Aggregation(Error::InvalidInput(_)))),
            "got {result:?}"
        );
    }

    #[test]
    fn unknown_timezone_is_an_error() {
        let args = parse_args(&["--timezone", "Mars/Olympus_Mons"]);

        let result = write_report(&args, "[]", Vec::new());

        assert!(
            matches!(
                result,
                Err(ReportError::Aggregation(Error::InvalidTimezoneError(_)))
            ),
            "got {result:?}"
        );
    }

    #[test]
    fn invalid_reference_is_an_error() {
        let args = parse_args(&["--reference", "yesterday"]);

        let result = write_report(&args, "[]", Vec::new());

        assert!(
            matches!(result, Err(ReportError::InvalidReference(_))),
            "got {result:?}"
        );
    }

    #[test]
    fn missing_transactions_file_is_an_error() {
        let args = parse_args(&["--transactions", "does/not/exist.json"]);

        let result = run(&args);

        assert!(
            matches!(result, Err(ReportError::Read { .. })),
            "got {result:?}"
        );
    }

    #[test]
    fn week_offset_must_not_be_in_the_future() {
        let accepted = Args::try_parse_from([
            "report",
            "--transactions",
            "-",
            "--week-offset",
            "-2",
        ]);
        let rejected = Args::try_parse_from([
            "report",
            "--transactions",
            "-",
            "--week-offset",
            "1",
        ]);

        assert_eq!(accepted.map(|args| args.week_offset).ok(), Some(-2));
        assert!(rejected.is_err());
    }
}
