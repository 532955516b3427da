// CLI entry point: the stand-in for the dashboard UI

use anyhow::{bail, Context, Result};
use std::env;
use std::path::Path;

use findash::{
    by_category, category_pairs, import_into, parse_amount, parse_iso_date, total, AddOutcome,
    BudgetSplit, Category, ExpenseRecord, ExpenseStore, ImportFormat, PriceProvider,
    StooqProvider, DB_FILE, PORTFOLIO,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("add") => run_add(&args[2..]),
        Some("list") => run_list(),
        Some("summary") => run_summary(),
        Some("import") => run_import(&args[2..]),
        Some("delete") => run_delete(&args[2..]),
        Some("clear") => run_clear(),
        Some("budget") => run_budget(&args[2..]),
        Some("prices") => run_prices(),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("findash {}", findash::VERSION);
    println!();
    println!("Usage:");
    println!("  findash add <date> <amount> <category> [note..]   record an expense");
    println!("  findash list                                      all expenses, newest first");
    println!("  findash summary                                   totals by category");
    println!("  findash import <file.csv|file.xlsx>               import a tabular upload");
    println!("  findash delete <date> <amount> <category> [note..] remove a recorded expense");
    println!("  findash clear                                     remove all expenses");
    println!("  findash budget <income> [needs wants savings]     needs/wants/savings split");
    println!("  findash prices                                    last month of closing prices");
    println!();
    println!(
        "Categories: {}",
        Category::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
}

fn open_store() -> Result<ExpenseStore> {
    ExpenseStore::open(DB_FILE).context("opening expense store")
}

/// Parse `<date> <amount> <category> [note..]` into a validated record.
fn record_from_args(args: &[String]) -> Result<ExpenseRecord> {
    let [date, amount, category, note @ ..] = args else {
        bail!("expected: <date> <amount> <category> [note..]");
    };

    let record = ExpenseRecord::new(
        parse_iso_date(date)?,
        parse_amount(amount)?,
        category.parse::<Category>()?,
        note.join(" "),
    )?;
    Ok(record)
}

fn run_add(args: &[String]) -> Result<()> {
    let record = record_from_args(args)?;
    let store = open_store()?;

    match store.add(&record)? {
        AddOutcome::Inserted => println!("Expense added."),
        AddOutcome::DuplicateSkipped => println!("Identical expense already recorded; skipped."),
    }
    Ok(())
}

fn run_list() -> Result<()> {
    let store = open_store()?;
    let records = store.list()?;

    if records.is_empty() {
        println!("No expenses recorded.");
        return Ok(());
    }

    println!("{:<12} {:>10}  {:<14} {}", "Date", "Amount", "Category", "Note");
    for record in &records {
        println!(
            "{:<12} {:>10}  {:<14} {}",
            record.date_string(),
            format!("${:.2}", record.amount),
            record.category.as_str(),
            record.note
        );
    }
    Ok(())
}

fn run_summary() -> Result<()> {
    let store = open_store()?;
    let records = store.list()?;

    if records.is_empty() {
        println!("No expenses recorded.");
        return Ok(());
    }

    let overall = total(&records);
    println!("Expenses by category ({} records):", records.len());
    for (category, sum) in category_pairs(&by_category(&records)) {
        let share = if overall > 0.0 { sum / overall * 100.0 } else { 0.0 };
        println!(
            "  {:<14} {:>10}  {:>5.1}%",
            category.as_str(),
            format!("${:.2}", sum),
            share
        );
    }
    println!("  {:<14} {:>10}", "Total", format!("${:.2}", overall));
    Ok(())
}

fn run_import(args: &[String]) -> Result<()> {
    let [file] = args else {
        bail!("expected: <file.csv|file.xlsx>");
    };
    let path = Path::new(file);
    let format = ImportFormat::from_path(path)?;

    let store = open_store()?;
    let summary = import_into(&store, format, path)
        .with_context(|| format!("importing '{}'", path.display()))?;

    println!("Parsed {} rows.", summary.rows_parsed);
    if summary.batch_duplicates > 0 {
        println!("Dropped {} duplicate rows within the file.", summary.batch_duplicates);
    }
    println!(
        "Inserted {} new expenses ({} already recorded).",
        summary.inserted, summary.already_present
    );
    Ok(())
}

fn run_delete(args: &[String]) -> Result<()> {
    let record = record_from_args(args)?;
    let store = open_store()?;

    let removed = store.delete(&record)?;
    if removed == 0 {
        println!("No matching expense found.");
    } else {
        println!("Deleted {} expense(s).", removed);
    }
    Ok(())
}

fn run_clear() -> Result<()> {
    let store = open_store()?;
    let removed = store.clear()?;
    println!("Removed {} expense(s).", removed);
    Ok(())
}

fn run_budget(args: &[String]) -> Result<()> {
    let split = match args {
        [_, needs, wants, savings] => BudgetSplit::new(
            needs.parse().context("needs percentage")?,
            wants.parse().context("wants percentage")?,
            savings.parse().context("savings percentage")?,
        )?,
        [_] => BudgetSplit::default(),
        _ => bail!("expected: <income> [needs wants savings]"),
    };
    let income = parse_amount(&args[0])?;

    let breakdown = split.allocate(income)?;
    println!("Monthly income: ${:.2}", income);
    println!("  Needs   ({:>3}%): ${:.2}", split.needs_pct, breakdown.needs);
    println!("  Wants   ({:>3}%): ${:.2}", split.wants_pct, breakdown.wants);
    println!("  Savings ({:>3}%): ${:.2}", split.savings_pct, breakdown.savings);
    Ok(())
}

fn run_prices() -> Result<()> {
    let provider = StooqProvider::new()?;

    for symbol in PORTFOLIO {
        match provider.fetch_price_series(symbol) {
            Ok(series) => {
                if let (Some(first), Some(last)) = (series.first(), series.last()) {
                    let change = (last.close - first.close) / first.close * 100.0;
                    println!(
                        "{:<6} {} close ${:.2}  ({:+.1}% over {} sessions)",
                        symbol,
                        last.date.format("%Y-%m-%d"),
                        last.close,
                        change,
                        series.len()
                    );
                }
            }
            Err(e) => println!("{:<6} unavailable: {}", symbol, e),
        }
    }
    Ok(())
}
