//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `debts_core` linkage and print one debt list projection.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `debts_cli [my_debt|to_me] [window_index]`. The store path comes
//! from `DEBTS_DB_PATH`.

use debts_core::{
    init_logging, ChangeHub, CoreConfig, DebtListPresenter, DebtStore, LogAnalyticsSink,
    Ownership, SystemClock, TimeWindow,
};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    println!("debts_core ping={}", debts_core::ping());
    println!("debts_core version={}", debts_core::core_version());

    match run(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let config = CoreConfig::from_env();
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, &log_dir.to_string_lossy())?;
    }

    let (ownership, window) = parse_args(&args)?;

    let store = DebtStore::open(&config.db_path, ChangeHub::new(), Arc::new(SystemClock))
        .map_err(|err| format!("failed to open `{}`: {err}", config.db_path.display()))?;
    let mut presenter = DebtListPresenter::load(&store, ownership, Arc::new(LogAnalyticsSink));
    if let Some(window) = window.filter(|window| *window != presenter.window()) {
        presenter.select_window(&store, window);
    }

    println!("{} [{}]", presenter.title(), presenter.window().label());
    let placeholder = presenter.placeholder();
    if placeholder.general_placeholder_visible {
        println!("  (no debts)");
        return Ok(());
    }
    if placeholder.window_placeholder_visible {
        println!("  (nothing in this window)");
        return Ok(());
    }
    for (index, rows) in presenter.rows().iter().enumerate() {
        println!("{}", presenter.section_title(index).unwrap_or("-"));
        for row in rows {
            let value = match (&row.money, &row.tag) {
                (Some(money), _) => match &money.converted_text {
                    Some(converted) => format!("{} ({converted})", money.amount_text),
                    None => money.amount_text.clone(),
                },
                (None, Some(tag)) => tag.clone(),
                (None, None) => String::new(),
            };
            println!("  {} {} {}", row.name, value, row.date_line);
        }
    }
    Ok(())
}

/// Ownership (default `my_debt`) and an optional window index; without one
/// the stored window is kept.
fn parse_args(args: &[String]) -> Result<(Ownership, Option<TimeWindow>), String> {
    let ownership = match args.first() {
        Some(raw) => Ownership::parse(raw).ok_or_else(|| format!("unknown ownership `{raw}`"))?,
        None => Ownership::MyDebt,
    };
    let window = args
        .get(1)
        .map(|raw| {
            raw.parse::<u32>()
                .ok()
                .and_then(TimeWindow::from_index)
                .ok_or_else(|| format!("unknown window index `{raw}`"))
        })
        .transpose()?;
    Ok((ownership, window))
}

#[cfg(test)]
mod tests {
    use super::parse_args;
    use debts_core::{Ownership, TimeWindow};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn missing_window_keeps_the_stored_one() {
        assert_eq!(parse_args(&args(&[])), Ok((Ownership::MyDebt, None)));
        assert_eq!(parse_args(&args(&["to_me"])), Ok((Ownership::ToMe, None)));
    }

    #[test]
    fn explicit_window_is_parsed() {
        assert_eq!(
            parse_args(&args(&["my_debt", "2"])),
            Ok((Ownership::MyDebt, Some(TimeWindow::Month)))
        );
        assert!(parse_args(&args(&["my_debt", "9"])).is_err());
        assert!(parse_args(&args(&["nobody"])).is_err());
    }
}
