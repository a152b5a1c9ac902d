//! Debt row view models.
//!
//! # Invariants
//! - A thing debt renders a tag and no money region; a money debt renders a
//!   money region and no tag; an open-ended debt renders neither and no icon.
//! - The converted line appears only when a main currency is configured,
//!   differs from the debt currency, and both rates are usable.

use crate::model::currency::Currency;
use crate::presenter::strings;
use crate::query::result_set::FetchedDebt;
use crate::repo::currency_repo::CurrencyRepository;
use crate::repo::debt_repo::RepoResult;
use crate::repo::settings_repo::SettingsRepository;
use crate::store::debt_store::DebtStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Row icon asset selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowIcon {
    Thing,
    ExpiredThing,
    Money,
    ExpiredMoney,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoneyLine {
    /// `"{code} {amount}"`, two fraction digits.
    pub amount_text: String,
    /// `"~ {main} {converted}"` when conversion applies.
    pub converted_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebtRowViewModel {
    pub id: String,
    pub name: String,
    /// `"Due: <medium date>"`, empty for undated debts.
    pub date_line: String,
    pub money: Option<MoneyLine>,
    /// Uppercased thing name.
    pub tag: Option<String>,
    pub icon: Option<RowIcon>,
    pub is_expired: bool,
}

/// Currency state rows are rendered against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderContext {
    pub main_currency: Option<Currency>,
    /// Rate per currency code.
    pub rates: HashMap<String, f64>,
}

impl RenderContext {
    /// Reads the main currency setting and the rate table.
    ///
    /// A main currency without a stored rate renders as unset.
    pub fn load(store: &DebtStore) -> RepoResult<Self> {
        let settings = store.settings()?.load_settings()?;
        let rates = store.currencies()?.rate_table()?;
        let main_currency = settings.main_currency.and_then(|code| {
            rates
                .get(&code)
                .copied()
                .map(|value| Currency::new(code, value))
        });
        Ok(Self {
            main_currency,
            rates,
        })
    }

    fn converted(&self, amount: f64, code: Option<&str>) -> Option<String> {
        let main = self.main_currency.as_ref()?;
        let code = code?;
        if main.code == code {
            return None;
        }
        let from_value = *self.rates.get(code)?;
        let converted = main.convert_from(amount, from_value)?;
        Some(format!(
            "{} {} {converted:.2}",
            strings::CONVERTED_PREFIX,
            main.code
        ))
    }
}

/// Renders one fetched debt.
pub fn render_debt_row(fetched: &FetchedDebt, ctx: &RenderContext) -> DebtRowViewModel {
    let debt = &fetched.debt;
    let mut view = DebtRowViewModel {
        id: debt.uuid.to_string(),
        name: debt.name.clone(),
        date_line: debt.due_date.map(date_line).unwrap_or_default(),
        money: None,
        tag: None,
        icon: None,
        is_expired: fetched.is_expired,
    };

    if let Some(thing) = &debt.thing_name {
        view.tag = Some(thing.to_uppercase());
        view.icon = Some(if fetched.is_expired {
            RowIcon::ExpiredThing
        } else {
            RowIcon::Thing
        });
    } else if let Some(amount) = debt.money_amount {
        let code = debt.currency_code.as_deref();
        let amount_text = match code {
            Some(code) => format!("{code} {amount:.2}"),
            None => format!("{amount:.2}"),
        };
        view.money = Some(MoneyLine {
            amount_text,
            converted_text: ctx.converted(amount, code),
        });
        view.icon = Some(if fetched.is_expired {
            RowIcon::ExpiredMoney
        } else {
            RowIcon::Money
        });
    }
    view
}

/// `"Due: Jan 5, 2024"`; out-of-range timestamps render empty.
fn date_line(due_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(due_ms) {
        Some(due) => format!("{} {}", strings::DUE_PREFIX, due.format("%b %-d, %Y")),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{render_debt_row, RenderContext, RowIcon};
    use crate::model::currency::Currency;
    use crate::model::debt::{Debt, Ownership};
    use crate::query::result_set::FetchedDebt;
    use std::collections::HashMap;

    // 2024-01-05T00:00:00Z
    const JAN_5: i64 = 1_704_412_800_000;

    fn eur_context() -> RenderContext {
        RenderContext {
            main_currency: Some(Currency::new("EUR", 0.9)),
            rates: HashMap::from([("USD".to_string(), 1.0), ("EUR".to_string(), 0.9)]),
        }
    }

    #[test]
    fn money_row_renders_amount_and_conversion() {
        let debt = Debt::new(Ownership::MyDebt, "Ann", JAN_5)
            .with_money(100.0, "USD")
            .with_due_date(JAN_5);
        let row = render_debt_row(&FetchedDebt::new(debt, JAN_5 - 1), &eur_context());

        let money = row.money.expect("money line");
        assert_eq!(money.amount_text, "USD 100.00");
        assert_eq!(money.converted_text.as_deref(), Some("~ EUR 90.00"));
        assert_eq!(row.icon, Some(RowIcon::Money));
        assert_eq!(row.date_line, "Due: Jan 5, 2024");
        assert!(row.tag.is_none());
    }

    #[test]
    fn same_currency_skips_conversion() {
        let debt = Debt::new(Ownership::MyDebt, "Ann", JAN_5).with_money(5.0, "EUR");
        let row = render_debt_row(&FetchedDebt::new(debt, JAN_5), &eur_context());
        assert_eq!(row.money.and_then(|money| money.converted_text), None);
    }

    #[test]
    fn zero_rate_skips_conversion() {
        let mut ctx = eur_context();
        ctx.rates.insert("GBP".to_string(), 0.0);
        let debt = Debt::new(Ownership::MyDebt, "Ann", JAN_5).with_money(5.0, "GBP");
        let row = render_debt_row(&FetchedDebt::new(debt, JAN_5), &ctx);
        assert_eq!(row.money.and_then(|money| money.converted_text), None);
    }

    #[test]
    fn expired_thing_row_uses_uppercase_tag() {
        let debt = Debt::new(Ownership::ToMe, "Bob", JAN_5)
            .with_thing("Book")
            .with_due_date(JAN_5);
        let row = render_debt_row(&FetchedDebt::new(debt, JAN_5 + 1), &RenderContext::default());
        assert_eq!(row.tag.as_deref(), Some("BOOK"));
        assert_eq!(row.icon, Some(RowIcon::ExpiredThing));
        assert!(row.money.is_none());
    }

    #[test]
    fn open_ended_row_hides_both_regions() {
        let debt = Debt::new(Ownership::ToMe, "Bob", JAN_5);
        let row = render_debt_row(&FetchedDebt::new(debt, JAN_5), &eur_context());
        assert!(row.money.is_none());
        assert!(row.tag.is_none());
        assert!(row.icon.is_none());
        assert_eq!(row.date_line, "");
    }
}
