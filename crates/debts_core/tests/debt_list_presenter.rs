use debts_core::presenter::settings::SettingsEnvironment;
use debts_core::repo::currency_repo::CurrencyRepository;
use debts_core::{
    AnalyticsEvent, ChangeHub, Currency, Debt, DebtListIntent, DebtListPresenter, DebtStore,
    DebtsState, IndexPath, ListUpdate, ManualClock, Ownership, RecordingAnalyticsSink,
    RowIcon, SettingsPresenter, TimeWindow,
};
use std::sync::Arc;

const NOW: i64 = 1_700_000_000_000;
const DAY_MS: i64 = 86_400_000;
const HOUR_MS: i64 = 3_600_000;

fn store() -> DebtStore {
    DebtStore::open_in_memory(ChangeHub::new(), Arc::new(ManualClock::new(NOW))).unwrap()
}

fn store_with_clock() -> (DebtStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(NOW));
    let store = DebtStore::open_in_memory(ChangeHub::new(), clock.clone()).unwrap();
    (store, clock)
}

fn seed_rates(store: &DebtStore) {
    let repo = store.currencies().unwrap();
    repo.upsert_currency(&Currency::new("USD", 1.0)).unwrap();
    repo.upsert_currency(&Currency::new("EUR", 0.9)).unwrap();
}

#[test]
fn no_base_matches_means_no_debts_in_every_window() {
    let store = store();
    store
        .save(|ctx| ctx.insert(Debt::new(Ownership::ToMe, "someone else", NOW)))
        .unwrap();
    let sink = Arc::new(RecordingAnalyticsSink::new());
    let mut presenter = DebtListPresenter::load(&store, Ownership::MyDebt, sink);

    for window in TimeWindow::ALL {
        presenter.select_window(&store, window);
        let placeholder = presenter.placeholder();
        assert_eq!(placeholder.debts_state, DebtsState::NoDebts);
        assert!(placeholder.general_placeholder_visible);
        assert!(!placeholder.list_visible);
        assert!(!placeholder.window_placeholder_visible);
    }
}

#[test]
fn base_match_outside_window_shows_window_placeholder() {
    let store = store();
    store
        .save(|ctx| ctx.insert(Debt::new(Ownership::MyDebt, "undated", NOW)))
        .unwrap();
    let sink = Arc::new(RecordingAnalyticsSink::new());
    let mut presenter = DebtListPresenter::load(&store, Ownership::MyDebt, sink);

    assert!(!presenter.placeholder().window_placeholder_visible);
    presenter.select_window(&store, TimeWindow::Week);
    let placeholder = presenter.placeholder();
    assert_eq!(placeholder.debts_state, DebtsState::DebtExist);
    assert!(placeholder.list_visible);
    assert!(placeholder.window_placeholder_visible);
    assert_eq!(presenter.section_count(), 0);
}

#[test]
fn converted_amount_follows_window_and_currency() {
    let store = store();
    seed_rates(&store);
    let sink = Arc::new(RecordingAnalyticsSink::new());
    let mut settings = SettingsPresenter::load(
        &store,
        SettingsEnvironment::default(),
        sink.clone(),
    )
    .unwrap();
    settings.set_main_currency(&store, Some("EUR")).unwrap();

    let debt = store
        .save(|ctx| {
            ctx.insert(
                Debt::new(Ownership::MyDebt, "Ann", NOW)
                    .with_money(100.0, "USD")
                    .with_due_date(NOW + 3 * DAY_MS),
            )
        })
        .unwrap();

    let mut presenter = DebtListPresenter::load(&store, Ownership::MyDebt, sink.clone());
    assert_eq!(presenter.select_window(&store, TimeWindow::Week), ListUpdate::Reload);
    let row = presenter.row(IndexPath::new(0, 0)).unwrap();
    let money = row.money.clone().unwrap();
    assert_eq!(money.amount_text, "USD 100.00");
    assert_eq!(money.converted_text.as_deref(), Some("~ EUR 90.00"));
    assert_eq!(row.icon, Some(RowIcon::Money));
    assert_eq!(presenter.section_title(0), Some("Relevant"));

    presenter.select_window(&store, TimeWindow::AllTime);
    assert_eq!(presenter.row(IndexPath::new(0, 0)), Some(row));

    store
        .save(|ctx| {
            let mut moved = ctx.get(debt.uuid)?.unwrap();
            moved.due_date = Some(NOW + 40 * DAY_MS);
            ctx.update(moved)
        })
        .unwrap();
    presenter.handle_store_changes(&store);
    assert_eq!(presenter.select_window(&store, TimeWindow::Week), ListUpdate::Reload);
    assert_eq!(presenter.section_count(), 0);
    assert!(presenter.placeholder().window_placeholder_visible);
}

#[test]
fn main_currency_change_reloads_render_context() {
    let store = store();
    seed_rates(&store);
    store
        .save(|ctx| ctx.insert(Debt::new(Ownership::ToMe, "Bob", NOW).with_money(10.0, "USD")))
        .unwrap();
    let sink = Arc::new(RecordingAnalyticsSink::new());
    let mut presenter = DebtListPresenter::load(&store, Ownership::ToMe, sink.clone());
    let before = presenter.row(IndexPath::new(0, 0)).unwrap();
    assert_eq!(before.money.unwrap().converted_text, None);

    let mut settings =
        SettingsPresenter::load(&store, SettingsEnvironment::default(), sink).unwrap();
    settings.set_main_currency(&store, Some("EUR")).unwrap();
    assert_eq!(presenter.main_currency_changed(&store), ListUpdate::Reload);

    let after = presenter.row(IndexPath::new(0, 0)).unwrap();
    assert_eq!(after.money.unwrap().converted_text.as_deref(), Some("~ EUR 9.00"));
}

#[test]
fn store_changes_become_batches_and_refresh_placeholder() {
    let store = store();
    let sink = Arc::new(RecordingAnalyticsSink::new());
    let mut presenter = DebtListPresenter::load(&store, Ownership::MyDebt, sink);
    assert_eq!(presenter.placeholder().debts_state, DebtsState::NoDebts);

    let debt = store
        .save(|ctx| ctx.insert(Debt::new(Ownership::MyDebt, "Ann", NOW).with_thing("drill")))
        .unwrap();
    let updates = presenter.handle_store_changes(&store);
    assert_eq!(updates.len(), 1);
    match &updates[0] {
        ListUpdate::Batch { applied, .. } => assert_eq!(applied.inserted_rows, vec![debt.uuid]),
        other => panic!("unexpected update: {other:?}"),
    }
    assert_eq!(presenter.placeholder().debts_state, DebtsState::DebtExist);
    assert_eq!(presenter.section_count(), 1);
    assert_eq!(presenter.row_count(0), 1);
    assert_eq!(
        presenter.row(IndexPath::new(0, 0)).unwrap().tag.as_deref(),
        Some("DRILL")
    );

    store.save(|ctx| ctx.close(debt.uuid)).unwrap();
    presenter.handle_store_changes(&store);
    assert_eq!(presenter.placeholder().debts_state, DebtsState::NoDebts);
    assert!(presenter.history_icon_visible());
    assert_eq!(presenter.section_count(), 0);
}

#[test]
fn base_count_refreshes_for_changes_outside_the_window() {
    let store = store();
    let sink = Arc::new(RecordingAnalyticsSink::new());
    let mut presenter = DebtListPresenter::load(&store, Ownership::MyDebt, sink);
    presenter.select_window(&store, TimeWindow::Week);

    store
        .save(|ctx| ctx.insert(Debt::new(Ownership::MyDebt, "undated", NOW)))
        .unwrap();
    let updates = presenter.handle_store_changes(&store);
    assert!(updates.is_empty());
    assert_eq!(presenter.placeholder().debts_state, DebtsState::DebtExist);
    assert!(presenter.placeholder().window_placeholder_visible);
}

#[test]
fn toolbar_intents_are_reported() {
    let store = store();
    let sink = Arc::new(RecordingAnalyticsSink::new());
    let presenter = DebtListPresenter::load(&store, Ownership::ToMe, sink.clone());

    assert_eq!(presenter.open_settings(), DebtListIntent::OpenSettings);
    assert_eq!(presenter.open_history(), DebtListIntent::OpenHistory);
    assert_eq!(
        presenter.create_debt(),
        DebtListIntent::CreateDebt(Ownership::ToMe)
    );
    assert_eq!(
        sink.take(),
        vec![
            AnalyticsEvent::SettingsTapped,
            AnalyticsEvent::HistoryTapped,
            AnalyticsEvent::CreateDebtTapped {
                ownership: Ownership::ToMe
            },
        ]
    );
}

#[test]
fn passed_due_date_moves_row_to_expired_on_next_change() {
    let (store, clock) = store_with_clock();
    store
        .save(|ctx| {
            ctx.insert(
                Debt::new(Ownership::MyDebt, "Ann", NOW)
                    .with_money(10.0, "USD")
                    .with_due_date(NOW + HOUR_MS),
            )
        })
        .unwrap();
    let sink = Arc::new(RecordingAnalyticsSink::new());
    let mut presenter = DebtListPresenter::load(&store, Ownership::MyDebt, sink);
    assert_eq!(
        presenter.row(IndexPath::new(0, 0)).unwrap().icon,
        Some(RowIcon::Money)
    );
    assert_eq!(presenter.section_title(0), Some("Relevant"));

    clock.advance(2 * HOUR_MS);
    store
        .save(|ctx| ctx.insert(Debt::new(Ownership::MyDebt, "Bob", NOW)))
        .unwrap();
    let updates = presenter.handle_store_changes(&store);
    assert_eq!(updates.len(), 1);
    assert!(matches!(updates[0], ListUpdate::Batch { .. }));

    assert_eq!(presenter.section_count(), 2);
    assert_eq!(presenter.section_title(0), Some("Expired"));
    assert_eq!(presenter.section_title(1), Some("Relevant"));
    let row = presenter.row(IndexPath::new(0, 0)).unwrap();
    assert_eq!(row.name, "Ann");
    assert!(row.is_expired);
    assert_eq!(row.icon, Some(RowIcon::ExpiredMoney));
}

#[test]
fn currency_reload_refetches_expiry() {
    let (store, clock) = store_with_clock();
    store
        .save(|ctx| {
            ctx.insert(
                Debt::new(Ownership::ToMe, "Bob", NOW)
                    .with_thing("drill")
                    .with_due_date(NOW + HOUR_MS),
            )
        })
        .unwrap();
    let sink = Arc::new(RecordingAnalyticsSink::new());
    let mut presenter = DebtListPresenter::load(&store, Ownership::ToMe, sink);
    assert_eq!(presenter.section_title(0), Some("Relevant"));

    clock.advance(2 * HOUR_MS);
    assert_eq!(presenter.main_currency_changed(&store), ListUpdate::Reload);
    assert_eq!(presenter.section_count(), 1);
    assert_eq!(presenter.section_title(0), Some("Expired"));
    assert_eq!(
        presenter.row(IndexPath::new(0, 0)).unwrap().icon,
        Some(RowIcon::ExpiredThing)
    );
    assert!(presenter.handle_store_changes(&store).is_empty());
}
