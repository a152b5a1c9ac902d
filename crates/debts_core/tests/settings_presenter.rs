use debts_core::presenter::settings::{Accessory, CurrencyChange, TextRole};
use debts_core::repo::currency_repo::CurrencyRepository;
use debts_core::repo::settings_repo::SettingsRepository;
use debts_core::{
    AnalyticsEvent, ChangeHub, Currency, DebtStore, IndexPath, ManualClock, Palette,
    RecordingAnalyticsSink, SettingsAction, SettingsEnvironment, SettingsError, SettingsField,
    SettingsPresenter,
};
use std::sync::Arc;

fn store() -> DebtStore {
    DebtStore::open_in_memory(ChangeHub::new(), Arc::new(ManualClock::new(0))).unwrap()
}

fn full_environment() -> SettingsEnvironment {
    SettingsEnvironment {
        icloud_system_enabled: true,
        can_send_email: true,
        donations_url: Some("https://example.org/donate".to_string()),
    }
}

fn fields(presenter: &SettingsPresenter) -> Vec<Vec<SettingsField>> {
    presenter
        .sections()
        .iter()
        .map(|rows| rows.iter().map(|row| row.field).collect())
        .collect()
}

#[test]
fn full_environment_shows_every_row() {
    let store = store();
    let presenter = SettingsPresenter::load(
        &store,
        full_environment(),
        Arc::new(RecordingAnalyticsSink::new()),
    )
    .unwrap();

    assert_eq!(
        fields(&presenter),
        vec![
            vec![SettingsField::BaseCurrency],
            vec![
                SettingsField::Palette,
                SettingsField::ICloudSync,
                SettingsField::AboutUs
            ],
            vec![SettingsField::ICloudSyncNow],
            vec![SettingsField::SuggestIdea, SettingsField::ShareApplication],
            vec![SettingsField::Donate],
        ]
    );
    let sync_now = presenter.row(IndexPath::new(2, 0)).unwrap();
    assert_eq!(sync_now.text_role, TextRole::Action);
    let icloud = presenter.row(IndexPath::new(1, 1)).unwrap();
    assert_eq!(icloud.accessory, Accessory::Switch { on: true });
}

#[test]
fn unavailable_features_are_hidden_and_empty_sections_dropped() {
    let store = store();
    let presenter = SettingsPresenter::load(
        &store,
        SettingsEnvironment::default(),
        Arc::new(RecordingAnalyticsSink::new()),
    )
    .unwrap();

    assert_eq!(
        fields(&presenter),
        vec![
            vec![SettingsField::BaseCurrency],
            vec![SettingsField::Palette, SettingsField::AboutUs],
            vec![SettingsField::ShareApplication],
        ]
    );
    assert_eq!(presenter.index_path_of(SettingsField::ICloudSyncNow), None);
}

#[test]
fn environment_change_rebuilds_rows() {
    let store = store();
    let mut presenter = SettingsPresenter::load(
        &store,
        SettingsEnvironment::default(),
        Arc::new(RecordingAnalyticsSink::new()),
    )
    .unwrap();
    presenter.set_environment(full_environment());
    assert_eq!(
        presenter.index_path_of(SettingsField::ICloudSyncNow),
        Some(IndexPath::new(2, 0))
    );
}

#[test]
fn selecting_rows_yields_actions() {
    let store = store();
    let sink = Arc::new(RecordingAnalyticsSink::new());
    let presenter = SettingsPresenter::load(&store, full_environment(), sink.clone()).unwrap();
    sink.take();

    assert_eq!(
        presenter.select(IndexPath::new(0, 0)),
        Some(SettingsAction::OpenCurrencyPicker)
    );
    assert_eq!(presenter.select(IndexPath::new(1, 1)), None);
    assert_eq!(presenter.select(IndexPath::new(2, 0)), Some(SettingsAction::SyncNow));
    assert_eq!(
        presenter.select(IndexPath::new(4, 0)),
        Some(SettingsAction::OpenLink(
            "https://example.org/donate".to_string()
        ))
    );
    assert_eq!(presenter.select(IndexPath::new(9, 0)), None);
    assert_eq!(
        sink.take(),
        vec![
            AnalyticsEvent::SelectCurrencyTapped,
            AnalyticsEvent::SyncNowTapped,
            AnalyticsEvent::DonateTapped,
        ]
    );
}

#[test]
fn setters_persist_and_rebuild() {
    let store = store();
    let rates = store.currencies().unwrap();
    rates.upsert_currency(&Currency::new("EUR", 0.9)).unwrap();
    let mut presenter = SettingsPresenter::load(
        &store,
        full_environment(),
        Arc::new(RecordingAnalyticsSink::new()),
    )
    .unwrap();

    presenter.set_icloud_enabled(&store, false).unwrap();
    presenter.set_palette(&store, Palette::Dark).unwrap();
    let change = presenter.set_main_currency(&store, Some("EUR")).unwrap();
    assert_eq!(
        change,
        CurrencyChange {
            main_currency: Some("EUR".to_string())
        }
    );

    let icloud = presenter.row(IndexPath::new(1, 1)).unwrap();
    assert_eq!(icloud.accessory, Accessory::Switch { on: false });
    let palette = presenter.row(IndexPath::new(1, 0)).unwrap();
    assert_eq!(palette.subtitle.as_deref(), Some("Dark"));
    let currency = presenter.row(IndexPath::new(0, 0)).unwrap();
    assert_eq!(currency.subtitle.as_deref(), Some("EUR"));

    let stored = store.settings().unwrap().load_settings().unwrap();
    assert_eq!(&stored, presenter.state());
}

#[test]
fn unknown_main_currency_is_rejected() {
    let store = store();
    let mut presenter = SettingsPresenter::load(
        &store,
        full_environment(),
        Arc::new(RecordingAnalyticsSink::new()),
    )
    .unwrap();
    assert!(matches!(
        presenter.set_main_currency(&store, Some("JPY")),
        Err(SettingsError::UnknownCurrency(code)) if code == "JPY"
    ));
    assert_eq!(presenter.state().main_currency, None);
}
