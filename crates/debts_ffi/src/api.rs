//! FFI use-case API for the Flutter shell.
//!
//! # Responsibility
//! - Expose the debt list and settings screens as flat, FRB-friendly values.
//! - Own the one process session (store handle + open presenters).
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary; every failure
//!   becomes a message string.
//! - All calls run on the Dart UI isolate thread; the session mutex only
//!   guards against misuse.

use debts_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AnalyticsSink, ChangeBatch, ChangeEvent, ChangeHub, CoreConfig, Currency, Debt,
    DebtListIntent, DebtListPresenter, DebtRowViewModel, DebtStore, IndexPath, ListUpdate,
    LogAnalyticsSink, Ownership, Palette, SettingsAction, SettingsEnvironment, SettingsPresenter,
    SettingsRow, SystemClock, TimeWindow,
};
use debts_core::repo::currency_repo::CurrencyRepository;
use log::info;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

static SESSION: Mutex<Option<Session>> = Mutex::new(None);

struct Session {
    store: DebtStore,
    config: CoreConfig,
    analytics: Arc<dyn AnalyticsSink>,
    lists: HashMap<Ownership, DebtListPresenter>,
    settings: Option<SettingsPresenter>,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Idempotent for the same `level + log_dir`; reconfiguration is rejected.
/// - Returns an empty string on success and the error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Debt ID touched by the action, if any.
    pub debt_id: Option<String>,
    pub message: String,
}

impl ActionResponse {
    fn from_result(result: Result<Option<String>, String>, success: &str) -> Self {
        match result {
            Ok(debt_id) => Self {
                ok: true,
                debt_id,
                message: success.to_string(),
            },
            Err(message) => Self {
                ok: false,
                debt_id: None,
                message,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebtRowItem {
    pub debt_id: String,
    pub name: String,
    pub date_line: String,
    pub amount_text: Option<String>,
    pub converted_text: Option<String>,
    pub tag: Option<String>,
    /// `thing|expired_thing|money|expired_money`.
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebtSectionItem {
    pub title: Option<String>,
    pub rows: Vec<DebtRowItem>,
}

/// Full debt list state after an open, window change or reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebtListSnapshot {
    pub ok: bool,
    pub message: String,
    pub title: String,
    pub window_index: u32,
    pub sections: Vec<DebtSectionItem>,
    pub general_placeholder_visible: bool,
    pub list_visible: bool,
    pub window_placeholder_visible: bool,
    pub history_icon_visible: bool,
}

impl DebtListSnapshot {
    fn failure(message: String) -> Self {
        Self {
            ok: false,
            message,
            title: String::new(),
            window_index: 0,
            sections: Vec::new(),
            general_placeholder_visible: false,
            list_visible: false,
            window_placeholder_visible: false,
            history_icon_visible: false,
        }
    }
}

/// One list mutation. Paths follow list-view batch-update semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEventItem {
    /// `section_insert|section_update|section_delete|insert|update|move|delete`.
    pub kind: String,
    pub section: u32,
    pub row: Option<u32>,
    pub to_section: Option<u32>,
    pub to_row: Option<u32>,
    pub row_item: Option<DebtRowItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListBatchItem {
    pub sequence: u64,
    /// `local|remote`.
    pub origin: String,
    pub events: Vec<ListEventItem>,
}

/// Result of draining store notifications for one list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebtListPollResponse {
    /// When true, ignore `batches` and redraw from `snapshot`.
    pub reload: bool,
    pub batches: Vec<ListBatchItem>,
    pub snapshot: DebtListSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsRowItem {
    pub field: String,
    pub title: String,
    pub subtitle: Option<String>,
    /// `none|disclosure|switch`.
    pub accessory: String,
    pub switch_on: bool,
    pub is_action: bool,
    pub selectable: bool,
    pub has_icon: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsSnapshot {
    pub ok: bool,
    pub message: String,
    pub title: String,
    pub sections: Vec<Vec<SettingsRowItem>>,
}

/// Opens (or reopens) the process session on `db_path`.
///
/// An empty `db_path` uses `DEBTS_DB_PATH` or the temp-dir default.
#[flutter_rust_bridge::frb(sync)]
pub fn session_open(db_path: String) -> ActionResponse {
    let config = CoreConfig::from_env();
    let path = match db_path.trim() {
        "" => config.db_path.clone(),
        raw => PathBuf::from(raw),
    };
    let result = DebtStore::open(&path, ChangeHub::new(), Arc::new(SystemClock))
        .map_err(|err| format!("session_open failed: {err}"))
        .and_then(|store| {
            let mut guard = SESSION
                .lock()
                .map_err(|_| "session lock poisoned".to_string())?;
            *guard = Some(Session {
                store,
                config,
                analytics: Arc::new(LogAnalyticsSink),
                lists: HashMap::new(),
                settings: None,
            });
            info!("event=session_open module=ffi status=ok");
            Ok(None)
        });
    ActionResponse::from_result(result, "session opened")
}

/// Opens the list for `ownership` (`my_debt|to_me`).
#[flutter_rust_bridge::frb(sync)]
pub fn debt_list_open(ownership: String) -> DebtListSnapshot {
    snapshot_or_failure(with_session(|session| {
        let ownership = parse_ownership(&ownership)?;
        let presenter =
            DebtListPresenter::load(&session.store, ownership, session.analytics.clone());
        session.lists.insert(ownership, presenter);
        list_snapshot(session, ownership)
    }))
}

/// Switches the time window (`0=all time, 1=week, 2=month, 3=year`).
#[flutter_rust_bridge::frb(sync)]
pub fn debt_list_select_window(ownership: String, window_index: u32) -> DebtListSnapshot {
    snapshot_or_failure(with_session(|session| {
        let ownership = parse_ownership(&ownership)?;
        let window = TimeWindow::from_index(window_index)
            .ok_or_else(|| format!("unknown window index {window_index}"))?;
        let presenter = open_list(&mut session.lists, ownership)?;
        presenter.select_window(&session.store, window);
        list_snapshot(session, ownership)
    }))
}

/// Drains pending store notifications into list batches.
#[flutter_rust_bridge::frb(sync)]
pub fn debt_list_poll(ownership: String) -> DebtListPollResponse {
    let result = with_session(|session| {
        let ownership = parse_ownership(&ownership)?;
        let presenter = open_list(&mut session.lists, ownership)?;
        let updates = presenter.handle_store_changes(&session.store);
        let reload = updates
            .iter()
            .any(|update| matches!(update, ListUpdate::Reload));
        let batches = if reload {
            Vec::new()
        } else {
            updates
                .iter()
                .filter_map(|update| match update {
                    ListUpdate::Batch { batch, .. } => Some(to_batch_item(presenter, batch)),
                    ListUpdate::Reload => None,
                })
                .collect()
        };
        Ok(DebtListPollResponse {
            reload,
            batches,
            snapshot: list_snapshot(session, ownership)?,
        })
    });
    match result {
        Ok(response) => response,
        Err(message) => DebtListPollResponse {
            reload: true,
            batches: Vec::new(),
            snapshot: DebtListSnapshot::failure(message),
        },
    }
}

/// Resolves a row tap (`close == false`) or close swipe (`close == true`).
///
/// Returns the debt ID, or an empty string for an out-of-range path.
#[flutter_rust_bridge::frb(sync)]
pub fn debt_list_row_intent(ownership: String, section: u32, row: u32, close: bool) -> String {
    let result = with_session(|session| {
        let ownership = parse_ownership(&ownership)?;
        let presenter = open_list(&mut session.lists, ownership)?;
        let path = IndexPath::new(section as usize, row as usize);
        let intent = if close {
            presenter.close_row(path)
        } else {
            presenter.select_row(path)
        };
        Ok(match intent {
            Some(DebtListIntent::OpenDebt(id)) | Some(DebtListIntent::CloseDebt(id)) => {
                id.to_string()
            }
            _ => String::new(),
        })
    });
    result.unwrap_or_default()
}

/// Reports a toolbar tap (`settings|history|create`) and returns the intent
/// label; empty on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn debt_list_toolbar(ownership: String, button: String) -> String {
    let result = with_session(|session| {
        let ownership = parse_ownership(&ownership)?;
        let presenter = open_list(&mut session.lists, ownership)?;
        let intent = match button.trim() {
            "settings" => presenter.open_settings(),
            "history" => presenter.open_history(),
            "create" => presenter.create_debt(),
            other => return Err(format!("unknown toolbar button `{other}`")),
        };
        Ok(match intent {
            DebtListIntent::OpenSettings => "open_settings",
            DebtListIntent::OpenHistory => "open_history",
            DebtListIntent::CreateDebt(_) => "create_debt",
            DebtListIntent::OpenDebt(_) | DebtListIntent::CloseDebt(_) => "",
        }
        .to_string())
    });
    result.unwrap_or_default()
}

/// Creates a debt. At most one of `money_amount` / `thing_name` may be set.
#[flutter_rust_bridge::frb(sync)]
pub fn debt_create(
    ownership: String,
    name: String,
    due_date_ms: Option<i64>,
    money_amount: Option<f64>,
    currency_code: Option<String>,
    thing_name: Option<String>,
) -> ActionResponse {
    let result = with_session(|session| {
        let ownership = parse_ownership(&ownership)?;
        let mut debt = Debt::new(ownership, name.trim(), session.store.now_ms());
        debt.due_date = due_date_ms;
        debt.money_amount = money_amount;
        debt.currency_code = currency_code.map(|code| code.trim().to_ascii_uppercase());
        debt.thing_name = thing_name;
        debt.validate().map_err(|err| err.to_string())?;
        let saved = session
            .store
            .save(|ctx| ctx.insert(debt))
            .map_err(|err| format!("debt_create failed: {err}"))?;
        Ok(Some(saved.uuid.to_string()))
    });
    ActionResponse::from_result(result, "debt created")
}

/// Marks a debt closed.
#[flutter_rust_bridge::frb(sync)]
pub fn debt_close(debt_id: String) -> ActionResponse {
    let result = with_session(|session| {
        let id = uuid::Uuid::parse_str(debt_id.trim())
            .map_err(|err| format!("invalid debt id `{debt_id}`: {err}"))?;
        session
            .store
            .save(|ctx| ctx.close(id))
            .map_err(|err| format!("debt_close failed: {err}"))?;
        Ok(Some(id.to_string()))
    });
    ActionResponse::from_result(result, "debt closed")
}

/// Stores an exchange rate from the rate source.
#[flutter_rust_bridge::frb(sync)]
pub fn currency_upsert(code: String, value: f64) -> ActionResponse {
    let result = with_session(|session| {
        let currency = Currency::new(code.trim().to_ascii_uppercase(), value);
        session
            .store
            .currencies()
            .and_then(|repo| repo.upsert_currency(&currency))
            .map_err(|err| format!("currency_upsert failed: {err}"))?;
        Ok(None)
    });
    ActionResponse::from_result(result, "currency stored")
}

/// Opens the settings screen for the given host capabilities.
#[flutter_rust_bridge::frb(sync)]
pub fn settings_open(icloud_system_enabled: bool, can_send_email: bool) -> SettingsSnapshot {
    settings_or_failure(with_session(|session| {
        let environment = SettingsEnvironment {
            icloud_system_enabled,
            can_send_email,
            donations_url: session.config.donations_url.clone(),
        };
        let presenter =
            SettingsPresenter::load(&session.store, environment, session.analytics.clone())
                .map_err(|err| format!("settings_open failed: {err}"))?;
        session.settings = Some(presenter);
        settings_snapshot(session)
    }))
}

/// Resolves a settings row tap into an action label; empty when none.
///
/// Labels: `open_currency_picker|open_palette_picker|open_about|sync_now|
/// suggest_idea|share_application|open_link:<url>`.
#[flutter_rust_bridge::frb(sync)]
pub fn settings_select(section: u32, row: u32) -> String {
    let result = with_session(|session| {
        let presenter = open_settings(session)?;
        let action = presenter.select(IndexPath::new(section as usize, row as usize));
        Ok(match action {
            Some(SettingsAction::OpenCurrencyPicker) => "open_currency_picker".to_string(),
            Some(SettingsAction::OpenPalettePicker) => "open_palette_picker".to_string(),
            Some(SettingsAction::OpenAbout) => "open_about".to_string(),
            Some(SettingsAction::SyncNow) => "sync_now".to_string(),
            Some(SettingsAction::SuggestIdea) => "suggest_idea".to_string(),
            Some(SettingsAction::ShareApplication) => "share_application".to_string(),
            Some(SettingsAction::OpenLink(url)) => format!("open_link:{url}"),
            None => String::new(),
        })
    });
    result.unwrap_or_default()
}

#[flutter_rust_bridge::frb(sync)]
pub fn settings_set_icloud_enabled(enabled: bool) -> SettingsSnapshot {
    settings_or_failure(with_session(|session| {
        let presenter = session
            .settings
            .as_mut()
            .ok_or_else(|| "settings screen is not open".to_string())?;
        presenter
            .set_icloud_enabled(&session.store, enabled)
            .map_err(|err| err.to_string())?;
        settings_snapshot(session)
    }))
}

/// Sets the palette: `automatic|light|dark`.
#[flutter_rust_bridge::frb(sync)]
pub fn settings_set_palette(palette: String) -> SettingsSnapshot {
    settings_or_failure(with_session(|session| {
        let palette = Palette::parse(palette.trim())
            .ok_or_else(|| format!("unknown palette `{}`", palette.trim()))?;
        let presenter = session
            .settings
            .as_mut()
            .ok_or_else(|| "settings screen is not open".to_string())?;
        presenter
            .set_palette(&session.store, palette)
            .map_err(|err| err.to_string())?;
        settings_snapshot(session)
    }))
}

/// Sets or clears (`None`) the main currency; open debt lists reload their
/// currency state.
#[flutter_rust_bridge::frb(sync)]
pub fn settings_set_main_currency(code: Option<String>) -> SettingsSnapshot {
    settings_or_failure(with_session(|session| {
        let code = code
            .map(|raw| raw.trim().to_ascii_uppercase())
            .filter(|raw| !raw.is_empty());
        let presenter = session
            .settings
            .as_mut()
            .ok_or_else(|| "settings screen is not open".to_string())?;
        presenter
            .set_main_currency(&session.store, code.as_deref())
            .map_err(|err| err.to_string())?;
        for list in session.lists.values_mut() {
            list.main_currency_changed(&session.store);
        }
        settings_snapshot(session)
    }))
}

fn with_session<T>(f: impl FnOnce(&mut Session) -> Result<T, String>) -> Result<T, String> {
    let mut guard = SESSION
        .lock()
        .map_err(|_| "session lock poisoned".to_string())?;
    let session = guard
        .as_mut()
        .ok_or_else(|| "session is not open; call session_open first".to_string())?;
    f(session)
}

fn open_list(
    lists: &mut HashMap<Ownership, DebtListPresenter>,
    ownership: Ownership,
) -> Result<&mut DebtListPresenter, String> {
    lists
        .get_mut(&ownership)
        .ok_or_else(|| format!("debt list `{}` is not open", ownership.as_str()))
}

fn open_settings(session: &Session) -> Result<&SettingsPresenter, String> {
    session
        .settings
        .as_ref()
        .ok_or_else(|| "settings screen is not open".to_string())
}

fn parse_ownership(raw: &str) -> Result<Ownership, String> {
    Ownership::parse(raw).ok_or_else(|| format!("unknown ownership `{}`", raw.trim()))
}

fn list_snapshot(session: &Session, ownership: Ownership) -> Result<DebtListSnapshot, String> {
    let presenter = session
        .lists
        .get(&ownership)
        .ok_or_else(|| format!("debt list `{}` is not open", ownership.as_str()))?;
    let placeholder = presenter.placeholder();
    let sections = presenter
        .rows()
        .into_iter()
        .enumerate()
        .map(|(index, rows)| DebtSectionItem {
            title: presenter.section_title(index).map(str::to_string),
            rows: rows.into_iter().map(to_row_item).collect(),
        })
        .collect();
    Ok(DebtListSnapshot {
        ok: true,
        message: String::new(),
        title: presenter.title().to_string(),
        window_index: presenter.window().index(),
        sections,
        general_placeholder_visible: placeholder.general_placeholder_visible,
        list_visible: placeholder.list_visible,
        window_placeholder_visible: placeholder.window_placeholder_visible,
        history_icon_visible: presenter.history_icon_visible(),
    })
}

fn snapshot_or_failure(result: Result<DebtListSnapshot, String>) -> DebtListSnapshot {
    result.unwrap_or_else(DebtListSnapshot::failure)
}

fn settings_snapshot(session: &Session) -> Result<SettingsSnapshot, String> {
    let presenter = open_settings(session)?;
    Ok(SettingsSnapshot {
        ok: true,
        message: String::new(),
        title: presenter.title().to_string(),
        sections: presenter
            .sections()
            .iter()
            .map(|rows| rows.iter().map(to_settings_item).collect())
            .collect(),
    })
}

fn settings_or_failure(result: Result<SettingsSnapshot, String>) -> SettingsSnapshot {
    result.unwrap_or_else(|message| SettingsSnapshot {
        ok: false,
        message,
        title: String::new(),
        sections: Vec::new(),
    })
}

fn to_row_item(view: DebtRowViewModel) -> DebtRowItem {
    let (amount_text, converted_text) = match view.money {
        Some(money) => (Some(money.amount_text), money.converted_text),
        None => (None, None),
    };
    DebtRowItem {
        debt_id: view.id,
        name: view.name,
        date_line: view.date_line,
        amount_text,
        converted_text,
        tag: view.tag,
        icon: view.icon.map(|icon| {
            match icon {
                debts_core::RowIcon::Thing => "thing",
                debts_core::RowIcon::ExpiredThing => "expired_thing",
                debts_core::RowIcon::Money => "money",
                debts_core::RowIcon::ExpiredMoney => "expired_money",
            }
            .to_string()
        }),
    }
}

fn to_settings_item(row: &SettingsRow) -> SettingsRowItem {
    use debts_core::presenter::settings::{Accessory, SettingsField, TextRole};
    let field = match row.field {
        SettingsField::BaseCurrency => "base_currency",
        SettingsField::Palette => "palette",
        SettingsField::ICloudSync => "icloud_sync",
        SettingsField::AboutUs => "about_us",
        SettingsField::ICloudSyncNow => "icloud_sync_now",
        SettingsField::SuggestIdea => "suggest_idea",
        SettingsField::ShareApplication => "share_application",
        SettingsField::Donate => "donate",
    };
    let (accessory, switch_on) = match row.accessory {
        Accessory::None => ("none", false),
        Accessory::Disclosure => ("disclosure", false),
        Accessory::Switch { on } => ("switch", on),
    };
    SettingsRowItem {
        field: field.to_string(),
        title: row.title.clone(),
        subtitle: row.subtitle.clone(),
        accessory: accessory.to_string(),
        switch_on,
        is_action: row.text_role == TextRole::Action,
        selectable: row.selectable,
        has_icon: row.has_icon,
    }
}

fn to_batch_item(presenter: &DebtListPresenter, batch: &ChangeBatch) -> ListBatchItem {
    let row_item = |debt: &debts_core::query::result_set::FetchedDebt| {
        presenter
            .result_set()
            .index_path_of(debt.id())
            .and_then(|path| presenter.row(path))
            .map(to_row_item)
    };
    let event = |kind: &str, path: IndexPath| ListEventItem {
        kind: kind.to_string(),
        section: path.section as u32,
        row: Some(path.row as u32),
        to_section: None,
        to_row: None,
        row_item: None,
    };
    let section_event = |kind: &str, section: usize| ListEventItem {
        kind: kind.to_string(),
        section: section as u32,
        row: None,
        to_section: None,
        to_row: None,
        row_item: None,
    };

    let events = batch
        .body()
        .iter()
        .filter_map(|change| match change {
            ChangeEvent::SectionInsert(section) => Some(section_event("section_insert", *section)),
            ChangeEvent::SectionUpdate(section) => Some(section_event("section_update", *section)),
            ChangeEvent::SectionDelete(section) => Some(section_event("section_delete", *section)),
            ChangeEvent::Insert { debt, new_path } => Some(ListEventItem {
                row_item: row_item(debt),
                ..event("insert", *new_path)
            }),
            ChangeEvent::Update { debt, path } => Some(ListEventItem {
                row_item: row_item(debt),
                ..event("update", *path)
            }),
            ChangeEvent::Move { debt, from, to } => Some(ListEventItem {
                to_section: Some(to.section as u32),
                to_row: Some(to.row as u32),
                row_item: row_item(debt),
                ..event("move", *from)
            }),
            ChangeEvent::Delete { path } => Some(event("delete", *path)),
            ChangeEvent::BeginBatch | ChangeEvent::EndBatch => None,
        })
        .collect();

    ListBatchItem {
        sequence: batch.sequence,
        origin: batch.origin.as_str().to_string(),
        events,
    }
}
