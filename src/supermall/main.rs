use chrono::Utc;
use clap::Parser;
use colored::*;
use directories::ProjectDirs;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use supermall::api::{MallApi, Response};
use supermall::applog::LogLevel;
use supermall::catalog::{self, OfferFilter, ProductFilter, ShopFilter};
use supermall::config::{LogFormat, MallConfig};
use supermall::error::{Result, StoreError};
use supermall::model::{Category, Shop};
use supermall::store::fs_backend::FsBackend;
use supermall::store::{Filter, RecordStore};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod args;
mod render;
use args::{Cli, Commands};

const HOME_ENV: &str = "SUPERMALL_HOME";

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            std::process::exit(1);
        }
    }
}

struct AppContext {
    api: MallApi<FsBackend>,
    json: bool,
    seed_demo_data: bool,
}

/// Returns whether the command succeeded; a failed response is already reported.
fn run() -> Result<bool> {
    let cli = Cli::parse();
    let home = resolve_home()?;
    let loaded = MallConfig::load(&home);
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_tracing(&config);

    if let Commands::Config { key, value } = cli.command {
        // Never overwrite a config file we could not read.
        return handle_config(&home, loaded?, key, value);
    }
    if let Err(e) = &loaded {
        warn!(error = %e, "Unreadable config.json, using defaults");
    }

    let mut ctx = init_context(&home, &config, cli.json)?;

    match cli.command {
        Commands::Init => handle_init(&mut ctx),
        Commands::List { collection } => handle_list(&ctx, &collection),
        Commands::Get { collection, id } => handle_get(&ctx, &collection, &id),
        Commands::Create { collection, data } => handle_create(&mut ctx, &collection, &data),
        Commands::Update {
            collection,
            id,
            patch,
        } => handle_update(&mut ctx, &collection, &id, &patch),
        Commands::Delete { collection, id } => handle_delete(&mut ctx, &collection, &id),
        Commands::Query {
            collection,
            conditions,
        } => handle_query(&ctx, &collection, &conditions),
        Commands::Stats => handle_stats(&ctx),
        Commands::Products {
            search,
            category,
            shop,
            sort,
            limit,
        } => {
            let options = ProductFilter {
                search,
                category,
                shop,
                sort: sort.map(|s| s.parse()).transpose()?,
            };
            handle_products(&ctx, &options, limit)
        }
        Commands::Offers {
            search,
            shop,
            sort,
            all,
            limit,
        } => {
            let options = OfferFilter {
                search,
                shop,
                sort: sort.map(|s| s.parse()).transpose()?,
                current_only: !all,
            };
            handle_offers(&ctx, &options, limit)
        }
        Commands::Shops {
            search,
            category,
            floor,
            sort,
            storefront,
            limit,
        } => {
            let options = ShopFilter {
                search,
                category,
                floor: floor.map(|f| f.parse()).transpose()?,
                sort: sort.map(|s| s.parse()).transpose()?,
                storefront,
            };
            handle_shops(&ctx, &options, limit)
        }
        Commands::Compare { ids } => handle_compare(&ctx, &ids),
        Commands::Floors => handle_floors(&ctx),
        Commands::Logs {
            level,
            export,
            clear,
        } => handle_logs(&ctx, level, export, clear),
        Commands::Config { .. } => Ok(true),
    }
}

fn resolve_home() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    let proj_dirs = ProjectDirs::from("com", "supermall", "supermall")
        .ok_or_else(|| StoreError::Store("Could not determine data directory".into()))?;
    Ok(proj_dirs.data_dir().to_path_buf())
}

fn init_tracing(config: &MallConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // Another subscriber may already be installed; keep it.
    let _ = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.with_target(false).try_init(),
    };
}

fn init_context(home: &std::path::Path, config: &MallConfig, json: bool) -> Result<AppContext> {
    let data_dir = MallConfig::data_dir(home);
    std::fs::create_dir_all(&data_dir)?;

    let backend = FsBackend::new(data_dir);
    let store = if config.seed_demo_data {
        RecordStore::open(backend)?
    } else {
        RecordStore::open_unseeded(backend)?
    };
    let api = MallApi::new(store).with_app_log_capacity(config.app_log_capacity);

    Ok(AppContext {
        api,
        json,
        seed_demo_data: config.seed_demo_data,
    })
}

/// Print a response: raw JSON with `--json`, otherwise `render` for data and a red
/// message for failures.
fn emit<T: Serialize>(
    ctx: &AppContext,
    response: &Response<T>,
    render: impl FnOnce(Option<&T>),
) -> Result<bool> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(response)?);
    } else if let Some(error) = &response.error {
        eprintln!("{} {}", "Error:".red(), error);
    } else {
        render(response.data.as_ref());
    }
    Ok(response.success)
}

fn handle_init(ctx: &mut AppContext) -> Result<bool> {
    // Opening the context already created missing collections.
    if !ctx.seed_demo_data {
        let response = Response::<Value>::empty();
        return emit(ctx, &response, |_| {
            render::print_info("Collections ready. Demo data seeding is disabled.")
        });
    }
    let response = ctx.api.seed();
    emit(ctx, &response, |report| {
        if let Some(report) = report {
            render::print_seed_report(report);
        }
    })
}

fn handle_list(ctx: &AppContext, collection: &str) -> Result<bool> {
    let response = ctx.api.read(collection, None);
    emit(ctx, &response, print_value_list)
}

fn handle_get(ctx: &AppContext, collection: &str, id: &str) -> Result<bool> {
    let response = ctx.api.read(collection, Some(id));
    emit(ctx, &response, |data| match data {
        Some(record) => render::print_record(record),
        None => render::print_info(&format!("No record {} in {}", id, collection)),
    })
}

fn handle_create(ctx: &mut AppContext, collection: &str, data: &str) -> Result<bool> {
    let payload = parse_json_arg(data)?;
    let response = ctx.api.create(collection, payload);
    emit(ctx, &response, |record| {
        if let Some(record) = record {
            let id = record["id"].as_str().unwrap_or_default();
            render::print_success(&format!("Created {}", id));
            render::print_record(record);
        }
    })
}

fn handle_update(ctx: &mut AppContext, collection: &str, id: &str, patch: &str) -> Result<bool> {
    let patch = parse_json_arg(patch)?;
    let response = ctx.api.update(collection, id, patch);
    emit(ctx, &response, |record| {
        if let Some(record) = record {
            render::print_success(&format!("Updated {}", id));
            render::print_record(record);
        }
    })
}

fn handle_delete(ctx: &mut AppContext, collection: &str, id: &str) -> Result<bool> {
    let response = ctx.api.delete(collection, id);
    emit(ctx, &response, |_| render::print_success(&format!("Deleted {}", id)))
}

fn handle_query(ctx: &AppContext, collection: &str, conditions: &[String]) -> Result<bool> {
    let filter = parse_conditions(conditions)?;
    let response = ctx.api.query(collection, &filter);
    emit(ctx, &response, print_value_list)
}

fn handle_stats(ctx: &AppContext) -> Result<bool> {
    let response = ctx.api.stats();
    emit(ctx, &response, |stats| {
        if let Some(stats) = stats {
            render::print_stats(stats);
        }
    })
}

fn handle_products(ctx: &AppContext, options: &ProductFilter, limit: usize) -> Result<bool> {
    let store = ctx.api.store();
    let response: Response<_> = catalog::list_products(store, options)
        .map(|mut products| {
            products.truncate(limit);
            products
        })
        .into();
    let shops = store.read_all::<Shop>()?;
    let categories = store.read_all::<Category>()?;
    emit(ctx, &response, |products| {
        if let Some(products) = products {
            render::print_products(products, &shops, &categories);
        }
    })
}

fn handle_offers(ctx: &AppContext, options: &OfferFilter, limit: usize) -> Result<bool> {
    let store = ctx.api.store();
    let now = Utc::now();
    let response: Response<_> = catalog::list_offers(store, options, now)
        .map(|mut offers| {
            offers.truncate(limit);
            offers
        })
        .into();
    let shops = store.read_all::<Shop>()?;
    emit(ctx, &response, |offers| {
        if let Some(offers) = offers {
            render::print_offers(offers, &shops, now);
        }
    })
}

fn handle_shops(ctx: &AppContext, options: &ShopFilter, limit: usize) -> Result<bool> {
    let store = ctx.api.store();
    let response: Response<_> = catalog::list_shops(store, options)
        .map(|mut shops| {
            shops.truncate(limit);
            shops
        })
        .into();
    let categories = store.read_all::<Category>()?;
    emit(ctx, &response, |shops| {
        if let Some(shops) = shops {
            render::print_shops(shops, &categories);
        }
    })
}

fn handle_compare(ctx: &AppContext, ids: &[String]) -> Result<bool> {
    let response: Response<_> = catalog::compare_products(ctx.api.store(), ids).into();
    emit(ctx, &response, |products| {
        if let Some(products) = products {
            render::print_comparison(products);
        }
    })
}

fn handle_floors(ctx: &AppContext) -> Result<bool> {
    let response: Response<_> = catalog::floor_insights(ctx.api.store()).into();
    emit(ctx, &response, |insights| {
        if let Some(insights) = insights {
            render::print_floor_insights(insights);
        }
    })
}

fn handle_logs(
    ctx: &AppContext,
    level: Option<String>,
    export: bool,
    clear: bool,
) -> Result<bool> {
    let log = ctx.api.app_log();

    if clear {
        log.clear()?;
        render::print_success("Application log cleared.");
        return Ok(true);
    }
    if export {
        println!("{}", log.export_json()?);
        return Ok(true);
    }

    let entries = match level {
        Some(level) => log.by_level(level.parse::<LogLevel>()?)?,
        None => log.entries()?,
    };
    let response = Response::ok(entries);
    emit(ctx, &response, |entries| {
        if let Some(entries) = entries {
            render::print_logs(entries);
        }
    })
}

fn handle_config(
    home: &std::path::Path,
    mut config: MallConfig,
    key: Option<String>,
    value: Option<String>,
) -> Result<bool> {
    match (key, value) {
        (None, _) => {
            for key in MallConfig::keys() {
                println!("{} = {}", key, config.get(key)?);
            }
        }
        (Some(key), None) => println!("{} = {}", key, config.get(&key)?),
        (Some(key), Some(value)) => {
            config.set(&key, &value)?;
            config.save(home)?;
            render::print_success(&format!("{} = {}", key, config.get(&key)?));
        }
    }
    Ok(true)
}

fn print_value_list(data: Option<&Value>) {
    match data.and_then(Value::as_array) {
        Some(records) => render::print_records(records),
        None => render::print_records(&[]),
    }
}

fn parse_json_arg(raw: &str) -> Result<Value> {
    serde_json::from_str(raw)
        .map_err(|e| StoreError::InvalidPayload(format!("not valid JSON: {}", e)))
}

/// `field=value` pairs; the value is JSON when it parses as JSON, text otherwise.
fn parse_conditions(conditions: &[String]) -> Result<Filter> {
    let mut filter = Filter::new();
    for condition in conditions {
        let (field, raw) = condition.split_once('=').ok_or_else(|| {
            StoreError::InvalidPayload(format!(
                "condition '{}' is not of the form field=value",
                condition
            ))
        })?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        filter = filter.eq(field, value);
    }
    Ok(filter)
}
