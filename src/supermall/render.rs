use chrono::{DateTime, Utc};
use colored::*;
use console::{measure_text_width, strip_ansi_codes};
use serde_json::Value;
use supermall::applog::{LogEntry, LogLevel};
use supermall::catalog::{self, ComparedProduct, FloorInsight, UNKNOWN_SHOP};
use supermall::model::{iso_millis, Category, Offer, Product, Shop, Stored};
use supermall::seed::SeedReport;
use supermall::store::StoreStats;
use unicode_width::UnicodeWidthChar;

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;
const ID_WIDTH: usize = 22;

/// One line per record: id, a label, and how long ago it changed.
pub fn print_records(records: &[Value]) {
    if records.is_empty() {
        println!("No records found.");
        return;
    }
    for record in records {
        let id = record["id"].as_str().unwrap_or("?");
        let updated = record["updatedAt"]
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| format_time_ago(t.with_timezone(&Utc)))
            .unwrap_or_else(|| " ".repeat(TIME_WIDTH));
        print_row(id, &record_label(record), &updated);
    }
    println!("{}", format!("{} record(s)", records.len()).dimmed());
}

pub fn print_record(record: &Value) {
    match serde_json::to_string_pretty(record) {
        Ok(pretty) => println!("{}", pretty),
        Err(_) => println!("{}", record),
    }
}

pub fn print_stats(stats: &StoreStats) {
    println!("{:<12}{}", "Shops", stats.total_shops.to_string().bold());
    println!("{:<12}{}", "Products", stats.total_products.to_string().bold());
    println!(
        "{:<12}{} {}",
        "Offers",
        stats.total_offers.to_string().bold(),
        "(active)".dimmed()
    );
    println!("{:<12}{}", "Categories", stats.total_categories.to_string().bold());
    println!();
    for (floor, count) in &stats.shops_by_floor {
        println!("  {:<14}{}", floor.name(), count);
    }
}

pub fn print_seed_report(report: &SeedReport) {
    if report.seeded {
        println!(
            "{}",
            format!(
                "Seeded {} shops, {} products, {} offers, {} categories.",
                report.shops, report.products, report.offers, report.categories
            )
            .green()
        );
    } else {
        println!("{}", "Store ready. Demo data already present.".dimmed());
    }
}

pub fn print_products(
    products: &[Stored<Product>],
    shops: &[Stored<Shop>],
    categories: &[Stored<Category>],
) {
    if products.is_empty() {
        println!("No products found.");
        return;
    }
    for product in products {
        let shop = shop_or_unknown(shops, &product.data.shop_id);
        let label = format!(
            "{} {} {}",
            product.data.name,
            format!("@ {}", shop).dimmed(),
            format!("[{}]", catalog::category_name(categories, &product.data.category)).dimmed()
        );
        let price = format!("{:>width$.2}", product.data.price, width = TIME_WIDTH);
        print_row(product.id(), &label, &price.green().to_string());
    }
}

pub fn print_offers(offers: &[Stored<Offer>], shops: &[Stored<Shop>], now: DateTime<Utc>) {
    if offers.is_empty() {
        println!("No offers found.");
        return;
    }
    for offer in offers {
        let shop = shop_or_unknown(shops, &offer.data.shop_id);
        let label = format!("{} {}", offer.data.title, format!("@ {}", shop).dimmed());
        let discount = format!("{}% off", offer.data.discount);
        let discount = format!("{:>width$}", discount, width = TIME_WIDTH);
        let discount = if offer.data.is_active && offer.data.is_running_at(now) {
            discount.yellow()
        } else {
            discount.dimmed()
        };
        print_row(offer.id(), &label, &discount.to_string());
    }
}

pub fn print_shops(shops: &[Stored<Shop>], categories: &[Stored<Category>]) {
    if shops.is_empty() {
        println!("No shops found.");
        return;
    }
    for shop in shops {
        let name = if shop.data.is_active {
            shop.data.name.normal()
        } else {
            shop.data.name.dimmed()
        };
        let label = format!(
            "{} {}",
            name,
            format!("[{}]", catalog::category_name(categories, &shop.data.category)).dimmed()
        );
        let floor = format!("{:>width$}", shop.data.floor.name(), width = TIME_WIDTH);
        print_row(shop.id(), &label, &floor);
    }
}

/// One block per product, in the order they were asked for.
pub fn print_comparison(products: &[ComparedProduct]) {
    if products.is_empty() {
        println!("No products found.");
        return;
    }
    for (i, product) in products.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{} {}", product.name.bold(), product.id.dimmed());
        println!("  {:<10}{}", "Price", format!("{:.2}", product.price).green());
        println!("  {:<10}{}", "Shop", product.shop_name);
        println!("  {:<10}{}", "Features", product.features);
        if !product.description.is_empty() {
            println!("  {:<10}{}", "About", product.description.dimmed());
        }
    }
}

pub fn print_floor_insights(insights: &[FloorInsight]) {
    if insights.is_empty() {
        println!("No shops or offers yet.");
        return;
    }
    for insight in insights {
        println!("{}", insight.floor.name().bold());
        println!(
            "  {:<14}{} {}",
            "Shops",
            insight.total_shops,
            format!("({} active)", insight.active_shops).dimmed()
        );
        println!(
            "  {:<14}{} {}",
            "Offers",
            insight.total_offers,
            format!("({} active)", insight.active_offers).dimmed()
        );
        match &insight.top_category {
            Some(top) => println!("  {:<14}{} ({})", "Top category", top.name, top.count),
            None => println!("  {:<14}{}", "Top category", "-".dimmed()),
        }
    }
}

pub fn print_logs(entries: &[LogEntry]) {
    if entries.is_empty() {
        println!("No log entries.");
        return;
    }
    for entry in entries {
        let level = format!("{:<8}", entry.level.to_string());
        let level = match entry.level {
            LogLevel::Info => level.normal(),
            LogLevel::Warning => level.yellow(),
            LogLevel::Error => level.red(),
            LogLevel::Debug => level.dimmed(),
        };
        let context = if entry.context.is_null() {
            String::new()
        } else {
            format!(" {}", entry.context)
        };
        println!(
            "{} {}{}{}",
            iso_millis::format(&entry.timestamp).dimmed(),
            level,
            entry.message,
            context.dimmed()
        );
    }
}

pub fn print_success(message: &str) {
    println!("{}", message.green());
}

pub fn print_info(message: &str) {
    println!("{}", message.dimmed());
}

fn print_row(id: &str, label: &str, right: &str) {
    let id_col = format!("{:<width$}", id, width = ID_WIDTH);
    let available = LINE_WIDTH.saturating_sub(ID_WIDTH + TIME_WIDTH + 2);
    let label = truncate_to_width(label, available);
    // Colored labels carry escape codes; pad by visible width.
    let visible = measure_text_width(&label);
    let padding = available.saturating_sub(visible);
    println!(
        "{} {}{} {}",
        id_col.yellow(),
        label,
        " ".repeat(padding),
        right
    );
}

fn shop_or_unknown<'a>(shops: &'a [Stored<Shop>], id: &str) -> &'a str {
    match catalog::shop_name(shops, id) {
        catalog::UNKNOWN => UNKNOWN_SHOP,
        name => name,
    }
}

fn record_label(record: &Value) -> String {
    ["name", "title", "email"]
        .iter()
        .find_map(|field| record[*field].as_str())
        .unwrap_or("")
        .to_string()
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if measure_text_width(s) <= max_width {
        return s.to_string();
    }
    let plain = strip_ansi_codes(s);
    let mut result = String::new();
    let mut current_width = 0;
    for c in plain.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }
    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);

    let formatter = timeago::Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());

    format!("{:>width$}", time_str, width = TIME_WIDTH)
}
