use anyhow::{Context, Result};
use std::env;
use std::fs;
use tracing::Level;

use tally::{EngineConfig, Flavor, Metric, RecordStore};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    init_tracing(args.iter().any(|a| a == "--trace"));

    let config = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args
                .get(i + 1)
                .context("--config needs a path to a JSON file")?;
            load_config(path)?
        }
        None => EngineConfig::default(),
    };

    run_grade_book(config)?;
    run_cart()?;

    Ok(())
}

fn init_tracing(enabled: bool) {
    if !enabled {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .try_init();
}

fn load_config(path: &str) -> Result<EngineConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    EngineConfig::from_json_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))
}

fn run_grade_book(config: EngineConfig) -> Result<()> {
    println!("🎓 Grade book");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let store = RecordStore::with_config(EngineConfig {
        flavor: Flavor::Ledger,
        ..config
    })?;
    store.create_with_metadata("Alice", vec![85.0, 90.0, 88.0], serde_json::json!({"age": 20}))?;
    store.create_with_metadata("Bob", vec![92.0, 87.0, 91.0], serde_json::json!({"age": 19}))?;
    store.create_with_metadata("Charlie", vec![78.0, 82.0, 80.0], serde_json::json!({"age": 21}))?;

    let alice = store.find_by_key("ALICE")?;
    println!("✓ Lookup \"ALICE\" → {} (id {})", alice.key, alice.id);

    println!("\n🏆 Top {} by average:", store.config().default_top_n);
    for (rank, entry) in store.top_n_default(Metric::Average)?.iter().enumerate() {
        println!("  {}. {}: {:.2}", rank + 1, entry.key, entry.metric);
    }

    for entity in store.all() {
        let summary = tally::summarize(&entity.contributions());
        println!("  {} → {}", entity.key, summary.summary());
    }

    Ok(())
}

fn run_cart() -> Result<()> {
    println!("\n🛒 Shopping cart");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let cart = RecordStore::new(Flavor::LineItems);
    cart.add_line("laptop", 999.99, 1)?;
    cart.add_line("laptop", 999.99, 1)?;
    cart.add_line("mouse", 29.99, 2)?;

    for line in cart.lines()? {
        println!(
            "  {} × {} @ ${:.2} = ${:.2}",
            line.quantity,
            line.product_key,
            line.unit_price,
            line.total()
        );
    }
    println!("✓ Total: ${:.2}", cart.grand_total()?);

    cart.remove_line("mouse")?;
    println!("✓ Total without mouse: ${:.2}", cart.grand_total()?);

    Ok(())
}
