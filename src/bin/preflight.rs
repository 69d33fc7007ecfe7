use hotel_admin::infra::backend;
use hotel_admin::infra::config::Backend;
use hotel_admin::AppConfig;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--ensure-schema]\n\
         \n\
         Reads env vars (or .env):\n\
           BACKEND=postgres|rest|memory (default postgres)\n\
           DATABASE_URL (postgres), STORE_BASE_URL + STORE_API_KEY (rest)\n\
           PAGE_SIZE, PAGINATION_MODE=legacy|standard, BIND_ADDR\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let ensure_schema = args.iter().any(|a| a == "--ensure-schema");

    let config = AppConfig::from_env()?;

    println!("> Preflight:");
    println!("  BACKEND={:?}", config.backend);
    println!("  STORE_BASE_URL={}", config.store_base_url);
    println!("  PAGE_SIZE={}", config.page_size);
    println!("  PAGINATION_MODE={:?}", config.pagination);
    println!("  BIND_ADDR={}", config.bind_addr);

    if ensure_schema && config.backend != Backend::Postgres {
        eprintln!("  Warning: --ensure-schema only applies to the postgres backend.");
    }

    let stores = backend::open(&config, ensure_schema).await?;
    stores
        .tables
        .ping()
        .await
        .map_err(|e| anyhow::anyhow!("Store is not reachable: {}", e))?;
    println!("  Store is reachable.");
    if ensure_schema && config.backend == Backend::Postgres {
        println!("  Schema ensured (cabins, guests, bookings, settings, storage_objects).");
    }

    println!("> Preflight OK.");
    Ok(())
}
