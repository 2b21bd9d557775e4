use std::env;

use statsql::filters::DEFAULT_SESSION_KEY;
use statsql::{resolve_dialect, Filters, ParamList, TimeUnit};
use tracing_subscriber::EnvFilter;

fn usage() {
    eprintln!("Usage: print_sql <database_url> <filters_json> [unit] [timezone]");
    eprintln!(
        "Example: cargo run --example print_sql -- mysql://localhost/analytics '{{\"url\":\"/\",\"os\":\"Linux\"}}' day Europe/Paris"
    );
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1).collect::<Vec<_>>();
    if args.len() < 2 {
        usage();
        std::process::exit(1);
    }

    let url = args.remove(0);
    let raw: serde_json::Value = serde_json::from_str(&args.remove(0))?;
    let unit: TimeUnit = match args.first() {
        Some(name) => name.parse()?,
        None => TimeUnit::Day,
    };
    let timezone = args.get(1).map(String::as_str);

    let dialect = resolve_dialect(&url)?;
    let filters = match raw.as_object() {
        Some(map) => Filters::from_json(map),
        None => anyhow::bail!("filters must be a JSON object"),
    };

    let mut params = ParamList::new();
    let website = params.push("00000000-0000-0000-0000-000000000000");
    let parts = filters.partition(&mut params, "pageview", DEFAULT_SESSION_KEY);
    let sql = format!(
        "select {bucket} t, count(*) y\nfrom pageview\n{join}\nwhere website_id = {website}{uuid}\n{clause}\ngroup by 1",
        bucket = dialect.date_trunc("created_at", unit, timezone)?,
        join = parts.join_session,
        uuid = dialect.uuid_cast(),
        clause = parts.filter_clause,
    );

    println!("{}", dialect.rewrite_placeholders(&sql));
    println!("-- params: {}", serde_json::to_string(params.as_slice())?);
    Ok(())
}
