use std::time::Duration;

use npiregistry_rs::{NpiClient, NpiError, Provider, SearchBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "tracing-subscriber")]
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = NpiClient::builder()
        .cache_ttl(Duration::from_secs(5 * 60))
        .cache_sweep_interval(Duration::from_secs(60))
        .build()?;

    println!("--- Lookup by NPI ---");
    match client.get_provider("1043218118").await {
        Ok(p) => print_provider(&p),
        Err(NpiError::NotFound { npi }) => println!("no provider with NPI {npi}"),
        Err(e) => return Err(e.into()),
    }
    println!();

    println!("--- Search by name and state ---");
    let providers = SearchBuilder::new(&client)
        .first_name("John")
        .last_name("Smith")
        .state("CA")
        .limit(5)
        .fetch()
        .await?;
    println!("Found {} providers", providers.len());
    for (i, p) in providers.iter().enumerate() {
        print!("[{}] {} (NPI: {})", i + 1, p.display_name(), p.number);
        if let Some(addr) = p.addresses.first() {
            print!(" - {}, {} {}", addr.city, addr.state, addr.postal_code);
        }
        println!();
    }
    println!();

    println!("--- Batch lookup ---");
    let (found, err) = client
        .get_providers(["1043218118", "1003000126", "0000000000"])
        .await?
        .into_parts();
    for (npi, p) in &found {
        println!("{npi}: {}", p.display_name());
    }
    if let Some(e) = err {
        println!("partial failure: {e}");
    }

    client.stop_cache_sweeper().await;
    Ok(())
}

fn print_provider(p: &Provider) {
    println!("NPI Number:       {}", p.number);
    println!("Type:             {}", p.enumeration_type);
    println!("Name:             {}", p.display_name());
    if !p.basic.credential.is_empty() {
        println!("Credential:       {}", p.basic.credential);
    }
    println!("Status:           {}", p.basic.status);
    println!("Enumeration Date: {}", p.basic.enumeration_date);
    if let Some(ts) = p.last_updated_at() {
        println!("Last Updated:     {}", ts.date_naive());
    }
    if let Some(addr) = p.location_address() {
        println!("Practice:         {}, {}, {} {}", addr.address_1, addr.city, addr.state, addr.postal_code);
    }
    if let Some(t) = p.primary_taxonomy() {
        println!("Specialty:        {} ({})", t.desc, t.code);
    }
}
