use resilient_fetch::{
    nations::{self, NationListParams},
    users, ApiClient,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("resilient_fetch=debug")),
        )
        .init();

    // API_URL=https://jsonplaceholder.typicode.com cargo run --example users
    let api = ApiClient::from_env()?;

    for user in users::get_users(&api).await? {
        println!("{:>3} {:<24} {}", user.id, user.name, user.email);
    }

    if std::env::var("DEMO_NATIONS").is_ok() {
        let params = NationListParams {
            keyword: std::env::var("DEMO_NATION_KEYWORD").ok(),
        };
        for nation in nations::get_nation_list(&api, &params).await? {
            println!("{} {}", nation.alp3_natn_code, nation.natn_nm);
        }
    }

    Ok(())
}
